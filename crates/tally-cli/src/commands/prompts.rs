//! `tally prompts` subcommands

use std::path::PathBuf;

use anyhow::{bail, Result};
use tally_core::prompts::{default_prompts_dir, PromptId, PromptLibrary};

fn lookup(name: &str) -> Option<PromptId> {
    PromptId::all().iter().copied().find(|id| id.as_str() == name)
}

fn source_label(is_override: bool) -> &'static str {
    if is_override {
        "override"
    } else {
        "built-in"
    }
}

fn describe_dir(dir: Option<&PathBuf>) -> String {
    match dir {
        Some(path) if path.exists() => path.display().to_string(),
        Some(path) => format!("{} (missing)", path.display()),
        None => "unavailable on this system".to_string(),
    }
}

/// One line per prompt with its version and where it loads from
pub fn cmd_prompts_list() -> Result<()> {
    let mut library = PromptLibrary::new();

    for id in PromptId::all() {
        let prompt = library.get(*id)?;
        println!(
            "{:<22} v{:<3} {:<16} {}",
            id.as_str(),
            prompt.metadata.version,
            prompt.metadata.task_type,
            source_label(prompt.is_override)
        );
    }

    println!();
    println!("Overrides: {}", describe_dir(default_prompts_dir().as_ref()));
    println!("Drop <id>.md there and restart to replace a built-in prompt.");

    Ok(())
}

/// Print a prompt's metadata header followed by its template
pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let Some(id) = lookup(prompt_id) else {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        bail!("Unknown prompt '{}' (known: {})", prompt_id, known.join(", "));
    };

    let mut library = PromptLibrary::new();
    let prompt = library.get(id)?;

    println!(
        "# {} v{} [{}] ({})",
        prompt.metadata.id,
        prompt.metadata.version,
        prompt.metadata.task_type,
        source_label(prompt.is_override)
    );
    if let Some(path) = &prompt.override_path {
        println!("# from {}", path.display());
    }
    println!();
    println!("{}", prompt.content);

    Ok(())
}

/// Print the override directory so it can be used in scripts
pub fn cmd_prompts_path() -> Result<()> {
    let Some(path) = default_prompts_dir() else {
        bail!("No data directory is available for prompt overrides");
    };

    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(not created yet)");
    }

    Ok(())
}
