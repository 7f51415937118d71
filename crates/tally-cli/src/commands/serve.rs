//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::open_db;

/// Read an environment variable, treating empty values as unset
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Build the server configuration from flags and environment
pub fn server_config_from_env(no_auth: bool) -> tally_server::ServerConfig {
    tally_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins: vec![],
        api_keys: tally_server::parse_api_keys(&env_opt("TALLY_API_KEYS").unwrap_or_default()),
        auth_header: env_opt("TALLY_AUTH_HEADER"),
        jwt: tally_server::JwtConfig {
            issuer: env_opt("TALLY_JWT_ISSUER"),
            audience: env_opt("TALLY_JWT_AUDIENCE"),
        },
    }
}

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
    static_dir: Option<&Path>,
) -> Result<()> {
    let config = server_config_from_env(no_auth);

    println!("🚀 Starting Tally web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        match config.jwt.issuer {
            Some(ref issuer) => println!("   🔐 Authentication: JWT (issuer {})", issuer),
            None => println!("   🔒 Authentication: set TALLY_JWT_ISSUER to accept provider tokens"),
        }
        if let Some(ref header) = config.auth_header {
            println!("   🔀 Trusted proxy header: {} (TALLY_AUTH_HEADER)", header);
        }
        if !config.api_keys.is_empty() {
            println!(
                "   🔑 API keys: {} configured (TALLY_API_KEYS)",
                config.api_keys.len()
            );
        }
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("static_dir path must be valid UTF-8"))
        .transpose()?;
    tally_server::serve(db, host, port, static_dir_str, config).await?;

    Ok(())
}
