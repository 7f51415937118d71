//! Expense aggregation for charts and statistics
//!
//! Both entry points are pure functions of the snapshot they are given:
//! - `bucket_by_day` groups records into per-calendar-day totals
//! - `compute_summary` derives min/max/average figures
//!
//! Calendar dates are always taken from the UTC date of `occurred_on`, so a
//! record never moves across a day boundary depending on who reads it.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::ExpenseRecord;

/// Per-day aggregation of expense totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub total: f64,
    /// Distinct categories seen that day, in order of first appearance
    pub categories: Vec<String>,
}

/// Summary statistics over a window of expenses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub average_per_active_day: f64,
    pub max_amount: f64,
    pub min_amount: f64,
    /// Number of distinct days with at least one record (0 when empty)
    pub active_days: usize,
    pub total: f64,
}

/// Group records by calendar date, ascending by date.
pub fn bucket_by_day(records: &[ExpenseRecord]) -> Vec<DailyBucket> {
    let mut by_date: BTreeMap<NaiveDate, DailyBucket> = BTreeMap::new();

    for record in records {
        let date = record.calendar_date();
        let bucket = by_date.entry(date).or_insert_with(|| DailyBucket {
            date,
            total: 0.0,
            categories: Vec::new(),
        });
        bucket.total += record.amount;
        if !bucket.categories.contains(&record.category) {
            bucket.categories.push(record.category.clone());
        }
    }

    by_date.into_values().collect()
}

/// Compute min/max/average statistics.
///
/// An empty snapshot yields all zeros rather than an error so a new user sees
/// a neutral card. The average divides by the number of active days, with the
/// denominator clamped to 1.
pub fn compute_summary(records: &[ExpenseRecord]) -> StatisticsSummary {
    if records.is_empty() {
        return StatisticsSummary {
            average_per_active_day: 0.0,
            max_amount: 0.0,
            min_amount: 0.0,
            active_days: 0,
            total: 0.0,
        };
    }

    let total: f64 = records.iter().map(|r| r.amount).sum();
    let max_amount = records
        .iter()
        .map(|r| r.amount)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_amount = records.iter().map(|r| r.amount).fold(f64::INFINITY, f64::min);

    let active_days = records
        .iter()
        .map(|r| r.calendar_date())
        .collect::<HashSet<_>>()
        .len();

    StatisticsSummary {
        average_per_active_day: total / active_days.max(1) as f64,
        max_amount,
        min_amount,
        active_days,
        total,
    }
}

/// Spending tier used to color chart bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendingTier {
    /// Above 200
    High,
    /// Above 100
    Medium,
    /// Above 50
    Moderate,
    Low,
}

impl SpendingTier {
    pub fn for_amount(amount: f64) -> Self {
        if amount > 200.0 {
            Self::High
        } else if amount > 100.0 {
            Self::Medium
        } else if amount > 50.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// A bar in the daily spending chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// `YYYY-MM-DD`
    pub label: String,
    pub amount: f64,
    pub categories: Vec<String>,
    pub tier: SpendingTier,
}

/// Reshape day buckets into the chart library's input format
pub fn chart_points(buckets: &[DailyBucket]) -> Vec<ChartPoint> {
    buckets
        .iter()
        .map(|b| ChartPoint {
            label: b.date.format("%Y-%m-%d").to_string(),
            amount: b.total,
            categories: b.categories.clone(),
            tier: SpendingTier::for_amount(b.total),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn record(amount: f64, category: &str, occurred_on: &str) -> ExpenseRecord {
        let occurred_on: DateTime<Utc> = occurred_on.parse().unwrap();
        ExpenseRecord {
            id: 0,
            owner_id: 1,
            description: format!("{} expense", category),
            amount,
            category: category.to_string(),
            occurred_on,
            created_at: occurred_on,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bucket_by_day_empty() {
        assert!(bucket_by_day(&[]).is_empty());
    }

    #[test]
    fn test_bucket_by_day_sorted_and_merged() {
        let records = vec![
            record(20.0, "Bills", "2024-05-03T12:00:00Z"),
            record(10.0, "Food", "2024-05-01T08:30:00Z"),
            record(5.5, "Food", "2024-05-01T21:15:00Z"),
            record(7.0, "Shopping", "2024-05-01T12:00:00Z"),
        ];

        let buckets = bucket_by_day(&records);
        assert_eq!(buckets.len(), 2);

        assert_eq!(buckets[0].date, date(2024, 5, 1));
        assert_eq!(buckets[0].total, 22.5);
        assert_eq!(buckets[0].categories, vec!["Food", "Shopping"]);

        assert_eq!(buckets[1].date, date(2024, 5, 3));
        assert_eq!(buckets[1].total, 20.0);
        assert_eq!(buckets[1].categories, vec!["Bills"]);
    }

    #[test]
    fn test_bucket_totals_preserve_sum() {
        let records = vec![
            record(12.25, "Food", "2024-01-31T23:00:00Z"),
            record(3.75, "Food", "2024-02-01T00:30:00Z"),
            record(100.0, "Bills", "2023-12-31T12:00:00Z"),
            record(0.0, "Other", "2024-02-01T12:00:00Z"),
        ];
        let buckets = bucket_by_day(&records);

        let input_sum: f64 = records.iter().map(|r| r.amount).sum();
        let bucket_sum: f64 = buckets.iter().map(|b| b.total).sum();
        assert!((input_sum - bucket_sum).abs() < 1e-9);

        let dates: Vec<NaiveDate> = buckets.iter().map(|b| b.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);

        // Every record's date lands in exactly one bucket
        for r in &records {
            let hits = buckets
                .iter()
                .filter(|b| b.date == r.calendar_date())
                .count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn test_bucket_dates_ignore_offsets() {
        // 23:30 at -05:00 is 04:30 UTC the next day
        let records = vec![
            record(10.0, "Food", "2024-06-10T23:30:00-05:00"),
            record(10.0, "Food", "2024-06-11T01:00:00Z"),
        ];
        let buckets = bucket_by_day(&records);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date, date(2024, 6, 11));
    }

    #[test]
    fn test_compute_summary_empty() {
        let summary = compute_summary(&[]);
        assert_eq!(summary.max_amount, 0.0);
        assert_eq!(summary.min_amount, 0.0);
        assert_eq!(summary.average_per_active_day, 0.0);
        assert_eq!(summary.active_days, 0);
    }

    #[test]
    fn test_compute_summary_average_per_active_day() {
        let records = vec![
            record(10.0, "Food", "2024-04-01T09:00:00Z"),
            record(30.0, "Food", "2024-04-01T18:00:00Z"),
            record(20.0, "Bills", "2024-04-02T12:00:00Z"),
        ];
        let summary = compute_summary(&records);
        assert_eq!(summary.max_amount, 30.0);
        assert_eq!(summary.min_amount, 10.0);
        assert_eq!(summary.average_per_active_day, 30.0);
        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.total, 60.0);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = vec![
            record(4.0, "Food", "2024-04-01T09:00:00Z"),
            record(9.0, "Shopping", "2024-04-03T09:00:00Z"),
        ];
        assert_eq!(bucket_by_day(&records), bucket_by_day(&records));
        assert_eq!(compute_summary(&records), compute_summary(&records));
    }

    #[test]
    fn test_chart_points_tiers() {
        let records = vec![
            record(250.0, "Bills", "2024-04-01T12:00:00Z"),
            record(150.0, "Shopping", "2024-04-02T12:00:00Z"),
            record(75.0, "Food", "2024-04-03T12:00:00Z"),
            record(50.0, "Food", "2024-04-04T12:00:00Z"),
        ];
        let points = chart_points(&bucket_by_day(&records));
        let tiers: Vec<SpendingTier> = points.iter().map(|p| p.tier).collect();
        assert_eq!(
            tiers,
            vec![
                SpendingTier::High,
                SpendingTier::Medium,
                SpendingTier::Moderate,
                SpendingTier::Low
            ]
        );
        assert_eq!(points[0].label, "2024-04-01");
    }
}
