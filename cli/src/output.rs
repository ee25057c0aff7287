// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Human-readable rendering of a batch summary.

use colored::Colorize;
use std::time::Duration;

use atlas_core::domain::batch::{BatchOutcome, BatchSummary};

pub fn print_summary(summary: &BatchSummary) {
    let mode = if summary.dry_run { " (dry run)" } else { "" };
    println!(
        "{}",
        format!("Provider {}{}", summary.provider, mode).bold()
    );
    println!();

    for outcome in &summary.outcomes {
        println!("{}", outcome_line(outcome));
    }
    println!();

    let failed = if summary.failed > 0 {
        summary.failed.to_string().red().bold()
    } else {
        summary.failed.to_string().normal()
    };
    println!(
        "Total: {}  Succeeded: {}  Failed: {}",
        summary.total,
        summary.succeeded.to_string().green(),
        failed
    );
    println!(
        "Elapsed: {}  Average per entity: {}",
        format_duration(summary.elapsed),
        format_duration(summary.average_per_entity())
    );
}

fn outcome_line(outcome: &BatchOutcome) -> String {
    let elapsed = format_duration(outcome.elapsed).dimmed();
    if outcome.success {
        let cities = if outcome.city_count > 0 {
            format!(" ({} cities)", outcome.city_count)
        } else {
            String::new()
        };
        format!(
            "  {} {} {}{} {}",
            "✓".green(),
            outcome.kind,
            outcome.entity,
            cities,
            elapsed
        )
    } else {
        let kind = outcome
            .error_kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "error".to_string());
        format!(
            "  {} {} {} {} {}: {}",
            "✗".red(),
            outcome.kind,
            outcome.entity,
            elapsed,
            kind.yellow(),
            outcome.message.as_deref().unwrap_or("")
        )
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let whole = duration.as_secs();
        format!("{}m{:02}s", whole / 60, whole % 60)
    }
}
