use crate::awards::{AwardSummary, AwardSummaryDocument, HonourRollEntry};
use crate::sources::ActivationBatch;
use chrono::{DateTime, Utc};
use std::path::Path;

const DATE_FORMAT: &str = "%-d %b %Y";

pub(crate) fn render_compute_outcome(
    document: &AwardSummaryDocument,
    batch: &ActivationBatch,
    output: &Path,
) {
    println!("Award summary written to {}", output.display());
    println!(
        "Catalog: {} summits, {} points",
        document.catalog.total_summits, document.catalog.total_points
    );
    for (region, count) in &document.catalog.regions {
        println!("- {region}: {count} summits");
    }
    println!("Operators: {}", document.summaries.len());
    println!("Activations used: {}", batch.records.len());

    if batch.rejected.is_empty() {
        println!("Rejected records: none");
    } else {
        println!("\nRejected records");
        for rejected in &batch.rejected {
            println!("- {}: {}", rejected.location, rejected.reason);
        }
    }

    if !batch.skipped_summits.is_empty() {
        println!("\nSummits without activation data");
        for code in &batch.skipped_summits {
            println!("- {code}");
        }
    }
}

pub(crate) fn render_honour_roll(entries: &[HonourRollEntry], generated_at: DateTime<Utc>) {
    println!("Honour roll (computed {})", generated_at.format(DATE_FORMAT));

    if entries.is_empty() {
        println!("No operators found");
        return;
    }

    for entry in entries {
        let award = match entry.award_date {
            Some(date) => format!("{} ({})", entry.award_tier, date.format(DATE_FORMAT)),
            None => entry.award_tier.to_string(),
        };
        println!(
            "{:>3}. {} [{}] | {} summits, {} pts | {} -> {} ({} days) | {}",
            entry.rank,
            entry.callsign,
            entry.operator_id,
            entry.summits_activated,
            entry.points,
            entry.first_activation_date.format(DATE_FORMAT),
            entry.last_activation_date.format(DATE_FORMAT),
            entry.activation_span_days,
            award
        );
    }
}

pub(crate) fn render_operator(summary: &AwardSummary) {
    println!("\n{}", summary.narrative());

    if summary.remaining_summits.is_empty() {
        println!("Every summit has been activated.");
        return;
    }

    println!(
        "List of the {} remaining summits:",
        summary.remaining_summits.len()
    );
    for summit in &summary.remaining_summits {
        println!(
            "- {} | {} | {} m | {} pts",
            summit.code, summit.name, summit.altitude_m, summit.points
        );
    }
}
