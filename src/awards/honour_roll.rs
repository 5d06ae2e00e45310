use super::catalog::CatalogOverview;
use super::domain::{ActivationRecord, Callsign, OperatorId, ResolvedCallsign};
use super::engine::{AwardEngine, AwardSummary};
use super::tier::{AwardLevel, AwardTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SummaryStoreError {
    #[error("failed to access award summary file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid award summary document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Award results persisted between the compute run and the display run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardSummaryDocument {
    pub generated_at: DateTime<Utc>,
    pub catalog: CatalogOverview,
    pub tiers: Vec<AwardTier>,
    pub summaries: Vec<AwardSummary>,
}

impl AwardSummaryDocument {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SummaryStoreError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SummaryStoreError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), SummaryStoreError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SummaryStoreError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        info!(path = %path.display(), operators = self.summaries.len(), "award summary saved");
        Ok(())
    }
}

/// Table row for the honour roll; the remaining-summit list is reduced to a
/// count.
#[derive(Debug, Clone, Serialize)]
pub struct HonourRollEntry {
    pub rank: usize,
    pub operator_id: OperatorId,
    pub callsign: ResolvedCallsign,
    pub summits_activated: usize,
    pub points: u32,
    pub first_activation_date: DateTime<Utc>,
    pub last_activation_date: DateTime<Utc>,
    pub activation_span_days: i64,
    pub award_tier: AwardLevel,
    pub award_date: Option<DateTime<Utc>>,
    pub summits_remaining: usize,
}

/// Summaries ranked for display: most summits first, then the shortest
/// span, then callsign.
#[derive(Debug, Clone, Default)]
pub struct HonourRoll {
    summaries: Vec<AwardSummary>,
}

impl HonourRoll {
    pub fn new(mut summaries: Vec<AwardSummary>) -> Self {
        summaries.sort_by_key(|summary| {
            (
                Reverse(summary.summits_activated),
                summary.activation_span_days,
                summary.callsign.clone(),
                summary.operator_id,
            )
        });
        Self { summaries }
    }

    pub fn summaries(&self) -> &[AwardSummary] {
        &self.summaries
    }

    pub fn entries(&self) -> Vec<HonourRollEntry> {
        self.summaries
            .iter()
            .enumerate()
            .map(|(position, summary)| summary.to_entry(position + 1))
            .collect()
    }

    /// Case-insensitive callsign substring match. The term is normalised
    /// like a logged callsign, so `gm4abc/p` finds `GM4ABC`. A blank term
    /// matches all.
    pub fn search(&self, term: &str) -> Vec<&AwardSummary> {
        let needle = search_needle(term);
        self.summaries
            .iter()
            .filter(|summary| summary.callsign.as_str().contains(needle.as_str()))
            .collect()
    }

    /// Like [`HonourRoll::search`] but as table rows that keep their overall
    /// rank.
    pub fn search_entries(&self, term: &str) -> Vec<HonourRollEntry> {
        let needle = search_needle(term);
        self.entries()
            .into_iter()
            .filter(|entry| entry.callsign.as_str().contains(needle.as_str()))
            .collect()
    }

    pub fn operator(&self, operator: OperatorId) -> Option<&AwardSummary> {
        self.summaries
            .iter()
            .find(|summary| summary.operator_id == operator)
    }

    /// Operators ordered by callsign, for pickers.
    pub fn alphabetical(&self) -> Vec<&AwardSummary> {
        let mut ordered: Vec<&AwardSummary> = self.summaries.iter().collect();
        ordered.sort_by(|a, b| {
            a.callsign
                .cmp(&b.callsign)
                .then_with(|| a.operator_id.cmp(&b.operator_id))
        });
        ordered
    }
}

fn search_needle(term: &str) -> String {
    Callsign::parse(term)
        .map(|call| call.as_str().to_string())
        .unwrap_or_default()
}

impl AwardEngine<'_> {
    /// Runs the engine and wraps the result for persistence.
    pub fn document(&self, records: &[ActivationRecord]) -> AwardSummaryDocument {
        AwardSummaryDocument {
            generated_at: Utc::now(),
            catalog: self.catalog().overview(),
            tiers: self.thresholds().tiers().to_vec(),
            summaries: self.aggregate(records),
        }
    }
}

impl AwardSummary {
    pub fn to_entry(&self, rank: usize) -> HonourRollEntry {
        HonourRollEntry {
            rank,
            operator_id: self.operator_id,
            callsign: self.callsign.clone(),
            summits_activated: self.summits_activated,
            points: self.points,
            first_activation_date: self.first_activation_date,
            last_activation_date: self.last_activation_date,
            activation_span_days: self.activation_span_days,
            award_tier: self.award_tier.clone(),
            award_date: self.award_date,
            summits_remaining: self.remaining_summits.len(),
        }
    }

    pub fn narrative(&self) -> String {
        format!(
            "{} has activated {} summits between {} and {}.",
            self.callsign,
            self.summits_activated,
            self.first_activation_date.format("%-d %b %Y"),
            self.last_activation_date.format("%-d %b %Y"),
        )
    }
}
