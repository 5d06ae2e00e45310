use super::{empty_string_as_none, parse_timestamp, ImportError};
use crate::awards::{ActivationRecord, Callsign, OperatorId, SummitCatalog, SummitCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// An activation row dropped at the input boundary, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub location: String,
    pub reason: String,
}

/// Activation records ready for the engine, plus everything that was
/// dropped while collecting them.
#[derive(Debug, Clone, Default)]
pub struct ActivationBatch {
    pub records: Vec<ActivationRecord>,
    pub rejected: Vec<RejectedRecord>,
    pub skipped_summits: Vec<SummitCode>,
}

impl ActivationBatch {
    fn reject(&mut self, location: String, reason: String) {
        warn!(%location, %reason, "activation record rejected");
        self.rejected.push(RejectedRecord { location, reason });
    }

    fn extend(&mut self, other: ActivationBatch) {
        self.records.extend(other.records);
        self.rejected.extend(other.rejected);
        self.skipped_summits.extend(other.skipped_summits);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no activation data available for summit {0}")]
    Missing(SummitCode),
    #[error("activation registry answered {status} for summit {summit}")]
    Status { summit: SummitCode, status: u16 },
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Supplies the activations logged on one summit, e.g. a registry client or
/// a snapshot of its responses.
pub trait ActivationSource {
    fn activations_for(&self, summit: &SummitCode) -> Result<ActivationBatch, SourceError>;
}

/// Walks the catalog summit by summit. A summit whose lookup fails is logged
/// and listed in `skipped_summits`; the run carries on without it.
pub fn collect_activations<S>(catalog: &SummitCatalog, source: &S) -> ActivationBatch
where
    S: ActivationSource + ?Sized,
{
    let mut batch = ActivationBatch::default();
    for summit in catalog.summits() {
        match source.activations_for(&summit.code) {
            Ok(found) => batch.extend(found),
            Err(error) => {
                warn!(summit = %summit.code, %error, "skipping summit");
                batch.skipped_summits.push(summit.code.clone());
            }
        }
    }

    info!(
        records = batch.records.len(),
        rejected = batch.rejected.len(),
        skipped_summits = batch.skipped_summits.len(),
        "activations collected"
    );
    batch
}

/// One entry of the registry's per-summit activation listing. Unused fields
/// are ignored. Id and date are checked per entry; a bad value rejects that
/// entry only.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryActivation {
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    own_callsign: Option<String>,
    #[serde(default)]
    activation_date: Option<Value>,
}

impl RegistryActivation {
    fn operator(&self) -> Result<OperatorId, String> {
        match &self.user_id {
            Some(Value::Number(id)) => id
                .as_u64()
                .map(OperatorId)
                .ok_or_else(|| format!("invalid operator id '{id}'")),
            Some(Value::String(id)) => id
                .trim()
                .parse::<u64>()
                .map(OperatorId)
                .map_err(|_| format!("invalid operator id '{id}'")),
            Some(Value::Null) | None => Err("missing operator id".to_string()),
            Some(other) => Err(format!("invalid operator id '{other}'")),
        }
    }

    fn activated_at(&self) -> Result<DateTime<Utc>, String> {
        match &self.activation_date {
            Some(Value::String(raw)) => parse_timestamp(raw),
            Some(Value::Null) | None => Err("missing timestamp".to_string()),
            Some(other) => Err(format!("unrecognised timestamp '{other}'")),
        }
    }
}

/// Registry responses saved as `{ "<summit code>": [ ... ] }`.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    listings: BTreeMap<SummitCode, Vec<RegistryActivation>>,
}

impl SnapshotSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ImportError> {
        let raw: BTreeMap<String, Vec<RegistryActivation>> = serde_json::from_reader(reader)?;
        let listings = raw
            .into_iter()
            .map(|(code, entries)| (SummitCode::new(code), entries))
            .collect();
        Ok(Self { listings })
    }

    pub fn summit_count(&self) -> usize {
        self.listings.len()
    }
}

impl ActivationSource for SnapshotSource {
    fn activations_for(&self, summit: &SummitCode) -> Result<ActivationBatch, SourceError> {
        let entries = self
            .listings
            .get(summit)
            .ok_or_else(|| SourceError::Missing(summit.clone()))?;

        let mut batch = ActivationBatch::default();
        for (position, entry) in entries.iter().enumerate() {
            let parsed = entry
                .operator()
                .and_then(|operator| entry.activated_at().map(|at| (operator, at)));
            match parsed {
                Ok((operator_id, activated_at)) => batch.records.push(ActivationRecord {
                    operator_id,
                    callsign: entry.own_callsign.as_deref().and_then(Callsign::parse),
                    summit_code: summit.clone(),
                    activated_at,
                }),
                Err(reason) => batch.reject(format!("{summit}[{position}]"), reason),
            }
        }
        Ok(batch)
    }
}

/// Flat export row: `summitCode,userId,callsign,activationDate`.
#[derive(Debug, Deserialize)]
struct ActivationRow {
    #[serde(rename = "summitCode")]
    summit_code: String,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    callsign: Option<String>,
    #[serde(rename = "activationDate")]
    activation_date: String,
}

pub struct ActivationCsvImporter;

impl ActivationCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ActivationBatch, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows with an unusable operator id or timestamp are rejected one by
    /// one; structural CSV errors abort the import.
    pub fn from_reader<R: Read>(reader: R) -> Result<ActivationBatch, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut batch = ActivationBatch::default();
        for (position, record) in csv_reader.deserialize::<ActivationRow>().enumerate() {
            let row = record?;
            let location = format!("row {}", position + 1);

            let Ok(operator) = row.user_id.parse::<u64>() else {
                batch.reject(location, format!("invalid operator id '{}'", row.user_id));
                continue;
            };

            match parse_timestamp(&row.activation_date) {
                Ok(activated_at) => batch.records.push(ActivationRecord {
                    operator_id: OperatorId(operator),
                    callsign: row.callsign.as_deref().and_then(Callsign::parse),
                    summit_code: SummitCode::new(&row.summit_code),
                    activated_at,
                }),
                Err(reason) => batch.reject(location, reason),
            }
        }

        info!(
            records = batch.records.len(),
            rejected = batch.rejected.len(),
            "activation export loaded"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awards::Summit;

    fn catalog(codes: &[&str]) -> SummitCatalog {
        SummitCatalog::new(
            codes
                .iter()
                .map(|code| Summit {
                    code: SummitCode::new(code),
                    name: code.to_string(),
                    latitude: 57.0,
                    longitude: -3.0,
                    altitude_m: 600,
                    points: 2,
                    region: "ES".to_string(),
                })
                .collect(),
        )
        .expect("valid catalog")
    }

    #[test]
    fn snapshot_rejects_bad_dates_and_skips_missing_summits() {
        let json = r#"{
            "GM/ES-001": [
                {"userId": 11, "ownCallsign": "GM0AAA/P", "activationDate": "2023-01-01T10:00:00Z", "qsos": 12},
                {"userId": 12, "ownCallsign": "", "activationDate": "yesterday"}
            ],
            "GM/ES-002": []
        }"#;
        let source = SnapshotSource::from_reader(json.as_bytes()).expect("snapshot parses");
        assert_eq!(source.summit_count(), 2);

        let batch = collect_activations(&catalog(&["GM/ES-001", "GM/ES-002", "GM/ES-003"]), &source);

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].operator_id, OperatorId(11));
        assert_eq!(
            batch.records[0].callsign.as_ref().map(Callsign::as_str),
            Some("GM0AAA")
        );
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].location, "GM/ES-001[1]");
        assert_eq!(batch.skipped_summits, vec![SummitCode::new("GM/ES-003")]);
    }

    #[test]
    fn snapshot_rejects_null_or_mistyped_fields_per_entry() {
        let json = r#"{
            "GM/ES-001": [
                {"userId": 11, "ownCallsign": "GM0AAA", "activationDate": "2023-01-01T10:00:00Z"},
                {"userId": 12, "ownCallsign": "GM0BBB", "activationDate": null},
                {"userId": "13", "ownCallsign": "GM0CCC", "activationDate": "2023-02-01"},
                {"userId": null, "ownCallsign": "GM0DDD", "activationDate": "2023-03-01"},
                {"ownCallsign": "GM0EEE", "activationDate": 20230401}
            ]
        }"#;
        let source = SnapshotSource::from_reader(json.as_bytes()).expect("snapshot parses");

        let batch = collect_activations(&catalog(&["GM/ES-001"]), &source);

        let operators: Vec<_> = batch.records.iter().map(|r| r.operator_id).collect();
        assert_eq!(operators, vec![OperatorId(11), OperatorId(13)]);
        let locations: Vec<_> = batch.rejected.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, vec!["GM/ES-001[1]", "GM/ES-001[3]", "GM/ES-001[4]"]);
        assert_eq!(batch.rejected[0].reason, "missing timestamp");
        assert_eq!(batch.rejected[1].reason, "missing operator id");
    }

    #[test]
    fn csv_keeps_good_rows_and_reports_bad_ones() {
        let csv = "summitCode,userId,callsign,activationDate\n\
GM/ES-001,11,GM0AAA,2023-01-01T10:00:00Z\n\
GM/ES-002,abc,GM0BBB,2023-01-02T10:00:00Z\n\
GM/ES-002,12,,2023-13-02\n\
GM/SS-999,13,,2023-01-03\n";

        let batch = ActivationCsvImporter::from_reader(csv.as_bytes()).expect("csv parses");

        assert_eq!(batch.records.len(), 2);
        assert!(batch.records[1].callsign.is_none());
        assert_eq!(batch.records[1].summit_code.as_str(), "GM/SS-999");
        let locations: Vec<_> = batch.rejected.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, vec!["row 2", "row 3"]);
    }
}
