use super::{empty_string_as_none, ImportError};
use crate::awards::{Callsign, CallsignDirectory, OperatorId};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct DirectoryRow {
    #[serde(rename = "userId")]
    user_id: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    callsign: Option<String>,
}

/// Operator profiles exported from the registry (`userId,callsign`).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCallsignDirectory {
    entries: HashMap<OperatorId, Callsign>,
}

impl InMemoryCallsignDirectory {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Later rows for the same operator replace earlier ones; blank
    /// callsigns are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut directory = Self::default();
        for record in csv_reader.deserialize::<DirectoryRow>() {
            let row = record?;
            if let Some(call) = row.callsign.as_deref().and_then(Callsign::parse) {
                directory.insert(OperatorId(row.user_id), call);
            }
        }

        info!(operators = directory.len(), "callsign directory loaded");
        Ok(directory)
    }

    pub fn insert(&mut self, operator: OperatorId, callsign: Callsign) {
        self.entries.insert(operator, callsign);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CallsignDirectory for InMemoryCallsignDirectory {
    fn lookup(&self, operator: OperatorId) -> Option<Callsign> {
        self.entries.get(&operator).cloned()
    }
}
