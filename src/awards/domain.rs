use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog key for a summit, e.g. `GM/ES-001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummitCode(String);

impl SummitCode {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SummitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable registry identifier of an activating operator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OperatorId(pub u64);

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const PORTABLE_SUFFIXES: [&str; 3] = ["/P", "/M", "/QRP"];

/// Operator callsign as logged, normalised to upper case with any portable
/// suffix removed (`GM4ABC/P` and `gm4abc` are the same operator callsign).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Callsign(String);

impl Callsign {
    /// Returns `None` for blank input.
    pub fn parse(value: impl AsRef<str>) -> Option<Self> {
        let mut call = value.as_ref().trim().to_ascii_uppercase();
        for suffix in PORTABLE_SUFFIXES {
            if let Some(stripped) = call.strip_suffix(suffix) {
                call = stripped.to_string();
                break;
            }
        }

        if call.is_empty() {
            None
        } else {
            Some(Self(call))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const UNKNOWN_CALLSIGN: &str = "UNKNOWN";

/// Display callsign attached to an award summary. Serialises as the plain
/// callsign string, or `"UNKNOWN"` when no callsign could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResolvedCallsign {
    Known(Callsign),
    Unknown,
}

impl ResolvedCallsign {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(call) => call.as_str(),
            Self::Unknown => UNKNOWN_CALLSIGN,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<String> for ResolvedCallsign {
    fn from(value: String) -> Self {
        match Callsign::parse(&value) {
            Some(call) if call.as_str() != UNKNOWN_CALLSIGN => Self::Known(call),
            _ => Self::Unknown,
        }
    }
}

impl From<ResolvedCallsign> for String {
    fn from(value: ResolvedCallsign) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ResolvedCallsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One summit of the award catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summit {
    pub code: SummitCode,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: u32,
    pub points: u8,
    pub region: String,
}

/// A single activation event reported by the activation registry. The same
/// operator and summit may appear many times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub operator_id: OperatorId,
    pub callsign: Option<Callsign>,
    pub summit_code: SummitCode,
    pub activated_at: DateTime<Utc>,
}

impl ActivationRecord {
    pub fn new(
        operator_id: OperatorId,
        callsign: &str,
        summit_code: &str,
        activated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            operator_id,
            callsign: Callsign::parse(callsign),
            summit_code: SummitCode::new(summit_code),
            activated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callsign_drops_portable_suffix_and_case() {
        let call = Callsign::parse(" gm4abc/p ").expect("callsign parses");
        assert_eq!(call.as_str(), "GM4ABC");
        assert_eq!(Callsign::parse("MM/DL1ABC").expect("prefix kept").as_str(), "MM/DL1ABC");
        assert!(Callsign::parse("   ").is_none());
    }

    #[test]
    fn resolved_callsign_uses_unknown_sentinel() {
        let json = serde_json::to_string(&ResolvedCallsign::Unknown).expect("serialises");
        assert_eq!(json, "\"UNKNOWN\"");

        let back: ResolvedCallsign = serde_json::from_str("\"mm0xyz\"").expect("deserialises");
        assert_eq!(back.as_str(), "MM0XYZ");
        let unknown: ResolvedCallsign = serde_json::from_str("\"\"").expect("deserialises");
        assert_eq!(unknown, ResolvedCallsign::Unknown);
    }
}
