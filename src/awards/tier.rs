use super::catalog::SummitCatalog;
use super::domain::{ActivationRecord, SummitCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const NO_AWARD: &str = "none";

/// Stepped tiers used when no explicit table is configured. The top tier is
/// always "every summit in the catalog".
const STANDARD_STEPS: [(&str, usize); 4] = [
    ("Hill Walker", 1),
    ("Bronze", 10),
    ("Silver", 25),
    ("Gold", 50),
];
const COMPLETION_TIER: &str = "Summit Master";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("award tier table is empty")]
    Empty,
    #[error("award tier '{0}' has a blank or reserved name")]
    InvalidName(String),
    #[error("award tier '{name}' must require at least one summit")]
    ZeroMinimum { name: String },
    #[error("award tier '{name}' ({min_summits}) must require more summits than the tier before it")]
    NotAscending { name: String, min_summits: usize },
    #[error("could not parse award tier entry '{0}', expected Name:count")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardTier {
    pub name: String,
    pub min_summits: usize,
}

/// Ascending table of award tiers keyed by minimum distinct-summit count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AwardThresholds {
    tiers: Vec<AwardTier>,
}

impl AwardThresholds {
    pub fn new(tiers: Vec<AwardTier>) -> Result<Self, ThresholdError> {
        if tiers.is_empty() {
            return Err(ThresholdError::Empty);
        }

        let mut previous = 0;
        for tier in &tiers {
            let name = tier.name.trim();
            if name.is_empty() || name.eq_ignore_ascii_case(NO_AWARD) {
                return Err(ThresholdError::InvalidName(tier.name.clone()));
            }
            if tier.min_summits == 0 {
                return Err(ThresholdError::ZeroMinimum {
                    name: tier.name.clone(),
                });
            }
            if tier.min_summits <= previous {
                return Err(ThresholdError::NotAscending {
                    name: tier.name.clone(),
                    min_summits: tier.min_summits,
                });
            }
            previous = tier.min_summits;
        }

        Ok(Self { tiers })
    }

    /// Standard ladder for a catalog of `total_summits`. Steps that would
    /// meet or exceed the catalog size are dropped in favour of the
    /// completion tier; an empty catalog has no tiers at all.
    pub fn standard(total_summits: usize) -> Self {
        if total_summits == 0 {
            return Self::default();
        }

        let mut tiers: Vec<AwardTier> = STANDARD_STEPS
            .iter()
            .filter(|(_, min_summits)| *min_summits < total_summits)
            .map(|(name, min_summits)| AwardTier {
                name: (*name).to_string(),
                min_summits: *min_summits,
            })
            .collect();
        tiers.push(AwardTier {
            name: COMPLETION_TIER.to_string(),
            min_summits: total_summits,
        });

        Self { tiers }
    }

    pub fn tiers(&self) -> &[AwardTier] {
        &self.tiers
    }

    pub fn lowest(&self) -> Option<&AwardTier> {
        self.tiers.first()
    }

    /// Highest tier whose minimum is met by `summits_activated`.
    pub fn tier_for(&self, summits_activated: usize) -> Option<&AwardTier> {
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.min_summits <= summits_activated)
    }
}

impl FromStr for AwardThresholds {
    type Err = ThresholdError;

    /// Parses `Name:count` pairs separated by commas, e.g. `Bronze:5,Silver:20`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let tiers = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (name, count) = entry
                    .rsplit_once(':')
                    .ok_or_else(|| ThresholdError::Malformed(entry.to_string()))?;
                let min_summits = count
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ThresholdError::Malformed(entry.to_string()))?;
                Ok(AwardTier {
                    name: name.trim().to_string(),
                    min_summits,
                })
            })
            .collect::<Result<Vec<_>, ThresholdError>>()?;

        Self::new(tiers)
    }
}

/// Achieved award tier, or the explicit `none` level. Serialises as the tier
/// name or the string `"none"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AwardLevel {
    None,
    Tier(String),
}

impl AwardLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => NO_AWARD,
            Self::Tier(name) => name,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<String> for AwardLevel {
    fn from(value: String) -> Self {
        if value.trim().is_empty() || value.trim().eq_ignore_ascii_case(NO_AWARD) {
            Self::None
        } else {
            Self::Tier(value)
        }
    }
}

impl From<AwardLevel> for String {
    fn from(value: AwardLevel) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AwardLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardOutcome {
    pub level: AwardLevel,
    pub achieved_at: Option<DateTime<Utc>>,
}

impl AwardOutcome {
    fn none() -> Self {
        Self {
            level: AwardLevel::None,
            achieved_at: None,
        }
    }
}

/// Classifies one operator's activation history.
///
/// Activations are replayed oldest first (ties broken by summit code) while
/// counting distinct catalog summits. The achieved tier comes from the final
/// count, and its date is the activation at which the running count first
/// reached that tier's minimum. Repeat visits and summits outside the catalog
/// never advance the count.
pub fn classify_award<'a, I>(
    history: I,
    catalog: &SummitCatalog,
    thresholds: &AwardThresholds,
) -> AwardOutcome
where
    I: IntoIterator<Item = &'a ActivationRecord>,
{
    let mut ordered: Vec<&ActivationRecord> = history.into_iter().collect();
    ordered.sort_by(|a, b| {
        a.activated_at
            .cmp(&b.activated_at)
            .then_with(|| a.summit_code.cmp(&b.summit_code))
    });

    let mut seen: HashSet<&SummitCode> = HashSet::new();
    let mut reached: Vec<(usize, DateTime<Utc>)> = Vec::new();
    for record in ordered {
        if !catalog.contains(&record.summit_code) || !seen.insert(&record.summit_code) {
            continue;
        }
        reached.push((seen.len(), record.activated_at));
    }

    let Some(tier) = thresholds.tier_for(seen.len()) else {
        return AwardOutcome::none();
    };

    let achieved_at = reached
        .iter()
        .find(|(count, _)| *count == tier.min_summits)
        .map(|(_, at)| *at);

    AwardOutcome {
        level: AwardLevel::Tier(tier.name.clone()),
        achieved_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awards::domain::{OperatorId, Summit};
    use chrono::TimeZone;

    fn catalog(codes: &[&str]) -> SummitCatalog {
        SummitCatalog::new(
            codes
                .iter()
                .map(|code| Summit {
                    code: SummitCode::new(code),
                    name: code.to_string(),
                    latitude: 57.0,
                    longitude: -3.5,
                    altitude_m: 800,
                    points: 4,
                    region: "ES".to_string(),
                })
                .collect(),
        )
        .expect("valid catalog")
    }

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, month, day, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn visit(code: &str, when: DateTime<Utc>) -> ActivationRecord {
        ActivationRecord::new(OperatorId(7), "GM0AAA", code, when)
    }

    fn ladder() -> AwardThresholds {
        "Tier1:1,Tier2:2,Tier3:3"
            .parse()
            .expect("valid tier table")
    }

    #[test]
    fn tier_for_picks_highest_met_threshold() {
        let thresholds = ladder();
        assert!(thresholds.tier_for(0).is_none());
        assert_eq!(thresholds.tier_for(1).map(|t| t.name.as_str()), Some("Tier1"));
        assert_eq!(thresholds.tier_for(2).map(|t| t.name.as_str()), Some("Tier2"));
        assert_eq!(thresholds.tier_for(50).map(|t| t.name.as_str()), Some("Tier3"));
    }

    #[test]
    fn tier_never_drops_as_count_rises() {
        let thresholds = AwardThresholds::standard(89);
        let mut previous = 0;
        for count in 0..=100 {
            let rank = thresholds
                .tier_for(count)
                .map(|tier| tier.min_summits)
                .unwrap_or(0);
            assert!(rank >= previous, "tier regressed at {count}");
            previous = rank;
        }
    }

    #[test]
    fn standard_ladder_ends_at_catalog_size() {
        let thresholds = AwardThresholds::standard(20);
        let names: Vec<_> = thresholds.tiers().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Hill Walker", "Bronze", "Summit Master"]);
        assert_eq!(thresholds.tiers().last().map(|t| t.min_summits), Some(20));

        assert!(AwardThresholds::standard(0).tiers().is_empty());
        assert_eq!(AwardThresholds::standard(1).tiers().len(), 1);
    }

    #[test]
    fn parse_rejects_invalid_tables() {
        assert_eq!("".parse::<AwardThresholds>(), Err(ThresholdError::Empty));
        assert!(matches!(
            "Gold:10,Silver:5".parse::<AwardThresholds>(),
            Err(ThresholdError::NotAscending { .. })
        ));
        assert!(matches!(
            "Starter:0".parse::<AwardThresholds>(),
            Err(ThresholdError::ZeroMinimum { .. })
        ));
        assert!(matches!(
            "Bronze".parse::<AwardThresholds>(),
            Err(ThresholdError::Malformed(_))
        ));
        assert!(matches!(
            "none:3".parse::<AwardThresholds>(),
            Err(ThresholdError::InvalidName(_))
        ));
    }

    #[test]
    fn repeat_visits_do_not_advance_award_date() {
        let catalog = catalog(&["S1", "S2", "S3"]);
        let history = vec![
            visit("S1", at(1, 1)),
            visit("S1", at(2, 1)),
            visit("S1", at(3, 1)),
            visit("S2", at(4, 1)),
        ];

        let outcome = classify_award(&history, &catalog, &ladder());
        assert_eq!(outcome.level, AwardLevel::Tier("Tier2".to_string()));
        assert_eq!(outcome.achieved_at, Some(at(4, 1)));
    }

    #[test]
    fn award_date_follows_chronology_not_input_order() {
        let catalog = catalog(&["S1", "S2", "S3"]);
        let history = vec![
            visit("S3", at(6, 1)),
            visit("S1", at(1, 1)),
            visit("S99", at(2, 1)),
            visit("S2", at(3, 1)),
        ];

        let outcome = classify_award(&history, &catalog, &ladder());
        assert_eq!(outcome.level, AwardLevel::Tier("Tier3".to_string()));
        assert_eq!(outcome.achieved_at, Some(at(6, 1)));
    }

    #[test]
    fn below_lowest_threshold_is_none() {
        let catalog = catalog(&["S1"]);
        let history = vec![visit("S99", at(1, 1))];

        let outcome = classify_award(&history, &catalog, &ladder());
        assert_eq!(outcome.level, AwardLevel::None);
        assert!(outcome.achieved_at.is_none());
        assert_eq!(serde_json::to_string(&outcome.level).expect("json"), "\"none\"");
    }
}
