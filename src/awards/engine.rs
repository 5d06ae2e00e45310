use super::catalog::SummitCatalog;
use super::domain::{ActivationRecord, Callsign, OperatorId, ResolvedCallsign, Summit, SummitCode};
use super::remaining::remaining_summits;
use super::tier::{classify_award, AwardLevel, AwardThresholds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use tracing::{debug, info};

/// External lookup of an operator's current callsign, e.g. a registry
/// profile. A hit takes precedence over callsigns observed in activations.
pub trait CallsignDirectory {
    fn lookup(&self, operator: OperatorId) -> Option<Callsign>;
}

/// Which activations contribute to an operator's first/last dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRangePolicy {
    /// Every activation, including summits missing from the catalog.
    #[default]
    AllActivity,
    /// Only catalog summits. Operators with no catalog activations fall back
    /// to all of their activity.
    CatalogOnly,
}

impl FromStr for DateRangePolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" | "all_activity" => Ok(Self::AllActivity),
            "catalog" | "catalog_only" => Ok(Self::CatalogOnly),
            other => Err(format!(
                "unknown date range policy '{other}', expected 'all' or 'catalog'"
            )),
        }
    }
}

/// Award standing of a single operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardSummary {
    pub operator_id: OperatorId,
    pub callsign: ResolvedCallsign,
    pub summits_activated: usize,
    pub points: u32,
    pub activation_count: usize,
    pub first_activation_date: DateTime<Utc>,
    pub last_activation_date: DateTime<Utc>,
    pub activation_span_days: i64,
    pub award_tier: AwardLevel,
    pub award_date: Option<DateTime<Utc>>,
    pub remaining_summits: Vec<Summit>,
}

/// Computes award summaries from a catalog and a batch of activations.
/// Holds no state between runs.
pub struct AwardEngine<'a> {
    catalog: &'a SummitCatalog,
    thresholds: &'a AwardThresholds,
    date_range: DateRangePolicy,
    directory: Option<&'a dyn CallsignDirectory>,
}

impl<'a> AwardEngine<'a> {
    pub fn new(catalog: &'a SummitCatalog, thresholds: &'a AwardThresholds) -> Self {
        Self {
            catalog,
            thresholds,
            date_range: DateRangePolicy::default(),
            directory: None,
        }
    }

    pub fn with_date_range(mut self, policy: DateRangePolicy) -> Self {
        self.date_range = policy;
        self
    }

    pub fn with_directory(mut self, directory: &'a dyn CallsignDirectory) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn catalog(&self) -> &SummitCatalog {
        self.catalog
    }

    pub fn thresholds(&self) -> &AwardThresholds {
        self.thresholds
    }

    /// One summary per operator that appears in `records`, ordered by
    /// operator id.
    pub fn aggregate(&self, records: &[ActivationRecord]) -> Vec<AwardSummary> {
        let mut by_operator: BTreeMap<OperatorId, Vec<&ActivationRecord>> = BTreeMap::new();
        for record in records {
            by_operator
                .entry(record.operator_id)
                .or_default()
                .push(record);
        }

        let summaries: Vec<AwardSummary> = by_operator
            .into_iter()
            .map(|(operator, history)| self.summarise(operator, &history))
            .collect();

        info!(
            operators = summaries.len(),
            activations = records.len(),
            catalog_summits = self.catalog.len(),
            "award summaries computed"
        );

        summaries
    }

    fn summarise(&self, operator: OperatorId, history: &[&ActivationRecord]) -> AwardSummary {
        let activated: HashSet<SummitCode> = history
            .iter()
            .filter(|record| self.catalog.contains(&record.summit_code))
            .map(|record| record.summit_code.clone())
            .collect();

        let points = activated
            .iter()
            .filter_map(|code| self.catalog.get(code))
            .map(|summit| u32::from(summit.points))
            .sum();

        let (first, last) = self.activity_window(history);
        let outcome = classify_award(history.iter().copied(), self.catalog, self.thresholds);
        let callsign = self.resolve_callsign(operator, history);

        debug!(
            %operator,
            %callsign,
            summits = activated.len(),
            tier = %outcome.level,
            "operator summarised"
        );

        AwardSummary {
            operator_id: operator,
            callsign,
            summits_activated: activated.len(),
            points,
            activation_count: history.len(),
            first_activation_date: first,
            last_activation_date: last,
            activation_span_days: (last - first).num_days(),
            award_tier: outcome.level,
            award_date: outcome.achieved_at,
            remaining_summits: remaining_summits(self.catalog, &activated),
        }
    }

    fn activity_window(&self, history: &[&ActivationRecord]) -> (DateTime<Utc>, DateTime<Utc>) {
        let in_catalog: Vec<DateTime<Utc>> = match self.date_range {
            DateRangePolicy::AllActivity => Vec::new(),
            DateRangePolicy::CatalogOnly => history
                .iter()
                .filter(|record| self.catalog.contains(&record.summit_code))
                .map(|record| record.activated_at)
                .collect(),
        };

        let dates: Vec<DateTime<Utc>> = if in_catalog.is_empty() {
            history.iter().map(|record| record.activated_at).collect()
        } else {
            in_catalog
        };

        let first = dates.iter().min().copied().unwrap_or_default();
        let last = dates.iter().max().copied().unwrap_or(first);
        (first, last)
    }

    /// Directory hit first, then the callsign on the most recent activation
    /// (smallest callsign wins a timestamp tie), then the unknown sentinel.
    fn resolve_callsign(
        &self,
        operator: OperatorId,
        history: &[&ActivationRecord],
    ) -> ResolvedCallsign {
        if let Some(call) = self.directory.and_then(|directory| directory.lookup(operator)) {
            return ResolvedCallsign::Known(call);
        }

        let mut latest: Option<(DateTime<Utc>, &Callsign)> = None;
        for record in history {
            let Some(call) = record.callsign.as_ref() else {
                continue;
            };
            let newer = match latest {
                None => true,
                Some((at, best)) => {
                    record.activated_at > at || (record.activated_at == at && call < best)
                }
            };
            if newer {
                latest = Some((record.activated_at, call));
            }
        }

        match latest {
            Some((_, call)) => ResolvedCallsign::Known(call.clone()),
            None => ResolvedCallsign::Unknown,
        }
    }
}

/// Aggregates with the standard tier ladder for `catalog`.
pub fn aggregate(catalog: &SummitCatalog, records: &[ActivationRecord]) -> Vec<AwardSummary> {
    let thresholds = AwardThresholds::standard(catalog.len());
    AwardEngine::new(catalog, &thresholds).aggregate(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn catalog() -> SummitCatalog {
        SummitCatalog::new(
            [("S1", 1), ("S2", 2), ("S3", 4)]
                .iter()
                .map(|(code, points)| Summit {
                    code: SummitCode::new(code),
                    name: format!("Summit {code}"),
                    latitude: 57.05,
                    longitude: -3.61,
                    altitude_m: 700,
                    points: *points,
                    region: "CS".to_string(),
                })
                .collect(),
        )
        .expect("valid catalog")
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    struct Directory(HashMap<OperatorId, Callsign>);

    impl CallsignDirectory for Directory {
        fn lookup(&self, operator: OperatorId) -> Option<Callsign> {
            self.0.get(&operator).cloned()
        }
    }

    #[test]
    fn latest_callsign_wins_with_lexical_tie_break() {
        let catalog = catalog();
        let thresholds = AwardThresholds::standard(catalog.len());
        let records = vec![
            ActivationRecord::new(OperatorId(1), "MM0OLD", "S1", at(2021, 5, 1, 9)),
            ActivationRecord::new(OperatorId(1), "GM0ZZZ", "S2", at(2023, 5, 1, 9)),
            ActivationRecord::new(OperatorId(1), "GM0AAA/P", "S3", at(2023, 5, 1, 9)),
            ActivationRecord::new(OperatorId(1), "", "S3", at(2024, 1, 1, 9)),
        ];

        let summaries = AwardEngine::new(&catalog, &thresholds).aggregate(&records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].callsign.as_str(), "GM0AAA");
        assert_eq!(summaries[0].points, 7);
        assert_eq!(summaries[0].activation_count, 4);
    }

    #[test]
    fn directory_overrides_and_missing_calls_are_unknown() {
        let catalog = catalog();
        let thresholds = AwardThresholds::standard(catalog.len());
        let directory = Directory(HashMap::from([(
            OperatorId(2),
            Callsign::parse("GM4NEW").expect("callsign"),
        )]));
        let records = vec![
            ActivationRecord::new(OperatorId(2), "GM4OLD", "S1", at(2022, 1, 1, 9)),
            ActivationRecord::new(OperatorId(3), " ", "S1", at(2022, 1, 2, 9)),
        ];

        let summaries = AwardEngine::new(&catalog, &thresholds)
            .with_directory(&directory)
            .aggregate(&records);

        assert_eq!(summaries[0].callsign.as_str(), "GM4NEW");
        assert_eq!(summaries[1].callsign, ResolvedCallsign::Unknown);
    }

    #[test]
    fn catalog_only_policy_narrows_date_range() {
        let catalog = catalog();
        let thresholds = AwardThresholds::standard(catalog.len());
        let records = vec![
            ActivationRecord::new(OperatorId(4), "GM0BBB", "S99", at(2020, 1, 1, 9)),
            ActivationRecord::new(OperatorId(4), "GM0BBB", "S1", at(2022, 6, 1, 9)),
            ActivationRecord::new(OperatorId(4), "GM0BBB", "S2", at(2022, 6, 11, 9)),
            ActivationRecord::new(OperatorId(5), "GM0CCC", "S98", at(2021, 3, 1, 9)),
        ];

        let summaries = AwardEngine::new(&catalog, &thresholds)
            .with_date_range(DateRangePolicy::CatalogOnly)
            .aggregate(&records);

        assert_eq!(summaries[0].first_activation_date, at(2022, 6, 1, 9));
        assert_eq!(summaries[0].activation_span_days, 10);
        assert_eq!(summaries[1].first_activation_date, at(2021, 3, 1, 9));
        assert_eq!(summaries[1].summits_activated, 0);
        assert_eq!(summaries[1].award_tier, AwardLevel::None);
    }

    #[test]
    fn span_counts_whole_days_between_timestamps() {
        let catalog = catalog();
        let records = vec![
            ActivationRecord::new(OperatorId(6), "GM0DDD", "S1", at(2023, 7, 1, 22)),
            ActivationRecord::new(OperatorId(6), "GM0DDD", "S2", at(2023, 7, 2, 6)),
        ];

        let summaries = aggregate(&catalog, &records);
        assert_eq!(summaries[0].activation_span_days, 0);
    }

    #[test]
    fn date_range_policy_parses_config_values() {
        assert_eq!("all".parse::<DateRangePolicy>(), Ok(DateRangePolicy::AllActivity));
        assert_eq!(" Catalog ".parse::<DateRangePolicy>(), Ok(DateRangePolicy::CatalogOnly));
        assert!("recent".parse::<DateRangePolicy>().is_err());
    }
}
