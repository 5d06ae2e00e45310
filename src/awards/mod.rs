//! Award computation: catalog, activation aggregation, tier classification
//! and remaining-summit derivation.

pub mod catalog;
pub mod domain;
pub mod engine;
pub mod honour_roll;
mod remaining;
pub mod tier;

pub use catalog::{CatalogError, CatalogOverview, SummitCatalog};
pub use domain::{
    ActivationRecord, Callsign, OperatorId, ResolvedCallsign, Summit, SummitCode,
    UNKNOWN_CALLSIGN,
};
pub use engine::{aggregate, AwardEngine, AwardSummary, CallsignDirectory, DateRangePolicy};
pub use honour_roll::{AwardSummaryDocument, HonourRoll, HonourRollEntry, SummaryStoreError};
pub use remaining::remaining_summits;
pub use tier::{classify_award, AwardLevel, AwardOutcome, AwardThresholds, AwardTier, ThresholdError};
