use super::domain::{Summit, SummitCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("summit code {0} appears more than once in the catalog")]
    DuplicateCode(SummitCode),
}

/// Fixed set of summits counted by the award. Keeps the order summits were
/// supplied in and rejects duplicate codes on construction.
#[derive(Debug, Clone, Default)]
pub struct SummitCatalog {
    summits: Vec<Summit>,
    index: HashMap<SummitCode, usize>,
}

impl SummitCatalog {
    pub fn new(summits: Vec<Summit>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(summits.len());
        for (position, summit) in summits.iter().enumerate() {
            if index.insert(summit.code.clone(), position).is_some() {
                return Err(CatalogError::DuplicateCode(summit.code.clone()));
            }
        }

        Ok(Self { summits, index })
    }

    pub fn summits(&self) -> &[Summit] {
        &self.summits
    }

    pub fn len(&self) -> usize {
        self.summits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summits.is_empty()
    }

    pub fn contains(&self, code: &SummitCode) -> bool {
        self.index.contains_key(code)
    }

    pub fn get(&self, code: &SummitCode) -> Option<&Summit> {
        self.index.get(code).map(|&position| &self.summits[position])
    }

    pub fn total_points(&self) -> u32 {
        self.summits
            .iter()
            .map(|summit| u32::from(summit.points))
            .sum()
    }

    pub fn region_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for summit in &self.summits {
            *counts.entry(summit.region.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn overview(&self) -> CatalogOverview {
        CatalogOverview {
            total_summits: self.len(),
            total_points: self.total_points(),
            regions: self.region_counts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOverview {
    pub total_summits: usize,
    pub total_points: u32,
    pub regions: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summit(code: &str, region: &str, points: u8) -> Summit {
        Summit {
            code: SummitCode::new(code),
            name: format!("Summit {code}"),
            latitude: 57.0,
            longitude: -3.6,
            altitude_m: 900,
            points,
            region: region.to_string(),
        }
    }

    #[test]
    fn catalog_rejects_duplicate_codes() {
        let err = SummitCatalog::new(vec![
            summit("GM/ES-001", "ES", 10),
            summit("gm/es-001", "ES", 10),
        ])
        .expect_err("duplicate code must fail");

        assert_eq!(err, CatalogError::DuplicateCode(SummitCode::new("GM/ES-001")));
    }

    #[test]
    fn overview_counts_regions_and_points() {
        let catalog = SummitCatalog::new(vec![
            summit("GM/ES-001", "ES", 10),
            summit("GM/ES-002", "ES", 10),
            summit("GM/CS-001", "CS", 8),
        ])
        .expect("valid catalog");

        let overview = catalog.overview();
        assert_eq!(overview.total_summits, 3);
        assert_eq!(overview.total_points, 28);
        assert_eq!(overview.regions.get("ES"), Some(&2));
        assert_eq!(overview.regions.get("CS"), Some(&1));
        assert!(catalog.contains(&SummitCode::new("GM/CS-001")));
        assert!(catalog.get(&SummitCode::new("GM/WS-001")).is_none());
    }
}
