use super::ImportError;
use crate::awards::{Summit, SummitCatalog, SummitCode};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Catalog export row: `summitCode,name,latitude,longitude,altM,points,Region`.
#[derive(Debug, Deserialize)]
struct SummitRow {
    #[serde(rename = "summitCode")]
    code: String,
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(rename = "altM")]
    altitude_m: f64,
    points: u8,
    #[serde(rename = "Region", alias = "region")]
    region: String,
}

impl SummitRow {
    fn into_summit(self, row: usize) -> Result<Summit, ImportError> {
        let invalid = |reason: String| ImportError::InvalidSummit { row, reason };

        if self.code.trim().is_empty() {
            return Err(invalid("summit code is blank".to_string()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid(format!("latitude {} out of range", self.latitude)));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid(format!("longitude {} out of range", self.longitude)));
        }
        if !self.altitude_m.is_finite() || self.altitude_m < 0.0 {
            return Err(invalid(format!("altitude {} is not valid", self.altitude_m)));
        }

        Ok(Summit {
            code: SummitCode::new(&self.code),
            name: self.name.trim().to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            altitude_m: self.altitude_m.round() as u32,
            points: self.points,
            region: self.region.trim().to_string(),
        })
    }
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<SummitCatalog, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<SummitCatalog, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut summits = Vec::new();
        for (position, record) in csv_reader.deserialize::<SummitRow>().enumerate() {
            let row = record?;
            summits.push(row.into_summit(position + 1)?);
        }

        let catalog = SummitCatalog::new(summits)?;
        info!(
            summits = catalog.len(),
            points = catalog.total_points(),
            "summit catalog loaded"
        );
        Ok(catalog)
    }
}
