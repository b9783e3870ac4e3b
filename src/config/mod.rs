use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A shaded vertical band between two dates, drawn behind the series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateBand {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Fixed y-axis clip for the shaded bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// A horizontal reference line at a unit-price level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdLine {
    pub level: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: String,
    pub result_dir: String,
    #[serde(default)]
    pub bands: Vec<DateBand>,
    pub band_price_range: PriceRange,
    #[serde(default)]
    pub thresholds: Vec<ThresholdLine>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            result_dir: "result".to_string(),
            bands: Vec::new(),
            band_price_range: PriceRange { min: 0.0, max: 15.0 },
            thresholds: Vec::new(),
        }
    }
}
