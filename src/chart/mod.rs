//! Chart assembly: turns aggregation output into serializable chart
//! definitions for the external renderer. Pure assembly over validated
//! data, no decisions of its own.

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{detail_line, Aggregation};
use crate::config::Config;

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    pub mode: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
    /// Per-point hover text, parallel to `x`/`y`.
    pub text: Vec<String>,
}

/// Shaded vertical band clipped to a fixed price range.
#[derive(Debug, Clone, Serialize)]
pub struct Band {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub price_min: f64,
    pub price_max: f64,
}

/// Horizontal reference line spanning the observed month range.
#[derive(Debug, Clone, Serialize)]
pub struct Threshold {
    pub level: f64,
    pub color: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub series: Vec<Series>,
    pub bands: Vec<Band>,
    pub thresholds: Vec<Threshold>,
}

/// One lines+markers series per community over monthly averages.
pub fn monthly_chart(aggregation: &Aggregation, config: &Config) -> ChartSpec {
    let series = aggregation
        .communities
        .iter()
        .map(|community| Series {
            name: community.community.clone(),
            mode: "lines+markers".to_string(),
            x: community.monthly.iter().map(|s| s.month).collect(),
            y: community
                .monthly
                .iter()
                .map(|s| s.average_unit_price)
                .collect(),
            text: community
                .monthly
                .iter()
                .map(|s| s.detail_text.clone())
                .collect(),
        })
        .collect();

    ChartSpec {
        title: "Monthly average unit price".to_string(),
        series,
        bands: bands(config),
        thresholds: thresholds(aggregation, config),
    }
}

/// One series per community over every individual valid transaction.
pub fn raw_points_chart(aggregation: &Aggregation, config: &Config) -> ChartSpec {
    let series = aggregation
        .communities
        .iter()
        .map(|community| Series {
            name: community.community.clone(),
            mode: "lines+markers".to_string(),
            x: community.records.iter().map(|r| r.selling_date).collect(),
            y: community.records.iter().map(|r| r.unit_price).collect(),
            text: community.records.iter().map(detail_line).collect(),
        })
        .collect();

    ChartSpec {
        title: "Unit price by transaction".to_string(),
        series,
        bands: bands(config),
        thresholds: thresholds(aggregation, config),
    }
}

fn bands(config: &Config) -> Vec<Band> {
    config
        .bands
        .iter()
        .map(|band| Band {
            start: band.start,
            end: band.end,
            price_min: config.band_price_range.min,
            price_max: config.band_price_range.max,
        })
        .collect()
}

fn thresholds(aggregation: &Aggregation, config: &Config) -> Vec<Threshold> {
    config
        .thresholds
        .iter()
        .map(|line| Threshold {
            level: line.level,
            color: line.color.clone(),
            start: aggregation.extent.min_month,
            end: aggregation.extent.max_month,
        })
        .collect()
}
