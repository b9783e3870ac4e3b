use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::data::{loader, DataError, Record, Result};

/// Line separator inside hover detail text; the renderer boundary is HTML.
const DETAIL_SEPARATOR: &str = "<br>";

/// Running min/max over selling month and unit price across all valid
/// records. Starts at infinite sentinels and tightens monotonically.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalExtent {
    pub min_month: NaiveDate,
    pub max_month: NaiveDate,
    pub min_unit_price: f64,
    pub max_unit_price: f64,
    valid_records: usize,
}

impl Default for GlobalExtent {
    fn default() -> Self {
        Self {
            min_month: NaiveDate::MAX,
            max_month: NaiveDate::MIN,
            min_unit_price: f64::INFINITY,
            max_unit_price: f64::NEG_INFINITY,
            valid_records: 0,
        }
    }
}

impl GlobalExtent {
    fn update(&mut self, record: &Record) {
        let month = record.selling_month();
        self.min_month = self.min_month.min(month);
        self.max_month = self.max_month.max(month);
        self.min_unit_price = self.min_unit_price.min(record.unit_price);
        self.max_unit_price = self.max_unit_price.max(record.unit_price);
        self.valid_records += 1;
    }

    pub fn valid_records(&self) -> usize {
        self.valid_records
    }
}

/// Summary of one community's valid transactions for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub month: NaiveDate,
    pub average_unit_price: f64,
    pub detail_text: String,
}

/// One community's aggregation output: monthly summaries month-ascending,
/// plus the individual valid records for the raw all-points chart.
#[derive(Debug, Clone)]
pub struct CommunitySeries {
    pub community: String,
    pub monthly: Vec<MonthlySummary>,
    pub records: Vec<Record>,
}

/// Complete output of one aggregation run.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub communities: Vec<CommunitySeries>,
    pub extent: GlobalExtent,
}

/// Run-scoped aggregation state: buckets keyed by community and month,
/// plus the global extent. Owned by one run, never shared.
#[derive(Debug, Default)]
pub struct Aggregator {
    buckets: BTreeMap<String, BTreeMap<NaiveDate, Vec<Record>>>,
    extent: GlobalExtent,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one community file. Fatal on the first malformed row; a
    /// zero unit price is the single recoverable condition and is logged
    /// and excluded, never dropped silently.
    pub fn ingest_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file_name = path
            .as_ref()
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DataError::FileNaming {
                name: path.as_ref().display().to_string(),
            })?
            .to_string();
        let community = loader::community_from_file_name(&file_name)?;

        let records = loader::read_records(&path)?;
        info!(file = %file_name, community = %community, rows = records.len(), "loaded community file");

        for (idx, record) in records.into_iter().enumerate() {
            self.observe(&community, &file_name, idx + 1, record);
        }
        Ok(())
    }

    fn observe(&mut self, community: &str, file: &str, row: usize, record: Record) {
        if !record.is_valid() {
            warn!(
                file,
                row,
                date = %record.selling_date,
                "zero unit price, excluding record from aggregation"
            );
            return;
        }

        self.extent.update(&record);
        self.buckets
            .entry(community.to_string())
            .or_default()
            .entry(record.selling_month())
            .or_default()
            .push(record);
    }

    /// Finish the run: per community, emit monthly summaries in
    /// month-ascending order, and resolve the extent. Zero valid records
    /// anywhere leaves the extent at its sentinels and is a hard error.
    pub fn finish(self) -> Result<Aggregation> {
        if self.extent.valid_records == 0 {
            return Err(DataError::NoValidRecords);
        }

        let communities = self
            .buckets
            .into_iter()
            .map(|(community, months)| {
                let mut records = Vec::new();
                let monthly = months
                    .into_iter()
                    .map(|(month, bucket)| {
                        let summary = summarize(month, &bucket);
                        records.extend(bucket);
                        summary
                    })
                    .collect();
                records.sort_by_key(|r| r.selling_date);
                CommunitySeries {
                    community,
                    monthly,
                    records,
                }
            })
            .collect();

        Ok(Aggregation {
            communities,
            extent: self.extent,
        })
    }
}

fn summarize(month: NaiveDate, bucket: &[Record]) -> MonthlySummary {
    let average_unit_price =
        bucket.iter().map(|r| r.unit_price).sum::<f64>() / bucket.len() as f64;

    // Detail lines are date-ascending regardless of read order.
    let mut members: Vec<&Record> = bucket.iter().collect();
    members.sort_by_key(|r| r.selling_date);

    let mut lines = Vec::with_capacity(members.len() + 1);
    lines.push(format!("{} deals", members.len()));
    lines.extend(members.iter().map(|r| detail_line(r)));

    MonthlySummary {
        month,
        average_unit_price,
        detail_text: lines.join(DETAIL_SEPARATOR),
    }
}

/// One hover line per record: date, price, unit price, area, floor,
/// window direction, floor plan, furnish, in that fixed order.
pub fn detail_line(record: &Record) -> String {
    format!(
        "{} price={} unit={} area={} floor={} facing={} plan={} furnish={}",
        record.selling_date.format("%Y-%m-%d"),
        record.price,
        record.unit_price,
        record.area,
        record.floor,
        record.window_direction,
        record.floor_plan,
        record.furnish,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{fields::labels, sample_raw};

    fn record(date: &str, unit_price: f64) -> Record {
        let mut raw = sample_raw();
        raw.insert(labels::SELLING_DATE.to_string(), date.to_string());
        raw.insert(labels::UNIT_PRICE.to_string(), unit_price.to_string());
        Record::from_raw(&raw).unwrap()
    }

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn same_month_records_share_a_bucket_and_average() {
        let mut agg = Aggregator::new();
        // Reverse date order on purpose; detail text must re-sort.
        agg.observe("lakeview", "lakeview_a.csv", 1, record("2023-05-28", 7.0));
        agg.observe("lakeview", "lakeview_a.csv", 2, record("2023-05-02", 5.0));

        let out = agg.finish().unwrap();
        assert_eq!(out.communities.len(), 1);
        let series = &out.communities[0];
        assert_eq!(series.monthly.len(), 1);

        let summary = &series.monthly[0];
        assert_eq!(summary.month, month(2023, 5));
        assert_eq!(summary.average_unit_price, 6.0);

        let first = summary.detail_text.find("2023-05-02").unwrap();
        let second = summary.detail_text.find("2023-05-28").unwrap();
        assert!(first < second);
        assert!(summary.detail_text.starts_with("2 deals"));
    }

    #[test]
    fn zero_unit_price_excluded_from_buckets_and_extent() {
        let mut agg = Aggregator::new();
        agg.observe("lakeview", "lakeview_a.csv", 1, record("2023-05-02", 5.0));
        agg.observe("lakeview", "lakeview_a.csv", 2, record("2019-01-02", 0.0));

        let out = agg.finish().unwrap();
        assert_eq!(out.extent.valid_records(), 1);
        assert_eq!(out.extent.min_month, month(2023, 5));
        assert_eq!(out.communities[0].records.len(), 1);
    }

    #[test]
    fn extent_spans_all_communities_in_any_order() {
        let mut agg = Aggregator::new();
        agg.observe("b", "b_x.csv", 1, record("2022-11-30", 9.5));
        agg.observe("a", "a_x.csv", 1, record("2015-03-14", 2.5));
        agg.observe("a", "a_x.csv", 2, record("2018-07", 4.0));

        let out = agg.finish().unwrap();
        assert_eq!(out.extent.min_month, month(2015, 3));
        assert_eq!(out.extent.max_month, month(2022, 11));
        assert_eq!(out.extent.min_unit_price, 2.5);
        assert_eq!(out.extent.max_unit_price, 9.5);
    }

    #[test]
    fn months_emitted_ascending() {
        let mut agg = Aggregator::new();
        agg.observe("a", "a_x.csv", 1, record("2023-06-10", 6.0));
        agg.observe("a", "a_x.csv", 2, record("2023-01-10", 5.0));
        agg.observe("a", "a_x.csv", 3, record("2023-03-10", 5.5));

        let out = agg.finish().unwrap();
        let months: Vec<NaiveDate> = out.communities[0].monthly.iter().map(|s| s.month).collect();
        assert_eq!(months, vec![month(2023, 1), month(2023, 3), month(2023, 6)]);
    }

    #[test]
    fn no_valid_records_is_an_error() {
        let mut agg = Aggregator::new();
        agg.observe("a", "a_x.csv", 1, record("2023-06-10", 0.0));
        assert!(matches!(agg.finish(), Err(DataError::NoValidRecords)));

        assert!(matches!(
            Aggregator::new().finish(),
            Err(DataError::NoValidRecords)
        ));
    }

    #[test]
    fn detail_line_field_order() {
        let line = detail_line(&record("2023-05-02", 5.2));
        let positions: Vec<usize> = [
            "2023-05-02",
            "price=",
            "unit=",
            "area=",
            "floor=",
            "facing=",
            "plan=",
            "furnish=",
        ]
        .iter()
        .map(|needle| line.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
