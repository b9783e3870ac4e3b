use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;

use super::fields::{self, FIELDS};
use super::{DataError, RawRow, Record, Result};

/// Derive the community label from a file name shaped
/// `<community>_<rest>.<ext>`: exactly one underscore in the stem and
/// exactly one extension separator, anything else is a naming error.
pub fn community_from_file_name(file_name: &str) -> Result<String> {
    let naming_err = || DataError::FileNaming {
        name: file_name.to_string(),
    };

    let mut dot_parts = file_name.split('.');
    let stem = dot_parts.next().ok_or_else(naming_err)?;
    if dot_parts.next().is_none() || dot_parts.next().is_some() {
        return Err(naming_err());
    }

    let mut stem_parts = stem.split('_');
    let community = stem_parts.next().ok_or_else(naming_err)?;
    if stem_parts.next().is_none() || stem_parts.next().is_some() {
        return Err(naming_err());
    }
    if community.is_empty() {
        return Err(naming_err());
    }

    Ok(community.to_string())
}

fn verify_header(file: &str, headers: &[String]) -> Result<()> {
    let mut present: HashSet<&str> = HashSet::new();
    for header in headers {
        if !fields::is_declared(header) {
            return Err(DataError::SchemaMismatch {
                file: file.to_string(),
                row: 0,
                detail: format!("unknown header column '{header}'"),
            });
        }
        // A duplicated column would let the later value silently win
        // when the row is zipped against the header.
        if !present.insert(header) {
            return Err(DataError::SchemaMismatch {
                file: file.to_string(),
                row: 0,
                detail: format!("duplicate header column '{header}'"),
            });
        }
    }

    for spec in FIELDS {
        if !present.contains(spec.label) {
            return Err(DataError::SchemaMismatch {
                file: file.to_string(),
                row: 0,
                detail: format!("missing header column '{}'", spec.label),
            });
        }
    }
    Ok(())
}

/// Read one community file into validated records, in file order.
///
/// Any malformed row aborts the whole file with a fatal error carrying
/// the file identity and the 1-based row number; there is no row-level
/// recovery. Rows shorter than the header surface as missing fields
/// through record construction; rows longer than the header carry
/// unmapped values and are a schema mismatch.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let file = path.as_ref().display().to_string();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&path)?;

    let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
    verify_header(&file, &headers)?;

    let mut records = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let row_number = idx + 1;
        let line = result?;

        if line.len() > headers.len() {
            return Err(DataError::SchemaMismatch {
                file: file.clone(),
                row: row_number,
                detail: format!(
                    "row has {} values but the header declares {} columns",
                    line.len(),
                    headers.len()
                ),
            });
        }

        let raw: RawRow = headers
            .iter()
            .zip(line.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();

        let record = Record::from_raw(&raw).map_err(|source| DataError::RecordValidation {
            file: file.clone(),
            row: row_number,
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}
