//! CSV reader for district/period input tables.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use tracing::info;

use crate::analyzers::types::DistrictPeriodRecord;

/// Reads [`DistrictPeriodRecord`] rows from a CSV file with the columns
/// `district_id,period,demand_count,capacity,population`.
///
/// An empty `demand_count` cell marks the period as missing.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row does not match the schema.
pub fn load_records(path: &str) -> Result<Vec<DistrictPeriodRecord>> {
    let file = File::open(path).with_context(|| format!("failed to open {path}"))?;
    let records = read_records(file).with_context(|| format!("failed to parse {path}"))?;

    info!(path, rows = records.len(), "Loaded input records");
    Ok(records)
}

/// Parses records from any CSV source.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<DistrictPeriodRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: DistrictPeriodRecord = result?;
        rows.push(record);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows() {
        let data = "district_id,period,demand_count,capacity,population\n\
                    D1,1,50,100,1000\n\
                    D1,2,,100,1000\n\
                    D2, 1 , 12.5 ,40,250\n";

        let records = read_records(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].demand_count, Some(50.0));
        assert_eq!(records[1].demand_count, None);
        assert_eq!(records[2].district_id, "D2");
        assert_eq!(records[2].demand_count, Some(12.5));
        assert_eq!(records[2].population, 250);
    }

    #[test]
    fn test_malformed_row_fails() {
        let data = "district_id,period,demand_count,capacity,population\n\
                    D1,one,50,100,1000\n";
        assert!(read_records(data.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(load_records("/nonexistent/district_pressure.csv").is_err());
    }
}
