//! CSV export of the simulated and forecast datasets.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::PersistenceError;
use crate::forecast::ForecastRecord;
use crate::sim::types::SimulatedRecord;

/// Column header of the simulated dataset.
pub const SIMULATED_HEADER: [&str; 4] = ["state", "ward_id", "month", "consumption_kwh"];

/// Column header of the combined forecast dataset.
pub const FORECAST_HEADER: [&str; 4] = ["state", "ward_id", "month", "predicted_consumption"];

/// Writes the simulated dataset to `path`.
///
/// # Errors
///
/// Returns a [`PersistenceError`] if the file cannot be created or written.
pub fn export_simulated(records: &[SimulatedRecord], path: &Path) -> Result<(), PersistenceError> {
    create(path)
        .and_then(|file| write_simulated(records, io::BufWriter::new(file)))
        .map_err(|source| PersistenceError {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes the combined forecast dataset to `path`.
///
/// # Errors
///
/// Returns a [`PersistenceError`] if the file cannot be created or written.
pub fn export_forecasts(records: &[ForecastRecord], path: &Path) -> Result<(), PersistenceError> {
    create(path)
        .and_then(|file| write_forecasts(records, io::BufWriter::new(file)))
        .map_err(|source| PersistenceError {
            path: path.to_path_buf(),
            source,
        })
}

fn create(path: &Path) -> Result<File, csv::Error> {
    File::create(path).map_err(csv::Error::from)
}

/// Writes simulated records as CSV to any writer, consumption to 2 decimals.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_simulated(records: &[SimulatedRecord], writer: impl Write) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SIMULATED_HEADER)?;
    for r in records {
        wtr.write_record(&[
            r.state.clone(),
            r.ward_id.clone(),
            r.month.to_string(),
            format!("{:.2}", r.consumption_kwh),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes forecast records as CSV to any writer.
///
/// Predictions are written at full precision, so they read back unchanged.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_forecasts(records: &[ForecastRecord], writer: impl Write) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(FORECAST_HEADER)?;
    for r in records {
        wtr.write_record(&[
            r.state.clone(),
            r.ward_id.clone(),
            r.month.to_string(),
            r.predicted_consumption.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::YearMonth;

    fn make_record(i: u32) -> SimulatedRecord {
        SimulatedRecord {
            state: "Tamil Nadu".to_string(),
            ward_id: "W1".to_string(),
            month: YearMonth::new(2014, 4).expect("valid month").plus(i),
            consumption_kwh: 1234.5,
        }
    }

    #[test]
    fn simulated_header_and_formatting() {
        let mut buf = Vec::new();
        write_simulated(&[make_record(0)], &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("state,ward_id,month,consumption_kwh"));
        assert_eq!(lines.next(), Some("Tamil Nadu,W1,2014-04,1234.50"));
    }

    #[test]
    fn forecast_header() {
        let rec = ForecastRecord {
            state: "Goa".into(),
            ward_id: "W3".into(),
            month: YearMonth::new(2015, 4).expect("valid month"),
            predicted_consumption: 9.87654,
        };
        let mut buf = Vec::new();
        write_forecasts(&[rec], &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "state,ward_id,month,predicted_consumption");
        assert_eq!(lines[1], "Goa,W3,2015-04,9.87654");
    }

    #[test]
    fn predictions_keep_full_precision() {
        let value = 1000.0 / 3.0;
        let rec = ForecastRecord {
            state: "Goa".into(),
            ward_id: "W3".into(),
            month: YearMonth::new(2015, 5).expect("valid month"),
            predicted_consumption: value,
        };
        let mut buf = Vec::new();
        write_forecasts(&[rec], &mut buf).expect("writes");

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let row = rdr
            .records()
            .next()
            .expect("one data row")
            .expect("valid row");
        let parsed: f64 = row[3].parse().expect("numeric prediction");
        assert_eq!(parsed, value);
    }

    #[test]
    fn row_count_matches_record_count() {
        let records: Vec<SimulatedRecord> = (0..12).map(make_record).collect();
        let mut buf = Vec::new();
        write_simulated(&records, &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        assert_eq!(output.lines().count(), 13);
    }

    #[test]
    fn state_names_with_commas_are_quoted() {
        let mut rec = make_record(0);
        rec.state = "Dadra, Nagar Haveli".to_string();
        let mut buf = Vec::new();
        write_simulated(&[rec], &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        assert!(output.contains("\"Dadra, Nagar Haveli\""));
    }

    #[test]
    fn unwritable_path_is_persistence_error() {
        let err = export_simulated(&[make_record(0)], Path::new("/nonexistent-dir/out.csv"));
        assert!(err.is_err());
    }
}
