//! CSV readers for the state-totals input and the two output datasets.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::InputFormatError;
use crate::forecast::ForecastRecord;
use crate::month::YearMonth;
use crate::sim::types::{SimulatedRecord, StateAggregate};

const STATE_COLUMN: &str = "state";
const TOTAL_COLUMN: &str = "annual_consumption_kwh";

/// Loads state totals from a CSV file.
///
/// # Errors
///
/// Returns an [`InputFormatError`] if the file cannot be opened or its
/// contents are invalid (see [`read_states`]).
pub fn load_states(path: &Path) -> Result<Vec<StateAggregate>, InputFormatError> {
    let file = open(path)?;
    let states = read_states(file)?;
    info!(path = %path.display(), states = states.len(), "state totals loaded");
    Ok(states)
}

/// Parses state totals with columns `state` and `annual_consumption_kwh`.
///
/// Extra columns are ignored. Totals must be positive finite numbers and each
/// state may appear once.
///
/// # Errors
///
/// Returns an [`InputFormatError`] for missing columns, unparsable or
/// non-positive totals, blank or duplicate states, or an empty table.
pub fn read_states(reader: impl Read) -> Result<Vec<StateAggregate>, InputFormatError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let state_idx = column(&headers, STATE_COLUMN)?;
    let total_idx = column(&headers, TOTAL_COLUMN)?;

    let mut seen = HashSet::new();
    let mut states = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 2;
        let state = record.get(state_idx).unwrap_or_default().to_string();
        if state.is_empty() {
            return Err(invalid(row, "state name is empty"));
        }
        let raw = record.get(total_idx).unwrap_or_default();
        let total: f64 = raw
            .parse()
            .map_err(|_| invalid(row, format!("annual total \"{raw}\" is not a number")))?;
        if !(total.is_finite() && total > 0.0) {
            return Err(invalid(row, format!("annual total {total} must be positive")));
        }
        if !seen.insert(state.clone()) {
            return Err(InputFormatError::DuplicateState(state));
        }
        states.push(StateAggregate::new(state, total));
    }

    if states.is_empty() {
        return Err(InputFormatError::Empty);
    }
    Ok(states)
}

/// Loads a previously written simulated dataset.
///
/// # Errors
///
/// Returns an [`InputFormatError`] if the file cannot be opened or its
/// contents are invalid (see [`read_simulated`]).
pub fn load_simulated(path: &Path) -> Result<Vec<SimulatedRecord>, InputFormatError> {
    let file = open(path)?;
    let records = read_simulated(file)?;
    info!(path = %path.display(), records = records.len(), "simulated dataset loaded");
    Ok(records)
}

/// Parses the simulated dataset schema
/// (`state,ward_id,month,consumption_kwh`).
///
/// # Errors
///
/// Returns an [`InputFormatError`] for missing columns, malformed months or
/// non-numeric consumption.
pub fn read_simulated(reader: impl Read) -> Result<Vec<SimulatedRecord>, InputFormatError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let state_idx = column(&headers, "state")?;
    let ward_idx = column(&headers, "ward_id")?;
    let month_idx = column(&headers, "month")?;
    let kwh_idx = column(&headers, "consumption_kwh")?;

    let mut records = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let month: YearMonth = field(month_idx)
            .parse()
            .map_err(|e: crate::month::ParseMonthError| invalid(row, e.to_string()))?;
        let (state, ward_id) = series_key(row, field(state_idx), field(ward_idx))?;
        let consumption_kwh = finite_number(row, "consumption", field(kwh_idx))?;

        records.push(SimulatedRecord {
            state,
            ward_id,
            month,
            consumption_kwh,
        });
    }
    Ok(records)
}

/// Loads a combined forecast dataset.
///
/// # Errors
///
/// Returns an [`InputFormatError`] if the file cannot be opened or a row is
/// malformed.
pub fn load_forecasts(path: &Path) -> Result<Vec<ForecastRecord>, InputFormatError> {
    let file = open(path)?;
    read_forecasts(file)
}

/// Parses the combined forecast schema
/// (`state,ward_id,month,predicted_consumption`).
///
/// # Errors
///
/// Returns an [`InputFormatError`] for missing columns, malformed months or
/// non-numeric predictions.
pub fn read_forecasts(reader: impl Read) -> Result<Vec<ForecastRecord>, InputFormatError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let state_idx = column(&headers, "state")?;
    let ward_idx = column(&headers, "ward_id")?;
    let month_idx = column(&headers, "month")?;
    let value_idx = column(&headers, "predicted_consumption")?;

    let mut records = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let month: YearMonth = field(month_idx)
            .parse()
            .map_err(|e: crate::month::ParseMonthError| invalid(row, e.to_string()))?;
        let (state, ward_id) = series_key(row, field(state_idx), field(ward_idx))?;
        let predicted_consumption = finite_number(row, "prediction", field(value_idx))?;

        records.push(ForecastRecord {
            state,
            ward_id,
            month,
            predicted_consumption,
        });
    }
    Ok(records)
}

fn open(path: &Path) -> Result<File, InputFormatError> {
    File::open(path).map_err(|source| InputFormatError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn column(headers: &csv::StringRecord, name: &'static str) -> Result<usize, InputFormatError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or(InputFormatError::MissingColumn(name))
}

/// Non-blank state and ward labels of one dataset row.
fn series_key(
    row: usize,
    state: &str,
    ward_id: &str,
) -> Result<(String, String), InputFormatError> {
    if state.is_empty() {
        return Err(invalid(row, "state name is empty"));
    }
    if ward_id.is_empty() {
        return Err(invalid(row, "ward_id is empty"));
    }
    Ok((state.to_string(), ward_id.to_string()))
}

fn finite_number(row: usize, what: &str, raw: &str) -> Result<f64, InputFormatError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| invalid(row, format!("{what} \"{raw}\" is not a number")))?;
    if !value.is_finite() {
        return Err(invalid(row, format!("{what} {value} is not finite")));
    }
    Ok(value)
}

fn invalid(row: usize, message: impl Into<String>) -> InputFormatError {
    InputFormatError::InvalidRow {
        row,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::export::{write_forecasts, write_simulated};

    #[test]
    fn reads_states() {
        let csv = "state,annual_consumption_kwh\nDelhi,1200\n\"Dadra, Nagar Haveli\", 3.5e6\n";
        let states = read_states(csv.as_bytes()).expect("valid input");
        assert_eq!(states.len(), 2);
        assert_eq!(states[0], StateAggregate::new("Delhi", 1200.0));
        assert_eq!(states[1].state, "Dadra, Nagar Haveli");
        assert_eq!(states[1].annual_total_kwh, 3.5e6);
    }

    #[test]
    fn extra_columns_and_order_are_ignored() {
        let csv = "annual_consumption_kwh,region,state\n10,north,Punjab\n";
        let states = read_states(csv.as_bytes()).expect("valid input");
        assert_eq!(states, vec![StateAggregate::new("Punjab", 10.0)]);
    }

    #[test]
    fn missing_column_is_rejected() {
        let csv = "state,total\nDelhi,1200\n";
        assert!(matches!(
            read_states(csv.as_bytes()),
            Err(InputFormatError::MissingColumn(TOTAL_COLUMN))
        ));
    }

    #[test]
    fn non_numeric_total_is_rejected() {
        let csv = "state,annual_consumption_kwh\nDelhi,lots\n";
        assert!(matches!(
            read_states(csv.as_bytes()),
            Err(InputFormatError::InvalidRow { row: 2, .. })
        ));
    }

    #[test]
    fn non_positive_total_is_rejected() {
        let csv = "state,annual_consumption_kwh\nDelhi,0\n";
        assert!(read_states(csv.as_bytes()).is_err());
    }

    #[test]
    fn duplicate_state_is_rejected() {
        let csv = "state,annual_consumption_kwh\nDelhi,1\nDelhi,2\n";
        assert!(matches!(
            read_states(csv.as_bytes()),
            Err(InputFormatError::DuplicateState(_))
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        let csv = "state,annual_consumption_kwh\n";
        assert!(matches!(read_states(csv.as_bytes()), Err(InputFormatError::Empty)));
    }

    #[test]
    fn simulated_dataset_reads_back() {
        let records = vec![SimulatedRecord {
            state: "Goa".into(),
            ward_id: "W1".into(),
            month: YearMonth::new(2014, 4).expect("valid month"),
            consumption_kwh: 12.34,
        }];
        let mut buf = Vec::new();
        write_simulated(&records, &mut buf).expect("writes");
        let back = read_simulated(buf.as_slice()).expect("reads");
        assert_eq!(back, records);
    }

    #[test]
    fn bad_month_in_simulated_dataset() {
        let csv = "state,ward_id,month,consumption_kwh\nGoa,W1,April,1.0\n";
        assert!(matches!(
            read_simulated(csv.as_bytes()),
            Err(InputFormatError::InvalidRow { row: 2, .. })
        ));
    }

    #[test]
    fn blank_keys_in_simulated_dataset_are_rejected() {
        let blank_state =
            "state,ward_id,month,consumption_kwh\nGoa,W1,2014-04,1.0\n,W2,2014-04,1.0\n";
        assert!(matches!(
            read_simulated(blank_state.as_bytes()),
            Err(InputFormatError::InvalidRow { row: 3, .. })
        ));
        let blank_ward = "state,ward_id,month,consumption_kwh\nGoa,,2014-04,1.0\n";
        assert!(matches!(
            read_simulated(blank_ward.as_bytes()),
            Err(InputFormatError::InvalidRow { row: 2, .. })
        ));
    }

    #[test]
    fn non_finite_consumption_is_rejected() {
        for value in ["NaN", "inf", "-inf"] {
            let csv = format!("state,ward_id,month,consumption_kwh\nGoa,W1,2014-04,{value}\n");
            assert!(
                matches!(
                    read_simulated(csv.as_bytes()),
                    Err(InputFormatError::InvalidRow { row: 2, .. })
                ),
                "{value} should be rejected"
            );
        }
        let forecast = "state,ward_id,month,predicted_consumption\nGoa,W1,2015-04,NaN\n";
        assert!(read_forecasts(forecast.as_bytes()).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_states(Path::new("/definitely/not/here.csv")),
            Err(InputFormatError::Io { .. })
        ));
    }

    #[test]
    fn forecast_dataset_reads_back() {
        let records = vec![ForecastRecord {
            state: "Goa".into(),
            ward_id: "W2".into(),
            month: YearMonth::new(2015, 4).expect("valid month"),
            predicted_consumption: 321.5,
        }];
        let mut buf = Vec::new();
        write_forecasts(&records, &mut buf).expect("writes");
        let back = read_forecasts(buf.as_slice()).expect("reads");
        assert_eq!(back, records);
    }
}
