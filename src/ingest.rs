//! CSV Driver Ingest (C9): load a driver lineup from CSV, the external
//! interface for lineups supplied by the host (spec.md §6).

use std::io::Cursor;
use std::path::Path;

use crate::error::{SimError, SimResult};
use crate::models::DriverMetrics;

const REQUIRED_HEADERS: [&str; 10] = [
    "driver_name",
    "team_name",
    "grid_position",
    "qualy_gap_ms",
    "fp_longrun_pace_s",
    "straightline_index",
    "cornering_index",
    "speed_trap_kph",
    "pit_crew_mean_s",
    "dnf_rate",
];

/// Default applied to a driver's skill modifiers when the source CSV omits
/// them entirely (spec.md §6 "skill-modifier defaults").
const DEFAULT_WET_SKILL: f64 = 0.8;
const DEFAULT_CONSISTENCY: f64 = 0.8;
const DEFAULT_TYRE_MANAGEMENT: f64 = 0.8;
const DEFAULT_AGGRESSION: f64 = 0.5;
const DEFAULT_EXPERIENCE: f64 = 0.5;

fn parse_numeric(record: &csv::StringRecord, headers: &csv::StringRecord, column: &str) -> f64 {
    headers
        .iter()
        .position(|h| h == column)
        .and_then(|idx| record.get(idx))
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn parse_optional_numeric(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
    column: &str,
    default: f64,
) -> f64 {
    headers
        .iter()
        .position(|h| h == column)
        .and_then(|idx| record.get(idx))
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

fn get_string(record: &csv::StringRecord, headers: &csv::StringRecord, column: &str) -> Option<String> {
    headers
        .iter()
        .position(|h| h == column)
        .and_then(|idx| record.get(idx))
        .map(|v| v.trim().to_string())
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn derive_code(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .last()
        .unwrap_or(name)
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    if letters.len() == 3 {
        letters
    } else {
        format!("{:0<3}", letters)
    }
}

/// Parse a driver lineup from CSV content already held in memory.
pub fn ingest_csv_str(content: &str) -> SimResult<Vec<DriverMetrics>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(content));

    let headers = reader
        .headers()
        .map_err(|e| SimError::InputValidation(format!("failed to read CSV headers: {e}")))?
        .clone();

    for required in REQUIRED_HEADERS {
        if !headers.iter().any(|h| h == required) {
            return Err(SimError::InputValidation(format!(
                "missing required column: {required}"
            )));
        }
    }

    let mut drivers = Vec::new();
    for (zero_based_index, record) in reader.records().enumerate() {
        let row_index = zero_based_index + 1;
        let record = record
            .map_err(|e| SimError::InputValidation(format!("row {row_index}: {e}")))?;

        let name = get_string(&record, &headers, "driver_name").unwrap_or_default();
        if name.is_empty() {
            return Err(SimError::InputValidation(format!(
                "row {row_index}: driver_name must not be empty"
            )));
        }
        let team = get_string(&record, &headers, "team_name").unwrap_or_default();

        let driver = DriverMetrics {
            id: slugify(&name),
            code: derive_code(&name),
            name,
            team,
            grid_position: parse_numeric(&record, &headers, "grid_position").max(1.0) as u32,
            qualy_gap_ms: parse_numeric(&record, &headers, "qualy_gap_ms"),
            long_run_pace_delta: parse_numeric(&record, &headers, "fp_longrun_pace_s"),
            straightline_index: parse_numeric(&record, &headers, "straightline_index"),
            cornering_index: parse_numeric(&record, &headers, "cornering_index"),
            speed_trap_kph: parse_numeric(&record, &headers, "speed_trap_kph"),
            pit_stop_median: parse_numeric(&record, &headers, "pit_crew_mean_s"),
            dnf_rate: parse_numeric(&record, &headers, "dnf_rate"),
            wet_skill: parse_optional_numeric(&record, &headers, "wet_skill", DEFAULT_WET_SKILL),
            consistency: parse_optional_numeric(&record, &headers, "consistency", DEFAULT_CONSISTENCY),
            tyre_management: parse_optional_numeric(
                &record,
                &headers,
                "tyre_management",
                DEFAULT_TYRE_MANAGEMENT,
            ),
            aggression: parse_optional_numeric(&record, &headers, "aggression", DEFAULT_AGGRESSION),
            experience: parse_optional_numeric(&record, &headers, "experience", DEFAULT_EXPERIENCE),
            standings_points: headers
                .iter()
                .position(|h| h == "standings_points")
                .and_then(|idx| record.get(idx))
                .filter(|v| !v.trim().is_empty())
                .and_then(|v| v.trim().parse::<f64>().ok()),
        };
        drivers.push(driver);
    }

    Ok(drivers)
}

/// Parse a driver lineup from a CSV file on disk.
pub fn ingest_csv_file(path: impl AsRef<Path>) -> SimResult<Vec<DriverMetrics>> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        SimError::InputValidation(format!("failed to read {}: {e}", path.as_ref().display()))
    })?;
    ingest_csv_str(&content)
}

/// Serialize a driver lineup back to CSV, the inverse of `ingest_csv_str`
/// for the ten required columns (spec.md §6).
pub fn export_csv(drivers: &[DriverMetrics]) -> SimResult<String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(REQUIRED_HEADERS)
        .map_err(|e| SimError::InternalInvariant {
            id: "csv-export-header".to_string(),
            detail: e.to_string(),
        })?;
    for d in drivers {
        writer
            .write_record(&[
                d.name.clone(),
                d.team.clone(),
                d.grid_position.to_string(),
                d.qualy_gap_ms.to_string(),
                d.long_run_pace_delta.to_string(),
                d.straightline_index.to_string(),
                d.cornering_index.to_string(),
                d.speed_trap_kph.to_string(),
                d.pit_stop_median.to_string(),
                d.dnf_rate.to_string(),
            ])
            .map_err(|e| SimError::InternalInvariant {
                id: "csv-export-row".to_string(),
                detail: e.to_string(),
            })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SimError::internal("csv-export-flush", e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SimError::internal("csv-export-utf8", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "driver_name,team_name,grid_position,qualy_gap_ms,fp_longrun_pace_s,straightline_index,cornering_index,speed_trap_kph,pit_crew_mean_s,dnf_rate\n\
Max Verstappen,Red Bull,1,0,-0.25,95,97,344,2.2,0.02\n\
Lando Norris,McLaren,2,95,-0.1,91,98,338,2.3,0.03\n";

    #[test]
    fn ingests_required_columns_and_derives_code_and_id() {
        let drivers = ingest_csv_str(SAMPLE).unwrap();
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers[0].id, "max_verstappen");
        assert_eq!(drivers[0].code, "VER");
        assert_eq!(drivers[0].team, "Red Bull");
        assert_eq!(drivers[0].wet_skill, DEFAULT_WET_SKILL);
    }

    #[test]
    fn missing_header_is_rejected() {
        let bad = "driver_name,team\nMax,Red Bull\n";
        let result = ingest_csv_str(bad);
        assert!(matches!(result, Err(SimError::InputValidation(_))));
    }

    #[test]
    fn empty_driver_name_is_rejected() {
        let bad = "driver_name,team_name,grid_position,qualy_gap_ms,fp_longrun_pace_s,straightline_index,cornering_index,speed_trap_kph,pit_crew_mean_s,dnf_rate\n\
,Red Bull,1,0,0,90,90,330,2.3,0.02\n";
        let result = ingest_csv_str(bad);
        assert!(matches!(result, Err(SimError::InputValidation(_))));
    }

    #[test]
    fn malformed_numeric_falls_back_to_zero() {
        let csv_text = "driver_name,team_name,grid_position,qualy_gap_ms,fp_longrun_pace_s,straightline_index,cornering_index,speed_trap_kph,pit_crew_mean_s,dnf_rate\n\
Max,Red Bull,oops,0,0,90,90,330,2.3,0.02\n";
        let drivers = ingest_csv_str(csv_text).unwrap();
        assert_eq!(drivers[0].grid_position, 1);
    }

    #[test]
    fn export_round_trips_required_columns() {
        let drivers = ingest_csv_str(SAMPLE).unwrap();
        let csv_text = export_csv(&drivers).unwrap();
        let reimported = ingest_csv_str(&csv_text).unwrap();
        assert_eq!(drivers.len(), reimported.len());
        assert_eq!(drivers[0].name, reimported[0].name);
        assert_eq!(drivers[0].grid_position, reimported[0].grid_position);
    }
}
