use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::io::Read;

/// Columns every inspection export must carry.
const REQUIRED_COLUMNS: &[&str] = &[
    "property_id",
    "raw_trade_label",
    "finding_code",
    "severity",
    "description",
    "inspected_at",
];

const OPTIONAL_COLUMNS: &[&str] = &["jurisdiction"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read inspection export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid inspection CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("inspection CSV is missing the '{0}' column (is the header row present?)")]
    MissingHeader(&'static str),
    #[error("inspection CSV declares the '{0}' column more than once")]
    DuplicateHeader(String),
}

/// One CSV row with blank cells collapsed to `None`; validation happens in the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawInspectionRow {
    #[serde(skip)]
    pub line: u64,
    /// Set when the row could not be decoded at all; the cells are then best effort.
    #[serde(skip)]
    pub malformed: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub property_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub raw_trade_label: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub finding_code: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub inspected_at: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub jurisdiction: Option<String>,
}

/// Read every data row. Only header problems and read failures abort; a row that
/// cannot be decoded comes back flagged as malformed for the normalizer to report.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<RawInspectionRow>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = canonical_headers(csv_reader.headers()?)?;
    let property_column = headers.iter().position(|header| header == "property_id");

    let mut rows = Vec::new();
    for record in csv_reader.byte_records() {
        let record = match record {
            Ok(record) => record,
            Err(error) if error.is_io_error() => return Err(error.into()),
            Err(error) => {
                let line = error.position().map(|position| position.line()).unwrap_or(0);
                rows.push(malformed_row(line, None, error.to_string()));
                continue;
            }
        };
        let line = record.position().map(|position| position.line()).unwrap_or(0);
        rows.push(decode_row(record, &headers, property_column, line));
    }

    Ok(rows)
}

fn decode_row(
    record: csv::ByteRecord,
    headers: &csv::StringRecord,
    property_column: Option<usize>,
    line: u64,
) -> RawInspectionRow {
    let property_id = property_column
        .and_then(|index| record.get(index))
        .map(|cell| String::from_utf8_lossy(cell).trim().to_string())
        .filter(|cell| !cell.is_empty());

    let record = match csv::StringRecord::from_byte_record(record) {
        Ok(record) => record,
        Err(error) => {
            let column = headers
                .get(error.utf8_error().field())
                .unwrap_or("unnamed");
            let detail = format!("column '{column}' is not valid UTF-8");
            return malformed_row(line, property_id, detail);
        }
    };

    let parsed: Result<RawInspectionRow, _> = record.deserialize(Some(headers));
    match parsed {
        Ok(mut row) => {
            row.line = line;
            row
        }
        Err(error) => malformed_row(line, property_id, error.to_string()),
    }
}

fn malformed_row(line: u64, property_id: Option<String>, detail: String) -> RawInspectionRow {
    RawInspectionRow {
        line,
        malformed: Some(detail),
        property_id,
        ..RawInspectionRow::default()
    }
}

/// Rewrites recognized headers to their snake_case names and rejects duplicates
/// or missing required columns.
fn canonical_headers(headers: &csv::StringRecord) -> Result<csv::StringRecord, IngestError> {
    let mut seen = HashSet::new();
    let mut canonical = csv::StringRecord::new();
    for header in headers.iter() {
        let key = header_key(header);
        if !key.is_empty() && !seen.insert(key.clone()) {
            return Err(IngestError::DuplicateHeader(header.to_string()));
        }
        let known = REQUIRED_COLUMNS
            .iter()
            .chain(OPTIONAL_COLUMNS)
            .find(|column| header_key(column) == key);
        canonical.push_field(known.copied().unwrap_or(header));
    }

    for &column in REQUIRED_COLUMNS {
        if !canonical.iter().any(|header| header == column) {
            return Err(IngestError::MissingHeader(column));
        }
    }

    Ok(canonical)
}

/// `property_id`, `propertyId` and `Property ID` all name the same column.
fn header_key(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "property_id,raw_trade_label,finding_code,severity,description,inspected_at\n";

    #[test]
    fn parses_rows_with_line_numbers_and_blank_cells() {
        let csv = format!("{HEADER}P1,Electrical,E-01,Critical,Exposed wiring,2025-03-01\nP1,Plumbing,,Minor,,\n");
        let rows = parse_rows(Cursor::new(csv)).expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].property_id.as_deref(), Some("P1"));
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[1].finding_code, None);
        assert_eq!(rows[1].inspected_at, None);
    }

    #[test]
    fn accepts_camel_case_headers_and_optional_jurisdiction() {
        let csv = "propertyId,rawTradeLabel,findingCode,severity,description,inspectedAt,jurisdiction\nP9,Doors,D-1,Major,Sticks,,VIC\n";
        let rows = parse_rows(Cursor::new(csv)).expect("parse");
        assert_eq!(rows[0].raw_trade_label.as_deref(), Some("Doors"));
        assert_eq!(rows[0].jurisdiction.as_deref(), Some("VIC"));
    }

    #[test]
    fn headerless_file_is_rejected() {
        let csv = "P1,Electrical,E-01,Critical,Exposed wiring,2025-03-01\n";
        let error = parse_rows(Cursor::new(csv)).expect_err("no header");
        assert!(matches!(error, IngestError::MissingHeader("property_id")));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let csv = "property_id,propertyId,raw_trade_label,finding_code,severity,description,inspected_at\n";
        let error = parse_rows(Cursor::new(csv)).expect_err("duplicate");
        match error {
            IngestError::DuplicateHeader(name) => assert_eq!(name, "propertyId"),
            other => panic!("expected duplicate header, got {other:?}"),
        }
    }

    #[test]
    fn headers_match_regardless_of_spelling() {
        let csv = "\u{feff}Property ID,Raw Trade Label,Finding Code,Severity,Description,Inspected At\nLot 3,Doors,D-2,Minor,Scuffed,\n";
        let rows = parse_rows(Cursor::new(csv)).expect("parse");
        assert_eq!(rows[0].property_id.as_deref(), Some("Lot 3"));
        assert_eq!(rows[0].finding_code.as_deref(), Some("D-2"));
        assert_eq!(rows[0].malformed, None);
    }

    #[test]
    fn undecodable_row_is_flagged_and_neighbours_survive() {
        let mut csv = HEADER.as_bytes().to_vec();
        csv.extend_from_slice(b"P1,Electrical,E-01,Minor,Loose plate,2025-03-01\n");
        csv.extend_from_slice(b"P2,Plumbing,P-01,Major,Leak \xff under sink,2025-03-01\n");
        csv.extend_from_slice(b"P3,Doors,D-01,Minor,Sticks,2025-03-01\n");

        let rows = parse_rows(Cursor::new(csv)).expect("bad row does not abort the export");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].malformed, None);
        assert_eq!(rows[2].malformed, None);
        assert_eq!(rows[2].property_id.as_deref(), Some("P3"));

        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[1].property_id.as_deref(), Some("P2"));
        assert_eq!(
            rows[1].malformed.as_deref(),
            Some("column 'description' is not valid UTF-8")
        );
    }

    #[test]
    fn timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2025-03-01T09:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01 09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("01/03/2025 09:30"), Some(expected));
        assert_eq!(
            parse_timestamp("01/03/2025"),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("  "), None);
    }
}
