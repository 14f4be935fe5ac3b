//! CSV roster ingestion
//!
//! Two input layouts are accepted:
//!
//! - **WAEC**: metadata rows (`SCHOOL NAME`, `SCHOOL CODE`, `NAME OF PRINCIPAL`)
//!   followed by a `#` marker row, then fixed-position candidate rows.
//! - **Generic**: a header row of column names, then one record per line.
//!   The school identity is a fixed placeholder for this layout.
//!
//! Layout detection looks for "SCHOOL NAME" (any case) in the first 10 lines.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::remark::normalize_remark;
use crate::roster::{CandidateRecord, UploadBatch, REMARK_FIELD};

/// Lines scanned for the WAEC marker
const DETECTION_WINDOW: usize = 10;

const WAEC_MARKER: &str = "SCHOOL NAME";

/// Placeholder identity applied to generic uploads
pub const PLACEHOLDER_SCHOOL_NAME: &str = "CLIMAX SECONDARY SCHOOL";
pub const PLACEHOLDER_SCHOOL_CODE: &str = "C24084";
pub const PLACEHOLDER_PRINCIPAL: &str = "Tolani Ogunbamiji";

/// Fixed WAEC data-row layout: (field name, column index).
///
/// Column 0 holds the serial number and is not kept.
pub const WAEC_LAYOUT: &[(&str, usize)] = &[
    ("passport", 1),
    ("lin", 2),
    ("lastname", 3),
    ("firstname", 4),
    ("othername", 5),
    ("sex", 6),
    ("year_2026", 7),
    ("year_2025", 8),
    ("year_2024", 9),
    (REMARK_FIELD, 10),
];

/// Minimum cell count of a WAEC data row
pub fn waec_row_width() -> usize {
    WAEC_LAYOUT.iter().map(|(_, col)| col + 1).max().unwrap_or(0)
}

/// Ingestion failures. All of them are the uploader's fault.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("upload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row at line {line} has {columns} columns, expected at least {expected}")]
    MalformedRow {
        line: u64,
        columns: usize,
        expected: usize,
    },
}

/// Which input layout was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterLayout {
    Waec,
    Generic,
}

impl std::fmt::Display for RosterLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterLayout::Waec => write!(f, "waec"),
            RosterLayout::Generic => write!(f, "generic"),
        }
    }
}

/// Result of parsing one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedRoster {
    pub layout: RosterLayout,
    pub school_name: String,
    pub school_code: String,
    pub principal: String,
    pub records: Vec<CandidateRecord>,
}

impl IngestedRoster {
    pub fn into_batch(self) -> UploadBatch {
        UploadBatch {
            school_name: self.school_name,
            school_code: self.school_code,
            principal: self.principal,
            rows: self.records,
        }
    }
}

/// Decode raw upload bytes as UTF-8 and ingest them.
///
/// A leading byte-order mark is dropped.
pub fn ingest_bytes(bytes: &[u8]) -> Result<IngestedRoster, IngestError> {
    let text = std::str::from_utf8(bytes)?;
    ingest(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Ingest decoded CSV text
pub fn ingest(text: &str) -> Result<IngestedRoster, IngestError> {
    let layout = detect_layout(text);
    debug!(%layout, "Detected roster layout");

    match layout {
        RosterLayout::Waec => ingest_waec(text),
        RosterLayout::Generic => ingest_generic(text),
    }
}

/// Lines split on `\r\n`, `\n` or a bare `\r`
fn detection_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

/// WAEC when any of the first 10 lines mentions "SCHOOL NAME"
pub fn detect_layout(text: &str) -> RosterLayout {
    let is_waec = detection_lines(text)
        .take(DETECTION_WINDOW)
        .any(|line| line.to_uppercase().contains(WAEC_MARKER));

    if is_waec {
        RosterLayout::Waec
    } else {
        RosterLayout::Generic
    }
}

fn is_blank(row: &csv::StringRecord) -> bool {
    row.is_empty() || (row.len() == 1 && row[0].is_empty())
}

fn second_cell(row: &csv::StringRecord) -> String {
    row.get(1).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn ingest_waec(text: &str) -> Result<IngestedRoster, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let expected = waec_row_width();
    let mut roster = IngestedRoster {
        layout: RosterLayout::Waec,
        school_name: String::new(),
        school_code: String::new(),
        principal: String::new(),
        records: Vec::new(),
    };
    let mut header_found = false;

    for result in reader.records() {
        let row = result?;
        if is_blank(&row) {
            continue;
        }

        let first = row[0].trim();
        match first.to_uppercase().as_str() {
            "SCHOOL NAME" => {
                roster.school_name = second_cell(&row);
                continue;
            }
            "SCHOOL CODE" => {
                roster.school_code = second_cell(&row);
                continue;
            }
            "NAME OF PRINCIPAL" => {
                roster.principal = second_cell(&row);
                continue;
            }
            _ => {}
        }

        if first == "#" {
            header_found = true;
            continue;
        }

        if !header_found {
            continue;
        }

        if row.len() < expected {
            return Err(IngestError::MalformedRow {
                line: row.position().map(|p| p.line()).unwrap_or(0),
                columns: row.len(),
                expected,
            });
        }

        let record = WAEC_LAYOUT
            .iter()
            .map(|&(name, col)| {
                let value = if name == REMARK_FIELD {
                    normalize_remark(&row[col])
                } else {
                    row[col].to_string()
                };
                (name, value)
            })
            .collect();
        roster.records.push(record);
    }

    Ok(roster)
}

fn ingest_generic(text: &str) -> Result<IngestedRoster, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for result in reader.records() {
        let row = result?;
        if is_blank(&row) {
            continue;
        }

        let mut record: CandidateRecord = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name, row.get(i).unwrap_or("")))
            .collect();
        let remark = normalize_remark(record.remark());
        record.insert(REMARK_FIELD, remark);
        records.push(record);
    }

    Ok(IngestedRoster {
        layout: RosterLayout::Generic,
        school_name: PLACEHOLDER_SCHOOL_NAME.to_string(),
        school_code: PLACEHOLDER_SCHOOL_CODE.to_string(),
        principal: PLACEHOLDER_PRINCIPAL.to_string(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAEC_SAMPLE: &str = "\
WEST AFRICAN EXAMINATIONS COUNCIL,,,,,,,,,,
SCHOOL NAME,Acme High
SCHOOL CODE,C999
NAME OF PRINCIPAL,Jane Doe

#,PASSPORT,LIN,SURNAME,FIRST NAME,OTHER NAME,SEX,2026,2025,2024,REMARK
1,P001,L001,Okafor,Ada,Ngozi,F,A1,B2,C4, Recomended
";

    #[test]
    fn test_detects_waec_case_insensitively() {
        assert_eq!(detect_layout("x\nschool name,Foo\n"), RosterLayout::Waec);
        assert_eq!(detect_layout("name,remark\nA,ok\n"), RosterLayout::Generic);
    }

    #[test]
    fn test_detection_window_is_ten_lines() {
        let mut text = "a,b\n".repeat(10);
        text.push_str("SCHOOL NAME,Late\n");
        assert_eq!(detect_layout(&text), RosterLayout::Generic);
    }

    #[test]
    fn test_detection_window_counts_bare_cr_lines() {
        let mut text = "a,b\r".repeat(11);
        text.push_str("SCHOOL NAME,Late\r");
        assert_eq!(detect_layout(&text), RosterLayout::Generic);

        let mut text = "a,b\r\n".repeat(9);
        text.push_str("SCHOOL NAME,Acme\r\n");
        assert_eq!(detect_layout(&text), RosterLayout::Waec);

        assert_eq!(detect_layout("a,b\rschool name,Acme\r"), RosterLayout::Waec);
    }

    #[test]
    fn test_waec_sample() {
        let roster = ingest(WAEC_SAMPLE).unwrap();
        assert_eq!(roster.layout, RosterLayout::Waec);
        assert_eq!(roster.school_name, "Acme High");
        assert_eq!(roster.school_code, "C999");
        assert_eq!(roster.principal, "Jane Doe");
        assert_eq!(roster.records.len(), 1);

        let r = &roster.records[0];
        let names: Vec<&str> = r.names().collect();
        let expected_names: Vec<&str> = WAEC_LAYOUT.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, expected_names);
        assert_eq!(r.get("passport"), Some("P001"));
        assert_eq!(r.get("lin"), Some("L001"));
        assert_eq!(r.get("lastname"), Some("Okafor"));
        assert_eq!(r.get("firstname"), Some("Ada"));
        assert_eq!(r.get("othername"), Some("Ngozi"));
        assert_eq!(r.get("sex"), Some("F"));
        assert_eq!(r.get("year_2026"), Some("A1"));
        assert_eq!(r.get("year_2025"), Some("B2"));
        assert_eq!(r.get("year_2024"), Some("C4"));
        assert_eq!(r.remark(), "recommended");
    }

    #[test]
    fn test_waec_ignores_rows_before_marker() {
        let text = "\
SCHOOL NAME,Acme High
1,P000,L000,Early,Row,,M,A1,A1,A1,recommended
#
2,P001,L001,Late,Row,,F,A1,A1,A1,recommended
";
        let roster = ingest(text).unwrap();
        assert_eq!(roster.records.len(), 1);
        assert_eq!(roster.records[0].get("passport"), Some("P001"));
        assert_eq!(roster.school_code, "");
    }

    #[test]
    fn test_waec_short_row_is_malformed() {
        let text = "SCHOOL NAME,Acme\n#\n1,P001,L001\n";
        match ingest(text) {
            Err(IngestError::MalformedRow { line, columns, expected }) => {
                assert_eq!(line, 3);
                assert_eq!(columns, 3);
                assert_eq!(expected, 11);
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_waec_header_without_value() {
        let roster = ingest("SCHOOL NAME\n#\n").unwrap();
        assert_eq!(roster.school_name, "");
        assert!(roster.records.is_empty());
    }

    #[test]
    fn test_generic_uses_placeholder_identity() {
        let roster = ingest("name,remark\nAda, NOT RECOMENDED\n").unwrap();
        assert_eq!(roster.layout, RosterLayout::Generic);
        assert_eq!(roster.school_name, PLACEHOLDER_SCHOOL_NAME);
        assert_eq!(roster.school_code, PLACEHOLDER_SCHOOL_CODE);
        assert_eq!(roster.principal, PLACEHOLDER_PRINCIPAL);
        assert_eq!(roster.records.len(), 1);
        assert_eq!(roster.records[0].get("name"), Some("Ada"));
        assert_eq!(roster.records[0].remark(), "not recommended");
    }

    #[test]
    fn test_generic_without_remark_column_gains_empty_remark() {
        let roster = ingest("name,sex\nAda,F\nBola\n").unwrap();
        assert_eq!(roster.records.len(), 2);
        let names: Vec<&str> = roster.records[0].names().collect();
        assert_eq!(names, vec!["name", "sex", "remark"]);
        assert_eq!(roster.records[0].remark(), "");
        assert_eq!(roster.records[1].get("sex"), Some(""));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = ingest_bytes(&[0x66, 0xff, 0xfe, 0x0a]).unwrap_err();
        assert!(matches!(err, IngestError::Encoding(_)));
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice(WAEC_SAMPLE.as_bytes());
        let roster = ingest_bytes(&bytes).unwrap();
        assert_eq!(roster.school_name, "Acme High");
    }

    #[test]
    fn test_layout_width() {
        assert_eq!(waec_row_width(), 11);
    }
}
