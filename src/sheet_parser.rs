//! Tabular data loading for CSV text, CSV files and Excel workbooks (.xlsx/.xlsm/.xlsb).

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsb, Xlsx};

use crate::error::{GeneratorError, Result};

/// Source type of the parsed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Csv,
    Excel,
}

/// A fully materialized table: one header row plus data rows.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub source_type: SourceType,
}

/// Read-only view of one data row with named-column access.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl Dataset {
    /// Position of a header, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            headers: &self.headers,
            cells,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> Row<'a> {
    /// Cell at a column position. Empty strings and cells missing from a
    /// short row are absent.
    pub fn cell(&self, index: usize) -> Option<&'a str> {
        self.cells
            .get(index)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Cell by header name.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.headers.iter().position(|h| h == column)?;
        self.cell(index)
    }

    /// Cell at an optional column position; `None` when the column does not exist.
    pub fn cell_opt(&self, index: Option<usize>) -> Option<&'a str> {
        index.and_then(|i| self.cell(i))
    }
}

/// Read a file from disk and parse it by extension.
pub fn load_path(path: &Path) -> Result<Dataset> {
    let data = std::fs::read(path).map_err(|source| GeneratorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path.to_string_lossy();
    parse_file(&filename, &data)
}

/// Dispatch file parsing by extension.
pub fn parse_file(filename: &str, data: &[u8]) -> Result<Dataset> {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => parse_csv(&dataset_name(filename), data),
        "xlsx" | "xlsm" => parse_excel_xlsx(data),
        "xlsb" => parse_excel_xlsb(data),
        _ => Err(GeneratorError::MalformedInput(format!(
            "Unsupported file type: .{}. Supported: .csv, .xlsx, .xlsm, .xlsb",
            ext
        ))),
    }
}

/// Parse raw CSV text whose first line is the header.
pub fn parse_text(name: &str, text: &str) -> Result<Dataset> {
    parse_csv(name, text.as_bytes())
}

fn parse_csv(name: &str, data: &[u8]) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| GeneratorError::MalformedInput(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(GeneratorError::MalformedInput("CSV data has no headers".into()));
    }

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            GeneratorError::MalformedInput(format!("Failed to read CSV record {}: {}", line + 1, e))
        })?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(Dataset {
        name: name.to_string(),
        headers,
        rows,
        source_type: SourceType::Csv,
    })
}

/// File name without directories or the `.csv` suffix.
fn dataset_name(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim_end_matches(".csv")
        .to_string()
}

/// Parse an xlsx/xlsm workbook.
fn parse_excel_xlsx(data: &[u8]) -> Result<Dataset> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
        .map_err(|e| GeneratorError::MalformedInput(format!("Failed to open Excel workbook: {}", e)))?;

    let names = workbook.sheet_names().to_vec();
    let sheets = names.into_iter().map(|name| {
        let range = workbook.worksheet_range(&name);
        (name, range)
    });
    first_sheet_with_headers(sheets)
}

/// Parse an xlsb workbook.
fn parse_excel_xlsb(data: &[u8]) -> Result<Dataset> {
    let mut workbook: Xlsb<_> = open_workbook_from_rs(Cursor::new(data))
        .map_err(|e| GeneratorError::MalformedInput(format!("Failed to open Excel workbook: {}", e)))?;

    let names = workbook.sheet_names().to_vec();
    let sheets = names.into_iter().map(|name| {
        let range = workbook.worksheet_range(&name);
        (name, range)
    });
    first_sheet_with_headers(sheets)
}

/// The first sheet, in workbook order, whose header row is not blank.
/// Unreadable sheets are skipped with a warning.
fn first_sheet_with_headers<E: std::fmt::Display>(
    sheets: impl Iterator<Item = (String, std::result::Result<calamine::Range<Data>, E>)>,
) -> Result<Dataset> {
    for (name, range) in sheets {
        match range {
            Ok(range) => {
                if let Some(dataset) = range_to_dataset(&name, &range) {
                    return Ok(dataset);
                }
                tracing::debug!("Skipping sheet '{}': no header row", name);
            }
            Err(e) => tracing::warn!("Skipping sheet '{}': {}", name, e),
        }
    }

    Err(GeneratorError::MalformedInput(
        "No sheets with headers found in workbook".into(),
    ))
}

/// Convert a calamine Range into a Dataset. First row = headers.
/// A sheet with headers but no data rows is still a valid (empty) dataset.
fn range_to_dataset(name: &str, range: &calamine::Range<Data>) -> Option<Dataset> {
    let mut row_iter = range.rows();

    let header_row = row_iter.next()?;
    let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

    if headers.iter().all(|h| h.is_empty()) {
        return None;
    }

    let rows = row_iter
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|values| !values.iter().all(|v| v.is_empty()))
        .collect();

    Some(Dataset {
        name: name.to_string(),
        headers,
        rows,
        source_type: SourceType::Excel,
    })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Menu ids like "3" come back as floats
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_string(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{:?}", e),
    }
}

/// Render an Excel serial date as `YYYY-MM-DD`, with ` HH:MM:SS` when the
/// serial carries a time of day.
///
/// Serial 25569 is 1970-01-01. Serials below 61 sit before Excel's phantom
/// 1900-02-29 and are shifted one day forward.
fn excel_serial_to_string(serial: f64) -> String {
    let mut days = serial.floor() as i64;
    let secs_of_day = ((serial - serial.floor()) * 86_400.0).round() as i64;
    if days < 61 {
        days += 1;
    }
    let (days, secs_of_day) = if secs_of_day >= 86_400 {
        (days + 1, secs_of_day - 86_400)
    } else {
        (days, secs_of_day)
    };

    let mut remaining = days - 25_569;
    let mut year = 1970i64;
    if remaining >= 0 {
        loop {
            let diy = if is_leap(year) { 366 } else { 365 };
            if remaining < diy {
                break;
            }
            remaining -= diy;
            year += 1;
        }
    } else {
        while remaining < 0 {
            year -= 1;
            remaining += if is_leap(year) { 366 } else { 365 };
        }
    }

    let feb = if is_leap(year) { 29 } else { 28 };
    let mut month = 1;
    for dim in [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31] {
        if remaining < dim {
            break;
        }
        remaining -= dim;
        month += 1;
    }
    let date = format!("{:04}-{:02}-{:02}", year, month, remaining + 1);

    if secs_of_day == 0 {
        date
    } else {
        format!(
            "{} {:02}:{:02}:{:02}",
            date,
            secs_of_day / 3600,
            (secs_of_day % 3600) / 60,
            secs_of_day % 60
        )
    }
}

fn is_leap(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
