//! Spreadsheet (.xlsx) extraction.
//!
//! Sheets are read in workbook order and materialized as rectangular grids
//! spanning the last row and column that hold a value.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::ooxml::{attribute, element_name, local_name, prefixed_attribute, OoxmlPackage};
use super::{ExtractionError, FormatExtractor};
use crate::models::{DocumentKind, DocumentMetadata, ExtractedDocument, ExtractionDetail, SheetInfo};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Sheet limits of the xlsx format.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Largest grid materialized for one sheet.
const MAX_GRID_CELLS: usize = 4_000_000;

/// Extracts worksheets from an xlsx package.
pub struct SpreadsheetExtractor;

impl FormatExtractor for SpreadsheetExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Spreadsheet
    }

    fn extract(
        &self,
        path: &Path,
        detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let kind = DocumentKind::Spreadsheet;
        let mut package = OoxmlPackage::open(path, kind)?;

        let workbook = package.read_part(WORKBOOK_PART)?;
        let sheet_refs = parse_workbook(&workbook).map_err(|e| part_error(WORKBOOK_PART, e))?;
        let rels = package.relationships(WORKBOOK_PART)?;

        let shared = match package.read_optional_part(SHARED_STRINGS_PART)? {
            Some(xml) => {
                parse_shared_strings(&xml).map_err(|e| part_error(SHARED_STRINGS_PART, e))?
            }
            None => Vec::new(),
        };

        let mut sheets = Vec::with_capacity(sheet_refs.len());
        let mut texts = Vec::with_capacity(sheet_refs.len());
        for sheet in sheet_refs {
            let part = rels.get(&sheet.rel_id).ok_or_else(|| {
                ExtractionError::corrupt(
                    kind,
                    format!("sheet '{}' has no relationship {}", sheet.name, sheet.rel_id),
                )
            })?;
            let xml = package.read_part(part)?;
            let cells = parse_worksheet(&xml, &shared).map_err(|e| part_error(part, e))?;
            let grid = build_grid(cells).map_err(|e| part_error(part, e))?;

            tracing::debug!(
                "Sheet '{}': {} rows x {} columns",
                sheet.name,
                grid.len(),
                grid.first().map_or(0, Vec::len)
            );

            texts.push(
                grid.iter()
                    .map(|row| row.join("\t"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
            sheets.push(SheetInfo {
                name: sheet.name,
                rows: grid.len(),
                columns: grid.first().map_or(0, Vec::len),
                cells: match detail {
                    ExtractionDetail::Full => Some(grid),
                    ExtractionDetail::Summary => None,
                },
            });
        }

        Ok(ExtractedDocument::new(
            texts.join("\n\n"),
            DocumentMetadata::Spreadsheet { sheets },
        ))
    }
}

fn part_error(part: &str, reason: String) -> ExtractionError {
    ExtractionError::corrupt(DocumentKind::Spreadsheet, format!("{}: {}", part, reason))
}

#[derive(Debug, PartialEq)]
struct SheetRef {
    name: String,
    rel_id: String,
}

/// Sheet names and relationship ids in workbook order.
fn parse_workbook(xml: &[u8]) -> Result<Vec<SheetRef>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut sheets = Vec::new();
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) | Event::Empty(e) if element_name(&e) == b"sheet" => {
                let name = attribute(&e, b"name").ok_or("sheet without a name")?;
                let rel_id = prefixed_attribute(&e, b"id")
                    .ok_or_else(|| format!("sheet '{}' without r:id", name))?;
                sheets.push(SheetRef { name, rel_id });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

/// Shared string table. Rich-text runs are concatenated; phonetic
/// (`rPh`) runs are skipped.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match element_name(&e) {
                b"si" => current = Some(String::new()),
                b"rPh" => phonetic_depth += 1,
                b"t" => in_t = true,
                _ => {}
            },
            Event::Empty(e) if element_name(&e) == b"si" => strings.push(String::new()),
            Event::Text(e) => {
                if let (true, 0, Some(s)) = (in_t, phonetic_depth, current.as_mut()) {
                    s.push_str(&e.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::End(e) => match local_name(e.name().into_inner()) {
                b"si" => strings.extend(current.take()),
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_t = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

/// A cell being read from `<c>`.
#[derive(Default)]
struct PendingCell {
    row: usize,
    col: usize,
    cell_type: Option<String>,
    value: Option<String>,
    inline: Option<String>,
}

/// Non-empty cells as `(row, column, value)`, both 1-based.
fn parse_worksheet(xml: &[u8], shared: &[String]) -> Result<Vec<(usize, usize, String)>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut cells = Vec::new();

    let mut row = 0usize;
    let mut col = 0usize;
    let mut cell: Option<PendingCell> = None;
    let mut in_v = false;
    let mut in_inline_t = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match element_name(&e) {
                b"row" => {
                    row = next_row(&e, row)?;
                    col = 0;
                }
                b"c" => {
                    let pending = start_cell(&e, row, col)?;
                    col = pending.col;
                    cell = Some(pending);
                }
                b"v" => in_v = true,
                b"is" => {
                    if let Some(c) = cell.as_mut() {
                        c.inline = Some(String::new());
                    }
                }
                b"rPh" => phonetic_depth += 1,
                b"t" => in_inline_t = true,
                _ => {}
            },
            Event::Empty(e) => match element_name(&e) {
                b"row" => {
                    row = next_row(&e, row)?;
                    col = 0;
                }
                // Styled but empty cell: still advances the column.
                b"c" => col = start_cell(&e, row, col)?.col,
                _ => {}
            },
            Event::Text(e) => {
                if let Some(c) = cell.as_mut() {
                    let text = e.unescape().map_err(|e| e.to_string())?;
                    if in_v {
                        c.value.get_or_insert_with(String::new).push_str(&text);
                    } else if in_inline_t && phonetic_depth == 0 {
                        if let Some(inline) = c.inline.as_mut() {
                            inline.push_str(&text);
                        }
                    }
                }
            }
            Event::End(e) => match local_name(e.name().into_inner()) {
                b"c" => {
                    if let Some(c) = cell.take() {
                        let value = cell_value(&c, shared)?;
                        if !value.is_empty() {
                            cells.push((c.row, c.col, value));
                        }
                    }
                }
                b"v" => in_v = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_inline_t = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(cells)
}

fn next_row(e: &BytesStart<'_>, previous: usize) -> Result<usize, String> {
    let row = match attribute(e, b"r") {
        Some(r) => r
            .trim()
            .parse()
            .map_err(|_| format!("invalid row number '{}'", r))?,
        None => previous + 1,
    };
    check_row(row)
}

fn start_cell(
    e: &BytesStart<'_>,
    row: usize,
    previous_col: usize,
) -> Result<PendingCell, String> {
    let position = match attribute(e, b"r") {
        Some(r) => parse_cell_ref(&r)?,
        None => None,
    };
    let (row, col) = position.unwrap_or((row, previous_col + 1));
    if col > MAX_COLUMNS {
        return Err(format!("column {} beyond the sheet limit of {}", col, MAX_COLUMNS));
    }
    Ok(PendingCell {
        row: check_row(row)?,
        col,
        cell_type: attribute(e, b"t"),
        ..Default::default()
    })
}

fn check_row(row: usize) -> Result<usize, String> {
    if row > MAX_ROWS {
        return Err(format!("row {} beyond the sheet limit of {}", row, MAX_ROWS));
    }
    Ok(row)
}

fn cell_value(cell: &PendingCell, shared: &[String]) -> Result<String, String> {
    let raw = cell.value.as_deref().unwrap_or("");
    match cell.cell_type.as_deref() {
        Some("s") => {
            if raw.is_empty() {
                return Ok(String::new());
            }
            let idx: usize = raw
                .trim()
                .parse()
                .map_err(|_| format!("invalid shared string index '{}'", raw))?;
            shared
                .get(idx)
                .cloned()
                .ok_or_else(|| format!("shared string index {} out of range", idx))
        }
        Some("b") => Ok(match raw.trim() {
            "" => String::new(),
            "1" | "true" => "True".to_string(),
            _ => "False".to_string(),
        }),
        Some("inlineStr") => Ok(cell.inline.clone().unwrap_or_default()),
        _ => Ok(raw.to_string()),
    }
}

/// Parse an A1-style reference into 1-based `(row, column)`.
///
/// `Ok(None)` when the text is not an A1 reference at all; an error when it
/// is one but lies outside the sheet limits.
fn parse_cell_ref(reference: &str) -> Result<Option<(usize, usize)>, String> {
    let Some(split) = reference.find(|c: char| c.is_ascii_digit()) else {
        return Ok(None);
    };
    let (letters, digits) = reference.split_at(split);
    let letters = letters.trim_start_matches('$').trim_end_matches('$');
    if letters.is_empty()
        || !letters.chars().all(|c| c.is_ascii_alphabetic())
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Ok(None);
    }
    let out_of_range = || format!("cell reference '{}' beyond the sheet limits", reference);

    let mut col = 0usize;
    for c in letters.bytes() {
        col = col
            .checked_mul(26)
            .and_then(|acc| acc.checked_add((c.to_ascii_uppercase() - b'A') as usize + 1))
            .filter(|col| *col <= MAX_COLUMNS)
            .ok_or_else(out_of_range)?;
    }
    let row: usize = digits.parse().map_err(|_| out_of_range())?;
    if row == 0 {
        return Ok(None);
    }
    if row > MAX_ROWS {
        return Err(out_of_range());
    }
    Ok(Some((row, col)))
}

/// Rectangular grid from sparse cells; missing cells are empty strings.
///
/// Sheets whose bounding box exceeds [`MAX_GRID_CELLS`] are rejected.
fn build_grid(cells: Vec<(usize, usize, String)>) -> Result<Vec<Vec<String>>, String> {
    let rows = cells.iter().map(|(r, _, _)| *r).max().unwrap_or(0);
    let cols = cells.iter().map(|(_, c, _)| *c).max().unwrap_or(0);
    match rows.checked_mul(cols) {
        Some(total) if total <= MAX_GRID_CELLS => {}
        _ => {
            return Err(format!(
                "sheet spans {} rows x {} columns, more than {} cells",
                rows, cols, MAX_GRID_CELLS
            ))
        }
    }
    let mut grid = vec![vec![String::new(); cols]; rows];
    for (r, c, value) in cells {
        if r > 0 && c > 0 {
            grid[r - 1][c - 1] = value;
        }
    }
    Ok(grid)
}
