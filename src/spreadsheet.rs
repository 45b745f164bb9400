use crate::cell::CellValue;
use crate::error::ResolveError;
use serde::{Deserialize, Serialize};

/// A single tab of a spreadsheet document.
///
/// Rows and columns are 1-based, matching A1 notation. Rows may be ragged; a row
/// only holds the cells that were written to it.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
    pub active_cell: (u32, u32),
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            rows: Vec::new(),
            active_cell: (1, 1),
        }
    }

    pub fn from_rows(name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        Sheet {
            name: name.to_string(),
            rows,
            active_cell: (1, 1),
        }
    }

    pub fn last_row(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn last_column(&self) -> u32 {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32
    }

    pub fn get_value(&self, row: u32, col: u32) -> Option<&CellValue> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows
            .get((row - 1) as usize)
            .and_then(|r| r.get((col - 1) as usize))
    }

    /// Write a value, growing the grid as needed. Zero indices are ignored.
    pub fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        if row == 0 || col == 0 {
            return;
        }
        let (r, c) = ((row - 1) as usize, (col - 1) as usize);
        if self.rows.len() <= r {
            self.rows.resize_with(r + 1, Vec::new);
        }
        let cells = &mut self.rows[r];
        if cells.len() <= c {
            cells.resize(c + 1, CellValue::Empty);
        }
        cells[c] = value;
    }

    /// Read a rectangular block starting at `(row, col)`.
    ///
    /// The result always has `num_rows` rows. Each row holds at most `num_cols`
    /// values and stops at the last cell that exists in the sheet, so rows past
    /// the end come back empty.
    pub fn get_sheet_values(
        &self,
        row: u32,
        col: u32,
        num_rows: u32,
        num_cols: u32,
    ) -> Vec<Vec<CellValue>> {
        let mut values = Vec::with_capacity(num_rows as usize);
        for r in row..row.saturating_add(num_rows) {
            let cells = match r.checked_sub(1).and_then(|i| self.rows.get(i as usize)) {
                Some(cells) if col >= 1 => cells
                    .iter()
                    .skip((col - 1) as usize)
                    .take(num_cols as usize)
                    .cloned()
                    .collect(),
                _ => Vec::new(),
            };
            values.push(cells);
        }
        values
    }

    pub fn active_cell(&self) -> (u32, u32) {
        self.active_cell
    }

    pub fn set_active_cell(&mut self, row: u32, col: u32) {
        self.active_cell = (row.max(1), col.max(1));
    }

    /// Select a cell by its A1 name. Returns false if the name does not parse.
    pub fn activate(&mut self, cell_name: &str) -> bool {
        match parse_cell_name(cell_name) {
            Some((row, col)) => {
                self.set_active_cell(row, col);
                true
            }
            None => false,
        }
    }
}

/// A spreadsheet document: a named, addressable collection of sheets.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Spreadsheet {
    pub name: String,
    pub url: String,
    pub sheets: Vec<Sheet>,
    pub active_sheet: usize,
}

impl Spreadsheet {
    pub fn new(name: &str, url: &str) -> Self {
        Spreadsheet {
            name: name.to_string(),
            url: url.to_string(),
            sheets: Vec::new(),
            active_sheet: 0,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet_by_name(&self, name: &str) -> Result<&Sheet, ResolveError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ResolveError::SheetNotFound(name.to_string()))
    }

    pub fn active_sheet(&self) -> Result<&Sheet, ResolveError> {
        self.sheets
            .get(self.active_sheet)
            .ok_or_else(|| ResolveError::NoActiveSheet(self.name.clone()))
    }

    pub fn active_sheet_mut(&mut self) -> Result<&mut Sheet, ResolveError> {
        let name = self.name.clone();
        self.sheets
            .get_mut(self.active_sheet)
            .ok_or(ResolveError::NoActiveSheet(name))
    }

    pub fn set_active_sheet(&mut self, name: &str) -> Result<(), ResolveError> {
        let index = self
            .sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ResolveError::SheetNotFound(name.to_string()))?;
        self.active_sheet = index;
        Ok(())
    }
}

/// Access to spreadsheet documents, as seen by the context builder.
pub trait SheetSource {
    fn active_document(&self) -> Result<&Spreadsheet, ResolveError>;

    fn document_by_name(&self, name: &str) -> Result<&Spreadsheet, ResolveError>;
}

impl SheetSource for Spreadsheet {
    fn active_document(&self) -> Result<&Spreadsheet, ResolveError> {
        Ok(self)
    }

    fn document_by_name(&self, name: &str) -> Result<&Spreadsheet, ResolveError> {
        if self.name == name {
            Ok(self)
        } else {
            Err(ResolveError::DocumentNotFound(name.to_string()))
        }
    }
}

/// Every document open in one session, one of which is active.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    documents: Vec<Spreadsheet>,
    active: Option<usize>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. The first document added becomes active.
    pub fn open(&mut self, document: Spreadsheet) {
        self.documents.push(document);
        if self.active.is_none() {
            self.active = Some(0);
        }
    }

    pub fn activate(&mut self, name: &str) -> Result<(), ResolveError> {
        let index = self
            .documents
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| ResolveError::DocumentNotFound(name.to_string()))?;
        self.active = Some(index);
        Ok(())
    }

    pub fn active_document_mut(&mut self) -> Result<&mut Spreadsheet, ResolveError> {
        let index = self.active.ok_or(ResolveError::NoActiveDocument)?;
        self.documents
            .get_mut(index)
            .ok_or(ResolveError::NoActiveDocument)
    }
}

impl SheetSource for Workspace {
    fn active_document(&self) -> Result<&Spreadsheet, ResolveError> {
        self.active
            .and_then(|i| self.documents.get(i))
            .ok_or(ResolveError::NoActiveDocument)
    }

    fn document_by_name(&self, name: &str) -> Result<&Spreadsheet, ResolveError> {
        self.documents
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ResolveError::DocumentNotFound(name.to_string()))
    }
}

pub fn col_to_letter(col: u32) -> String {
    let mut col = col;
    let mut result = String::new();
    while col > 0 {
        col -= 1;
        result.push(((col % 26) as u8 + b'A') as char);
        col /= 26;
    }
    result.chars().rev().collect()
}

pub fn letter_to_col(letters: &str) -> u32 {
    letters.chars().fold(0, |acc, c| {
        acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
    })
}

pub fn get_cell_name(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), row)
}

/// Parse an A1-style cell name into a 1-based `(row, col)` pair.
pub fn parse_cell_name(cell_name: &str) -> Option<(u32, u32)> {
    let mut letters = String::new();
    let mut digits = String::new();
    let mut found_digit = false;

    for c in cell_name.trim().chars() {
        if c.is_ascii_alphabetic() {
            if found_digit {
                return None;
            }
            letters.push(c);
        } else if c.is_ascii_digit() {
            found_digit = true;
            digits.push(c);
        } else {
            return None;
        }
    }

    if letters.is_empty() || digits.is_empty() || letters.len() > 3 {
        return None;
    }

    let col = letter_to_col(&letters);
    let row = digits.parse::<u32>().ok()?;
    if row == 0 {
        return None;
    }
    Some((row, col))
}
