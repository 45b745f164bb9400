use crate::cell::CellValue;
use crate::error::{MailmanError, Result};
use crate::spreadsheet::{Sheet, Spreadsheet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load a sheet from a CSV file
///
/// The sheet is named after the file stem, so `people.csv` becomes the sheet
/// `people`. Fields are typed with [`CellValue::parse`].
///
/// # Examples
/// ```no_run
/// use mailman::loader::from_csv;
///
/// match from_csv("people.csv") {
///     Ok(sheet) => println!("Loaded {} rows", sheet.last_row()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Sheet> {
    let path = filepath.as_ref();
    let load_err = |reason: String| MailmanError::Load {
        path: path.display().to_string(),
        reason,
    };

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());
    match extension.as_deref() {
        Some("csv") => {}
        Some(ext) => return Err(load_err(format!("unsupported file extension: {}", ext))),
        None => return Err(load_err("file has no extension".to_string())),
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1");
    let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
    let sheet = read_sheet(name, file).map_err(|e| load_err(e.to_string()))?;

    if sheet.last_row() == 0 {
        return Err(load_err("CSV file is empty".to_string()));
    }
    Ok(sheet)
}

/// Build a sheet from CSV text already in memory.
pub fn parse_csv(name: &str, text: &str) -> Result<Sheet> {
    read_sheet(name, text.as_bytes()).map_err(|e| MailmanError::Load {
        path: name.to_string(),
        reason: e.to_string(),
    })
}

/// Build a document from one or more CSV files, one sheet per file.
///
/// The first file's sheet is active and the document URL points at it.
pub fn load_document(name: &str, paths: &[impl AsRef<Path>]) -> Result<Spreadsheet> {
    let first = paths.first().ok_or_else(|| MailmanError::Load {
        path: name.to_string(),
        reason: "no data files given".to_string(),
    })?;
    let url = match first.as_ref().canonicalize() {
        Ok(p) => format!("file://{}", p.display()),
        Err(_) => format!("file://{}", first.as_ref().display()),
    };

    let mut document = Spreadsheet::new(name, &url);
    for path in paths {
        let sheet = from_csv(path)?;
        log::debug!("loaded sheet {} with {} rows", sheet.name, sheet.last_row());
        document.add_sheet(sheet);
    }
    Ok(document)
}

// Records, not lines: quoted fields may span line breaks
fn read_sheet<R: Read>(name: &str, input: R) -> std::result::Result<Sheet, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::parse).collect());
    }
    Ok(Sheet::from_rows(name, rows))
}
