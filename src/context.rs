//! Builds the data a template is rendered against from one spreadsheet row.

use crate::cell::CellValue;
use crate::error::ResolveError;
use crate::spreadsheet::{Sheet, SheetSource, Spreadsheet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of columns read from the header and data rows.
pub const MAX_COLUMNS: u32 = 128;

/// Key under which document metadata is stored in every built context.
pub const META_KEY: &str = "_meta";

/// Mapping from header name to cell value for a single render.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every pair whose header is non-empty text and whose value is present.
    pub fn from_pairs(pairs: Vec<(CellValue, CellValue)>, url: &str) -> Self {
        let mut context = Context::new();
        context.0.insert(
            META_KEY.to_string(),
            serde_json::json!({ "url": url }),
        );
        for (header, value) in pairs {
            let key = match header.as_text() {
                Some(k) if !k.is_empty() => k.to_string(),
                _ => continue,
            };
            if value.is_present() {
                context.0.insert(key, value.to_json());
            }
        }
        context
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn meta_url(&self) -> Option<&str> {
        self.0.get(META_KEY)?.get("url")?.as_str()
    }

    /// Number of bound fields, not counting metadata.
    pub fn len(&self) -> usize {
        self.0.keys().filter(|k| k.as_str() != META_KEY).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        Context(map)
    }
}

/// Where to read a context from. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextRequest<'a> {
    pub spreadsheet_name: Option<&'a str>,
    pub sheet_name: Option<&'a str>,
    pub header_row_index: Option<u32>,
    pub data_row_index: Option<u32>,
}

/// Pair header cells with data cells by position, stopping at the shorter row.
pub fn pair_row(headers: Vec<CellValue>, values: Vec<CellValue>) -> Vec<(CellValue, CellValue)> {
    headers.into_iter().zip(values).collect()
}

/// Resolve the sheet and rows named by `request` and bind them into a context.
///
/// Without a sheet name the active sheet of the active document is used. The
/// header row defaults to row 1 and the data row to the active cell's row; a
/// zero index counts as not given.
pub fn build_context<S: SheetSource + ?Sized>(
    source: &S,
    request: &ContextRequest<'_>,
) -> Result<Context, ResolveError> {
    resolve_sheet(source, request)
        .map(|(document, sheet)| context_from_sheet(document, sheet, request))
        .inspect_err(|e| log::error!("failed to build render context: {}", e))
}

fn resolve_sheet<'s, S: SheetSource + ?Sized>(
    source: &'s S,
    request: &ContextRequest<'_>,
) -> Result<(&'s Spreadsheet, &'s Sheet), ResolveError> {
    let document = match request.spreadsheet_name {
        Some(name) => source.document_by_name(name)?,
        None => source.active_document()?,
    };
    let sheet = match request.sheet_name {
        Some(name) => document.sheet_by_name(name)?,
        None => document.active_sheet()?,
    };
    Ok((document, sheet))
}

fn context_from_sheet(document: &Spreadsheet, sheet: &Sheet, request: &ContextRequest<'_>) -> Context {
    let header_row = valid_index(request.header_row_index).unwrap_or(1);
    let data_row = valid_index(request.data_row_index).unwrap_or_else(|| sheet.active_cell().0);

    let headers = first_row(sheet.get_sheet_values(header_row, 1, 1, MAX_COLUMNS));
    let values = first_row(sheet.get_sheet_values(data_row, 1, 1, MAX_COLUMNS));
    log::debug!(
        "binding {}!{} against header row {}",
        sheet.name,
        data_row,
        header_row
    );

    Context::from_pairs(pair_row(headers, values), document.url())
}

fn valid_index(index: Option<u32>) -> Option<u32> {
    index.filter(|i| *i > 0)
}

fn first_row(mut rows: Vec<Vec<CellValue>>) -> Vec<CellValue> {
    if rows.is_empty() {
        Vec::new()
    } else {
        rows.swap_remove(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Spreadsheet {
        let mut doc = Spreadsheet::new("Roster", "https://sheets.example.com/roster");
        let mut sheet = Sheet::from_rows(
            "People",
            vec![
                vec!["Name".into(), "Email".into(), 5.0.into(), "".into(), "Note".into()],
                vec!["Ada".into(), "ada@example.com".into(), "x".into(), "y".into()],
                vec!["Grace".into(), CellValue::Empty, "z".into()],
            ],
        );
        sheet.set_active_cell(3, 1);
        doc.add_sheet(sheet);
        doc
    }

    #[test]
    fn skips_non_text_and_empty_headers() {
        let doc = document();
        let request = ContextRequest {
            data_row_index: Some(2),
            ..Default::default()
        };
        let context = build_context(&doc, &request).unwrap();
        assert_eq!(context.get("Name"), Some(&Value::from("Ada")));
        assert_eq!(context.get("Email"), Some(&Value::from("ada@example.com")));
        // numeric header, empty header, and header beyond the data row are dropped
        assert_eq!(context.len(), 2);
        assert_eq!(context.meta_url(), Some("https://sheets.example.com/roster"));
    }

    #[test]
    fn defaults_to_active_row() {
        let doc = document();
        let context = build_context(&doc, &ContextRequest::default()).unwrap();
        assert_eq!(context.get("Name"), Some(&Value::from("Grace")));
        assert_eq!(context.get("Email"), None);
    }

    #[test]
    fn zero_index_falls_back() {
        let doc = document();
        let request = ContextRequest {
            header_row_index: Some(0),
            data_row_index: Some(0),
            ..Default::default()
        };
        let context = build_context(&doc, &request).unwrap();
        assert_eq!(context.get("Name"), Some(&Value::from("Grace")));
    }

    #[test]
    fn zero_and_false_are_not_bound() {
        let pairs = pair_row(
            vec!["Count".into(), "Flag".into(), "Total".into()],
            vec![0.0.into(), CellValue::Bool(false), 3.0.into()],
        );
        let context = Context::from_pairs(pairs, "");
        assert_eq!(context.get("Count"), None);
        assert_eq!(context.get("Flag"), None);
        assert_eq!(context.get("Total"), Some(&Value::from(3)));
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn pair_row_truncates_to_shorter() {
        let pairs = pair_row(
            vec!["a".into(), "b".into(), "c".into()],
            vec!["1".into()],
        );
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn unknown_sheet_is_an_error() {
        let doc = document();
        let request = ContextRequest {
            sheet_name: Some("Nope"),
            ..Default::default()
        };
        assert_eq!(
            build_context(&doc, &request).unwrap_err(),
            ResolveError::SheetNotFound("Nope".to_string())
        );
    }
}
