/*!
# Mailman

Spreadsheet-driven mail merge, built in Rust.

## Overview

A merge template is an email whose fields contain placeholder tags. Each data row
of a spreadsheet supplies the values for one email: the header row names the
fields and the data row fills them in. Rendering is done with Handlebars after a
small pre-processing step that accepts the tag forms rich text editors produce.

## Tag syntax

- `<<Field Name>>` and its HTML-escaped form `&lt;&lt;Field Name&gt;&gt;` become
  `{{[Field Name]}}`, so header names can contain spaces and punctuation.
- `{{ expr }}` is trimmed and has `&nbsp;`, `%20`, `&amp;`, `&lt;` and `&gt;` undone
  inside the tag.
- Every context carries `_meta.url`, the address of the source spreadsheet.

## Modules

- **cell**: typed cell values
- **spreadsheet**: in-memory documents and sheets, and the `SheetSource` seam
- **loader**: CSV import
- **context**: binds a header row and a data row into a render context
- **render**: tag pre-processing and the `RenderEngine`
- **helpers**: Handlebars helpers installed into every engine
- **merge_template**: saved merges and per-row email rendering
- **mailer**: SMTP delivery (`smtp` feature)
- **config**: JSON configuration

## Usage

```
use mailman::render::{RenderEngine, RenderOptions};
use mailman::spreadsheet::{Sheet, Spreadsheet};

let mut doc = Spreadsheet::new("Roster", "https://example.com/roster");
doc.add_sheet(Sheet::from_rows(
    "People",
    vec![vec!["Name".into()], vec!["World".into()]],
));

let engine = RenderEngine::new();
let options = RenderOptions {
    data_row_index: Some(2),
    ..Default::default()
};
assert_eq!(engine.render("Hello <<Name>>", &options, &doc).unwrap(), "Hello World");
```
*/

pub mod cell;
pub mod config;
pub mod context;
pub mod error;
pub mod helpers;
pub mod loader;
#[cfg(feature = "smtp")]
pub mod mailer;
pub mod merge_template;
pub mod render;
pub mod spreadsheet;

pub use cell::*;
pub use context::{Context, ContextRequest, build_context};
pub use error::{MailmanError, ResolveError, Result};
pub use merge_template::{EmailTemplate, MergeTemplate, RenderedEmail};
pub use render::{RenderConfig, RenderEngine, RenderOptions};
pub use spreadsheet::{Sheet, SheetSource, Spreadsheet, Workspace};
