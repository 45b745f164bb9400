use crate::context::{Context, ContextRequest, build_context};
use crate::error::Result;
use crate::render::RenderEngine;
use crate::spreadsheet::SheetSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Email parts of a merge template. Every field is itself a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailTemplate {
    pub to: String,
    pub cc: String,
    pub bcc: String,
    pub subject: String,
    pub body: String,
}

/// Column that records when a row was merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimestampColumn {
    pub name: String,
    pub should_prefix_name_with_merge_template_title: bool,
    pub title: String,
}

impl Default for TimestampColumn {
    fn default() -> Self {
        TimestampColumn {
            name: String::new(),
            should_prefix_name_with_merge_template_title: true,
            title: String::new(),
        }
    }
}

/// A saved mail merge: which sheet to read and what to send for each row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub merge_type: String,
    pub created_by: String,
    pub created_date_utc: String,
    pub version: String,
    pub title: String,
    pub sheet_name: String,
    pub header_row_number: u32,
    pub email_template: EmailTemplate,
    pub timestamp_column: TimestampColumn,
    /// Template that must render truthy for a row to be merged. Empty means always.
    pub conditional: String,
    pub repeater: String,
}

/// One fully rendered email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedEmail {
    pub row: u32,
    pub to: String,
    pub cc: String,
    pub bcc: String,
    pub subject: String,
    pub body: String,
}

impl MergeTemplate {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn timestamp_column_title(&self) -> String {
        let column = &self.timestamp_column;
        if column.should_prefix_name_with_merge_template_title && !self.title.is_empty() {
            format!("{} {}", self.title, column.name)
        } else {
            column.name.clone()
        }
    }

    fn header_row(&self) -> u32 {
        self.header_row_number.max(1)
    }

    fn sheet(&self) -> Option<&str> {
        Some(self.sheet_name.as_str()).filter(|s| !s.is_empty())
    }

    fn request(&self, row: u32) -> ContextRequest<'_> {
        ContextRequest {
            spreadsheet_name: None,
            sheet_name: self.sheet(),
            header_row_index: Some(self.header_row()),
            data_row_index: Some(row),
        }
    }

    /// Whether the conditional template passes for `context`.
    pub fn matches(&self, engine: &RenderEngine, context: &Context) -> Result<bool> {
        if self.conditional.trim().is_empty() {
            return Ok(true);
        }
        let rendered = engine.render_with_context(&self.conditional, context)?;
        let rendered = rendered.trim();
        Ok(!(rendered.is_empty() || rendered == "0" || rendered.eq_ignore_ascii_case("false")))
    }

    /// Render the email for one data row, or `None` if the conditional rejects it.
    ///
    /// Only the body is HTML-escaped; address and subject fields are plain text.
    pub fn render_row<S: SheetSource + ?Sized>(
        &self,
        engine: &RenderEngine,
        source: &S,
        row: u32,
    ) -> Result<Option<RenderedEmail>> {
        let context = build_context(source, &self.request(row))?;
        if !self.matches(engine, &context)? {
            log::debug!("row {} skipped by conditional", row);
            return Ok(None);
        }

        let email = &self.email_template;
        Ok(Some(RenderedEmail {
            row,
            to: engine.render_plain_with_context(&email.to, &context)?,
            cc: engine.render_plain_with_context(&email.cc, &context)?,
            bcc: engine.render_plain_with_context(&email.bcc, &context)?,
            subject: engine.render_plain_with_context(&email.subject, &context)?,
            body: engine.render_with_context(&email.body, &context)?,
        }))
    }

    /// Render every data row below the header row.
    pub fn render_all<S: SheetSource + ?Sized>(
        &self,
        engine: &RenderEngine,
        source: &S,
    ) -> Result<Vec<RenderedEmail>> {
        let document = source.active_document()?;
        let sheet = match self.sheet() {
            Some(name) => document.sheet_by_name(name)?,
            None => document.active_sheet()?,
        };

        let first_row = match self.header_row().checked_add(1) {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };

        let mut emails = Vec::new();
        for row in first_row..=sheet.last_row() {
            if let Some(email) = self.render_row(engine, source, row)? {
                log::info!("merged row {} for {}", row, email.to);
                emails.push(email);
            }
        }
        Ok(emails)
    }
}
