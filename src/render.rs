//! Template rendering.
//!
//! Merge templates accept two tag syntaxes. `<<Field>>` (also HTML-escaped as
//! `&lt;&lt;Field&gt;&gt;`, which is what rich text editors produce) is rewritten
//! to a Handlebars segment literal `{{[Field]}}` so field names may contain
//! spaces and punctuation. Ordinary `{{expr}}` tags have editor-inserted entities
//! undone before the text is handed to Handlebars.

use crate::context::{Context, ContextRequest, build_context};
use crate::error::Result;
use crate::helpers::register_helpers;
use crate::spreadsheet::SheetSource;
use handlebars::Handlebars;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

lazy_static! {
    static ref ANGLE_TAG_REGEX: Regex =
        Regex::new(r"<<\s*(.*?)\s*>>|&lt;&lt;\s*(.*?)\s*&gt;&gt;").unwrap();
    static ref BRACE_TAG_REGEX: Regex = Regex::new(r"\{\{\s*(.*?)\s*\}\}").unwrap();
}

/// Entity replacements applied inside brace tags, in order.
const TAG_UNESCAPES: [(&str, &str); 5] = [
    ("&nbsp;", " "),
    ("%20", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
];

/// Rewrite `<<expr>>` and `&lt;&lt;expr&gt;&gt;` to `{{[expr]}}`.
///
/// Tags with an empty expression are left as they are.
pub fn normalize_angle_tags(text: &str) -> String {
    ANGLE_TAG_REGEX
        .replace_all(text, |caps: &Captures| {
            let expr = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if expr.is_empty() {
                caps[0].to_string()
            } else {
                format!("{{{{[{}]}}}}", expr)
            }
        })
        .into_owned()
}

/// Trim each `{{expr}}` and undo HTML entities inside it.
///
/// Each entity is replaced once per tag, first occurrence only. Tags with an
/// empty expression are left as they are.
pub fn unescape_brace_tags(text: &str) -> String {
    BRACE_TAG_REGEX
        .replace_all(text, |caps: &Captures| {
            let expr = &caps[1];
            if expr.is_empty() {
                return caps[0].to_string();
            }
            let expr = TAG_UNESCAPES
                .iter()
                .fold(expr.to_string(), |acc, &(from, to)| acc.replacen(from, to, 1));
            format!("{{{{{}}}}}", expr)
        })
        .into_owned()
}

/// Both rewriting passes, in the order the engine expects.
pub fn preprocess(text: &str) -> String {
    unescape_brace_tags(&normalize_angle_tags(text))
}

/// Engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Fail on fields missing from the context instead of rendering them empty.
    pub strict_mode: bool,
    /// HTML-escape substituted values. Turn off for plain text mail.
    pub escape_html: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            strict_mode: false,
            escape_html: true,
        }
    }
}

/// Per-call render options.
///
/// An explicit `context` wins; otherwise one is built from the spreadsheet
/// using the remaining hints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    pub context: Option<Context>,
    pub spreadsheet_name: Option<String>,
    pub sheet_name: Option<String>,
    #[serde(deserialize_with = "row_index")]
    pub header_row_index: Option<u32>,
    #[serde(deserialize_with = "row_index")]
    pub data_row_index: Option<u32>,
}

// Anything other than a positive whole number counts as not given
fn row_index<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|n| n.fract() == 0.0 && *n >= 1.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32))
}

impl RenderOptions {
    pub fn context_request(&self) -> ContextRequest<'_> {
        ContextRequest {
            spreadsheet_name: self.spreadsheet_name.as_deref(),
            sheet_name: self.sheet_name.as_deref(),
            header_row_index: self.header_row_index,
            data_row_index: self.data_row_index,
        }
    }
}

/// A configured Handlebars registry with the merge helpers installed.
///
/// Create one at startup and share it by reference; helpers are registered
/// when the engine is built and never again. A second registry sharing the
/// same helpers renders plain text such as mail headers without escaping.
pub struct RenderEngine {
    registry: Handlebars<'static>,
    plain: Handlebars<'static>,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::with_config(&RenderConfig::default())
    }

    pub fn with_config(config: &RenderConfig) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(config.strict_mode);
        if !config.escape_html {
            registry.register_escape_fn(handlebars::no_escape);
        }
        register_helpers(&mut registry);
        let mut plain = registry.clone();
        plain.register_escape_fn(handlebars::no_escape);
        RenderEngine { registry, plain }
    }

    /// Whether `name` resolves to a helper in the engine's registry.
    pub fn has_helper(&self, name: &str) -> bool {
        // a call with arguments only fails this way when nothing is registered
        match self
            .registry
            .render_template(&format!("{{{{{} null null}}}}", name), &Value::Null)
        {
            Ok(_) => true,
            Err(e) => !e.to_string().contains("Helper not defined"),
        }
    }

    pub fn strict_mode(&self) -> bool {
        self.registry.strict_mode()
    }

    /// Render `template` against the context named by `options`.
    pub fn render<S: SheetSource + ?Sized>(
        &self,
        template: &str,
        options: &RenderOptions,
        source: &S,
    ) -> Result<String> {
        match &options.context {
            Some(context) => self.render_with_context(template, context),
            None => {
                let context = build_context(source, &options.context_request())?;
                self.render_with_context(template, &context)
            }
        }
    }

    /// Render `template` against an already built context.
    pub fn render_with_context(&self, template: &str, context: &Context) -> Result<String> {
        let parsed = preprocess(template);
        log::debug!("rendering template of {} bytes", parsed.len());
        Ok(self.registry.render_template(&parsed, context)?)
    }

    /// Render without HTML escaping, for headers and other plain text.
    pub fn render_plain_with_context(&self, template: &str, context: &Context) -> Result<String> {
        let parsed = preprocess(template);
        Ok(self.plain.render_template(&parsed, context)?)
    }
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new()
    }
}
