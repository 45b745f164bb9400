//! Helpers available to every merge template.

use crate::context::META_KEY;
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, handlebars_helper,
};
use serde_json::Value;

pub const HELPER_NAMES: [&str; 6] = ["upper", "lower", "trim", "capitalize", "default", "sheet_url"];

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

handlebars_helper!(upper: |value: Json| text(value).to_uppercase());
handlebars_helper!(lower: |value: Json| text(value).to_lowercase());
handlebars_helper!(trim: |value: Json| text(value).trim().to_string());
handlebars_helper!(capitalize: |value: Json| {
    let s = text(value);
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    }
});
handlebars_helper!(default_value: |value: Json, fallback: Json| {
    if is_blank(value) { fallback.clone() } else { value.clone() }
});

// Writes the source document's URL from the root context
fn sheet_url(
    _: &Helper,
    _: &Handlebars,
    ctx: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let url = ctx
        .data()
        .get(META_KEY)
        .and_then(|meta| meta.get("url"))
        .and_then(Value::as_str);
    if let Some(url) = url {
        out.write(url)?;
    }
    Ok(())
}

/// Install the merge helpers into `registry`.
pub fn register_helpers(registry: &mut Handlebars<'_>) {
    log::debug!("registering merge helpers: {}", HELPER_NAMES.join(", "));
    registry.register_helper("upper", Box::new(upper));
    registry.register_helper("lower", Box::new(lower));
    registry.register_helper("trim", Box::new(trim));
    registry.register_helper("capitalize", Box::new(capitalize));
    registry.register_helper("default", Box::new(default_value));
    registry.register_helper("sheet_url", Box::new(sheet_url));
}
