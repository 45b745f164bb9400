use thiserror::Error;

/// Failure to locate the document or sheet a render should read from.
///
/// These are raised by the [`SheetSource`](crate::spreadsheet::SheetSource)
/// implementations and passed through the context builder untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no active spreadsheet")]
    NoActiveDocument,

    #[error("spreadsheet not found: {0}")]
    DocumentNotFound(String),

    #[error("spreadsheet {0} has no active sheet")]
    NoActiveSheet(String),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),
}

/// Top level error for everything the crate does.
#[derive(Debug, Error)]
pub enum MailmanError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Compile or evaluation failure reported by the templating engine.
    #[error(transparent)]
    Template(#[from] handlebars::RenderError),

    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "smtp")]
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[cfg(feature = "smtp")]
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[cfg(feature = "smtp")]
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub type Result<T> = std::result::Result<T, MailmanError>;
