use std::borrow::Cow;

/// Failure to read a configuration file or a JSON document.
#[carve_derive::carve_error]
pub enum LoadError {
    #[error("I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Malformed document{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}
