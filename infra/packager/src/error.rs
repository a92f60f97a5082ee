use std::borrow::Cow;

/// A specialized [`PackagerError`] enum of this crate.
#[carve_derive::carve_error]
pub enum PackagerError {
    #[error("Invalid artifact name{}: {message}", format_context(.context))]
    InvalidArtifactName { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid global binding{}: {message}", format_context(.context))]
    InvalidBinding { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Serialization failure{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Internal packager error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
