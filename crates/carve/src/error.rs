use carve_engine::EngineError;
use carve_kernel::LoadError;
use carve_packager::PackagerError;
use std::borrow::Cow;

/// Any failure of a project load or a distribution run.
#[carve_derive::carve_error]
pub enum CarveError {
    #[error("Load failed{}: {source}", format_context(.context))]
    Load { source: LoadError, context: Option<Cow<'static, str>> },

    #[error("Composition failed{}: {source}", format_context(.context))]
    Engine { source: EngineError, context: Option<Cow<'static, str>> },

    #[error("Packaging failed{}: {source}", format_context(.context))]
    Packager { source: PackagerError, context: Option<Cow<'static, str>> },

    #[error("Unknown distribution{}: '{name}'", format_context(.context))]
    UnknownDistribution { name: String, context: Option<Cow<'static, str>> },

    #[error("Build task failed{}: {source}", format_context(.context))]
    Task { source: tokio::task::JoinError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
