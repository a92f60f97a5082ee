use carve_domain::{ComponentPath, InvalidPath};
use std::borrow::Cow;

/// Composition failures. Every variant aborts the run; nothing is published.
#[carve_derive::carve_error]
pub enum EngineError {
    #[error("Duplicate component path{}: '{path}' is already registered", format_context(.context))]
    DuplicatePath { path: ComponentPath, context: Option<Cow<'static, str>> },

    #[error("Ambiguous node{}: '{path}' conflicts with '{conflict}'", format_context(.context))]
    AmbiguousNode {
        path: ComponentPath,
        conflict: ComponentPath,
        context: Option<Cow<'static, str>>,
    },

    #[error("Component not found{}: '{path}'", format_context(.context))]
    NotFound { path: ComponentPath, context: Option<Cow<'static, str>> },

    #[error("Unknown component{}: '{path}'", format_context(.context))]
    UnknownComponent { path: String, context: Option<Cow<'static, str>> },

    #[error("Empty manifest node{}: '{path}' has no children and is not a component", format_context(.context))]
    EmptyNode { path: ComponentPath, context: Option<Cow<'static, str>> },

    #[error("Attach conflict{}: '{path}' already holds a leaf", format_context(.context))]
    AttachConflict { path: ComponentPath, context: Option<Cow<'static, str>> },

    #[error("Constant collision{}: '{name}' already exists at the namespace root", format_context(.context))]
    ConstantCollision { name: String, context: Option<Cow<'static, str>> },

    #[error("Gated component{}: '{path}' is only available through flag {flag}", format_context(.context))]
    GatedComponent { path: ComponentPath, flag: String, context: Option<Cow<'static, str>> },

    #[error("Already exported{}: '{binding}' has been published", format_context(.context))]
    AlreadyExported { binding: String, context: Option<Cow<'static, str>> },

    #[error("Invalid path{}: {source}", format_context(.context))]
    InvalidPath { source: InvalidPath, context: Option<Cow<'static, str>> },

    #[error("Internal engine error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
