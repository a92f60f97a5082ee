use carve_derive::carve_error;
use std::borrow::Cow;

#[carve_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Unknown path{}: {path}", format_context(.context))]
    UnknownPath { path: String, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err = DemoError::UnknownPath { path: "A.Z".to_owned(), context: None };
    assert_eq!(err.kind(), "UnknownPath");
}
