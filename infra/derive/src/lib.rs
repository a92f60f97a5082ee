#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the workspace crates.
//!
//! * [`carve_error`] turns a plain enum into a context-aware error type.
//! * [`main`] bootstraps an `async fn main` on a pre-configured Tokio runtime
//!   (re-exported as `carve_runtime::main`).
//!
//! The examples below are `ignore`d to avoid compiling in this crate; the
//! consuming crates exercise them in their own tests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro to bootstrap the specialized Tokio runtime.
///
/// This macro transforms an `async fn main` into a standard `fn main` that initializes
/// a pre-configured Tokio runtime based on the specified profile.
///
/// # Arguments
///
/// * `parallel_builds` - Worker pool sized for building several distributions at once.
/// * `single_build` - A small footprint runtime for one-shot commands.
/// * `default` - Uses the default configuration (worker threads auto-detected).
///
/// # Examples
///
/// ```rust,ignore
/// #[carve_runtime::main(parallel_builds)]
/// async fn main() -> anyhow::Result<()> {
/// # Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for defining crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` if an
///   `Internal` variant is present.
/// * **Kind Introspection**: Generates `fn kind(&self) -> &'static str` returning the
///   variant name, used for reporting and matching in tests.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]`, and must also carry a `context` field.
/// 4. Tuple or unit variants are rejected.
///
/// # Example
///
/// ```rust,ignore
/// use carve_derive::carve_error;
/// use std::borrow::Cow;
///
/// #[carve_error]
/// pub enum LoadError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &Path) -> Result<String, LoadError> {
///     std::fs::read_to_string(path).context("Reading manifest")
/// }
/// ```
#[proc_macro_attribute]
pub fn carve_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
