//! Entry module emission.
//!
//! The module declares one variable holding the namespace literal, exports it once
//! and writes it once to the global binding:
//!
//! ```text
//! var Phaser = {
//!     Game: require('core/Game'),
//!     AUTO: 0
//! };
//!
//! module.exports = Phaser;
//! global.Phaser = Phaser;
//! ```

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::PackagerError;
use carve_domain::path::validate_key;
use carve_domain::{ConstValue, Namespace, Node};
use carve_engine::ComposedNamespace;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt::Write as _;
use tracing::debug;

const INDENT: &str = "    ";

/// Turns a composed namespace into loadable artifacts. Must not alter keys or values.
pub trait Packager: Send + Sync {
    /// # Errors
    /// Implementation specific; see [`PackagerError`].
    fn package(&self, name: &str, namespace: &ComposedNamespace) -> Result<Vec<Artifact>, PackagerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    pub binding: String,
    pub minify: bool,
    pub source_map: bool,
    pub surface: bool,
    /// First-line comment of the unminified module.
    pub banner: Option<String>,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self { binding: "Phaser".to_owned(), minify: true, source_map: true, surface: true, banner: None }
    }
}

/// CommonJS entry packager with a single global write.
#[derive(Debug, Clone, Default)]
pub struct EntryPackager {
    options: PackageOptions,
}

impl EntryPackager {
    #[must_use]
    pub const fn new(options: PackageOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &PackageOptions {
        &self.options
    }
}

impl Packager for EntryPackager {
    fn package(&self, name: &str, namespace: &ComposedNamespace) -> Result<Vec<Artifact>, PackagerError> {
        let binding = &self.options.binding;
        validate_key(binding).map_err(|e| PackagerError::InvalidBinding {
            message: e.to_string().into(),
            context: None,
        })?;

        let mut artifacts = Vec::with_capacity(4);

        let mut pretty = Emitter::new(true);
        if let Some(banner) = &self.options.banner {
            pretty.comment(banner);
        }
        pretty.module(binding, namespace.root());
        let module = Artifact::new(name, ArtifactKind::Module, pretty.out);

        if self.options.source_map {
            let map = PositionMap { file: module.name(), positions: &pretty.positions };
            let json = serde_json::to_string_pretty(&map)?;
            artifacts.push(Artifact::new(name, ArtifactKind::PositionMap, json));
        }

        if self.options.minify {
            let mut compact = Emitter::new(false);
            compact.module(binding, namespace.root());
            artifacts.push(Artifact::new(name, ArtifactKind::Minified, compact.out));
        }

        if self.options.surface {
            let paths: Vec<String> = namespace.paths().iter().map(ToString::to_string).collect();
            let json = serde_json::to_string_pretty(&paths)?;
            artifacts.push(Artifact::new(name, ArtifactKind::Surface, json));
        }

        artifacts.insert(0, module);
        debug!(distribution = name, artifacts = artifacts.len(), "Distribution packaged");
        Ok(artifacts)
    }
}

/// One-based line, zero-based column of a key in the unminified module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Serialize)]
struct PositionMap<'a> {
    file: &'a str,
    #[serde(serialize_with = "ordered_positions")]
    positions: &'a [(String, Position)],
}

fn ordered_positions<S: Serializer>(
    positions: &&[(String, Position)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(positions.len()))?;
    for (path, position) in *positions {
        map.serialize_entry(path, position)?;
    }
    map.end()
}

struct Emitter {
    pretty: bool,
    out: String,
    line: usize,
    line_start: usize,
    positions: Vec<(String, Position)>,
}

impl Emitter {
    const fn new(pretty: bool) -> Self {
        Self { pretty, out: String::new(), line: 1, line_start: 0, positions: Vec::new() }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.line += 1;
        self.line_start = self.out.len();
    }

    fn comment(&mut self, text: &str) {
        for line in text.lines() {
            self.out.push_str("// ");
            push_comment_text(&mut self.out, line);
            self.newline();
        }
    }

    fn module(&mut self, binding: &str, root: &Namespace) {
        let assign = if self.pretty { " = " } else { "=" };
        let _ = write!(self.out, "var {binding}{assign}");
        self.object(root, "", 0);
        self.out.push(';');
        if self.pretty {
            self.newline();
            self.newline();
        }
        let _ = write!(self.out, "module.exports{assign}{binding};");
        if self.pretty {
            self.newline();
        }
        let _ = write!(self.out, "global.{binding}{assign}{binding};");
        if self.pretty {
            self.newline();
        }
    }

    fn object(&mut self, ns: &Namespace, prefix: &str, depth: usize) {
        if ns.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push('{');
        for (i, (key, node)) in ns.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            if self.pretty {
                self.newline();
                self.out.push_str(&INDENT.repeat(depth + 1));
            }

            let path = if prefix.is_empty() { key.to_owned() } else { format!("{prefix}.{key}") };
            if self.pretty {
                let column = self.out.len() - self.line_start;
                self.positions.push((path.clone(), Position { line: self.line, column }));
            }

            self.out.push_str(key);
            self.out.push_str(if self.pretty { ": " } else { ":" });
            match node {
                Node::Branch(child) => self.object(child, &path, depth + 1),
                Node::Component(entry) => {
                    self.out.push_str("require(");
                    push_string_literal(&mut self.out, entry.module());
                    self.out.push(')');
                }
                Node::Constant(value) => push_constant(&mut self.out, value),
            }
        }
        if self.pretty {
            self.newline();
            self.out.push_str(&INDENT.repeat(depth));
        }
        self.out.push('}');
    }
}

fn push_constant(out: &mut String, value: &ConstValue) {
    match value {
        ConstValue::Bool(v) => {
            let _ = write!(out, "{v}");
        }
        ConstValue::Int(v) => {
            let _ = write!(out, "{v}");
        }
        ConstValue::Float(v) if v.is_nan() => out.push_str("NaN"),
        ConstValue::Float(v) if v.is_infinite() => {
            out.push_str(if v.is_sign_negative() { "-Infinity" } else { "Infinity" });
        }
        ConstValue::Float(v) => {
            let _ = write!(out, "{v:?}");
        }
        ConstValue::Str(v) => push_string_literal(out, v),
    }
}

/// Single-quoted JavaScript string literal.
fn push_string_literal(out: &mut String, value: &str) {
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

/// Line terminators other than `\n` would end a `//` comment early.
fn push_comment_text(out: &mut String, line: &str) {
    for c in line.chars() {
        match c {
            '\u{2028}' | '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c if c.is_control() && c != '\t' => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_cannot_break_out_of_its_comment() {
        let mut emitter = Emitter::new(true);
        emitter.comment("mini\u{2028}global.x = 1\u{2029}\rend\nsecond line");
        assert_eq!(emitter.out, "// mini\\u2028global.x = 1\\u2029\\u000dend\n// second line\n");
        assert_eq!(emitter.line, 3);
    }

    #[test]
    fn string_literals_are_escaped() {
        let mut out = String::new();
        push_string_literal(&mut out, "it's a\\b\nc\u{1}");
        assert_eq!(out, r"'it\'s a\\b\nc\u0001'");
    }

    #[test]
    fn float_constants_use_js_spelling() {
        let render = |v: f64| {
            let mut out = String::new();
            push_constant(&mut out, &ConstValue::Float(v));
            out
        };
        assert_eq!(render(f64::NAN), "NaN");
        assert_eq!(render(f64::INFINITY), "Infinity");
        assert_eq!(render(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(render(0.5), "0.5");
        assert_eq!(render(2.0), "2.0");
    }

    #[test]
    fn empty_namespace_still_exports_once() {
        let mut emitter = Emitter::new(false);
        emitter.module("Phaser", &Namespace::new());
        assert_eq!(emitter.out, "var Phaser={};module.exports=Phaser;global.Phaser=Phaser;");
    }
}
