use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The unminified entry module.
    Module,
    Minified,
    /// Key → line/column map of the unminified module.
    PositionMap,
    /// Every dotted key path the module exports.
    Surface,
}

impl ArtifactKind {
    /// Every kind, in emission order.
    pub const ALL: [Self; 4] = [Self::Module, Self::PositionMap, Self::Minified, Self::Surface];

    /// File name suffix appended to the distribution name.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Module => ".js",
            Self::Minified => ".min.js",
            Self::PositionMap => ".js.map.json",
            Self::Surface => ".surface.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Module => "module",
            Self::Minified => "minified",
            Self::PositionMap => "position-map",
            Self::Surface => "surface",
        };
        f.write_str(label)
    }
}

/// One emitted file, held in memory until written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    name: String,
    kind: ArtifactKind,
    contents: String,
}

impl Artifact {
    /// Names the artifact `<distribution><suffix>`.
    #[must_use]
    pub fn new(distribution: &str, kind: ArtifactKind, contents: String) -> Self {
        Self { name: format!("{distribution}{}", kind.suffix()), kind, contents }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.kind
    }

    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}
