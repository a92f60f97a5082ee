use crate::flags::FeatureFlagSet;
use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Project configuration as read from `carve.toml`.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CarveConfigInner {
    pub catalog: PathBuf,
    pub output: OutputConfig,
    /// Flag defaults applied to every distribution.
    pub flags: FeatureFlagSet,
    pub distributions: Vec<DistributionConfig>,
}

/// Thin Arc-wrapped config for inexpensive cloning into concurrent builds.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct CarveConfig {
    #[serde(flatten, default)]
    inner: Arc<CarveConfigInner>,
}

impl CarveConfig {
    #[must_use]
    pub fn new(inner: CarveConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    #[must_use]
    pub fn distribution(&self, name: &str) -> Option<&DistributionConfig> {
        self.distributions.iter().find(|d| d.name == name)
    }
}

impl Deref for CarveConfig {
    type Target = CarveConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for CarveConfig {
    fn deref_mut(&mut self) -> &mut CarveConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Where and how artifacts are written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Global name the composed namespace is published under.
    pub binding: String,
    pub source_map: bool,
    pub surface: bool,
}

/// One named build target.
#[derive(Debug, Clone, Deserialize)]
pub struct DistributionConfig {
    pub name: String,
    pub manifest: PathBuf,
    #[serde(default = "default_minify")]
    pub minify: bool,
    #[serde(default)]
    pub flags: FeatureFlagSet,
}

const fn default_minify() -> bool {
    true
}

// --- Default ---

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dist"),
            binding: "Phaser".to_owned(),
            source_map: true,
            surface: true,
        }
    }
}
