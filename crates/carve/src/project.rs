//! A loaded project: configuration plus the shared, read-only registry.

use crate::error::{CarveError, CarveErrorExt};
use carve_domain::config::{CarveConfig, DistributionConfig};
use carve_domain::{BuildFlags, FeatureFlagSet, Manifest};
use carve_engine::{ComposedNamespace, Composition, ExportSlot, Registry, compose};
use carve_kernel::config::load_config;
use carve_kernel::{load_catalog_document, load_manifest};
use carve_packager::{Artifact, ArtifactKind, ArtifactWriter, EntryPackager, PackageOptions, Packager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Per-invocation adjustments on top of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    /// Flags forced on for every distribution of this invocation.
    pub enable: Vec<String>,
    /// Flags forced off; applied after `enable`.
    pub disable: Vec<String>,
    /// Replaces `output.dir`.
    pub out_dir: Option<PathBuf>,
}

impl BuildOverrides {
    #[must_use]
    pub fn enable(mut self, flag: impl Into<String>) -> Self {
        self.enable.push(flag.into());
        self
    }

    #[must_use]
    pub fn disable(mut self, flag: impl Into<String>) -> Self {
        self.disable.push(flag.into());
        self
    }

    #[must_use]
    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }
}

/// Outcome of one distribution build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub distribution: String,
    /// Component leaves in the exported namespace.
    pub components: usize,
    /// Written files, in emission order.
    pub artifacts: Vec<PathBuf>,
}

/// A composed distribution whose artifacts are still in memory.
struct Packaged {
    name: String,
    components: usize,
    artifacts: Vec<Artifact>,
}

/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Project {
    config: CarveConfig,
    base_dir: PathBuf,
    registry: Arc<Registry>,
}

impl Project {
    /// Loads `path` (plus `CARVE__*` overrides), then the catalog it names.
    ///
    /// Relative paths in the file resolve against the file's directory.
    ///
    /// # Errors
    /// [`CarveError::Load`] for unreadable or malformed files, [`CarveError::Engine`]
    /// if the catalog does not form a valid registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CarveError> {
        let path = path.as_ref();
        let config: CarveConfig = load_config(Some(path)).context("Project configuration")?;
        let base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::from_config(config, base_dir)
    }

    /// Builds a project from an already loaded configuration.
    ///
    /// # Errors
    /// See [`Project::load`].
    pub fn from_config(config: CarveConfig, base_dir: impl Into<PathBuf>) -> Result<Self, CarveError> {
        let base_dir = base_dir.into();
        if config.catalog.as_os_str().is_empty() {
            return Err("configuration does not name a catalog".into());
        }

        let catalog_path = base_dir.join(&config.catalog);
        let document = load_catalog_document(&catalog_path).context("Catalog document")?;
        let registry = Registry::from_document(&document)
            .context(format!("Catalog {}", catalog_path.display()))?;

        info!(
            catalog = %catalog_path.display(),
            name = %registry.name(),
            version = %registry.version(),
            components = registry.catalog().len(),
            distributions = config.distributions.len(),
            "Project loaded"
        );
        Ok(Self { config, base_dir, registry: Arc::new(registry) })
    }

    #[must_use]
    pub const fn config(&self) -> &CarveConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Names of every configured distribution, in file order.
    #[must_use]
    pub fn distribution_names(&self) -> Vec<&str> {
        self.config.distributions.iter().map(|d| d.name.as_str()).collect()
    }

    /// # Errors
    /// [`CarveError::UnknownDistribution`] if `name` is not configured.
    pub fn distribution(&self, name: &str) -> Result<&DistributionConfig, CarveError> {
        self.config
            .distribution(name)
            .ok_or_else(|| CarveError::UnknownDistribution { name: name.to_owned(), context: None })
    }

    /// Built-in defaults, then `[flags]`, then the distribution's flags, then `overrides`.
    ///
    /// # Errors
    /// [`CarveError::UnknownDistribution`] if `name` is not configured.
    pub fn effective_flags(&self, name: &str, overrides: &BuildOverrides) -> Result<FeatureFlagSet, CarveError> {
        let distribution = self.distribution(name)?;
        Ok(self.flags_for(distribution, overrides))
    }

    /// Where artifacts of this invocation are written.
    #[must_use]
    pub fn output_dir(&self, overrides: &BuildOverrides) -> PathBuf {
        overrides.out_dir.clone().unwrap_or_else(|| self.base_dir.join(&self.config.output.dir))
    }

    /// Composes one distribution without exporting or writing anything.
    ///
    /// # Errors
    /// [`CarveError::UnknownDistribution`], [`CarveError::Load`] for the manifest and
    /// [`CarveError::Engine`] for any composition failure.
    pub fn compose(&self, name: &str, overrides: &BuildOverrides) -> Result<ComposedNamespace, CarveError> {
        let distribution = self.distribution(name)?;
        let manifest = self.manifest_for(distribution)?;
        let flags = self.flags_for(distribution, overrides);

        compose(&self.registry, name, &manifest, &flags).context(format!("Distribution '{name}'"))
    }

    /// Composes, exports, packages and writes one distribution.
    ///
    /// Composition runs on the blocking pool; the registry is shared, never copied.
    /// Artifacts a previous build left for kinds this build does not emit are removed.
    ///
    /// # Errors
    /// Any error of [`Project::compose`], plus [`CarveError::Packager`] for emission or
    /// write failures and [`CarveError::Task`] if the composition task panicked.
    pub async fn build(&self, name: &str, overrides: &BuildOverrides) -> Result<BuildReport, CarveError> {
        let packaged = self.package(name, overrides).await?;
        let writer = ArtifactWriter::open(self.output_dir(overrides)).await?;
        Self::write(&writer, packaged).await
    }

    /// Builds `names`, or every configured distribution when `names` is empty.
    ///
    /// Every distribution is composed and packaged (concurrently) before the first file is
    /// written, so a failing distribution leaves the output directory untouched. Writes
    /// then run one distribution at a time. Reports come back in request order.
    ///
    /// # Errors
    /// [`CarveError::UnknownDistribution`] before anything starts, otherwise the first
    /// error of [`Project::build`].
    pub async fn build_all(&self, names: &[String], overrides: &BuildOverrides) -> Result<Vec<BuildReport>, CarveError> {
        let names = self.select(names)?;
        let mut tasks = JoinSet::new();
        for (index, name) in names.iter().cloned().enumerate() {
            let project = self.clone();
            let overrides = overrides.clone();
            tasks.spawn(async move { (index, project.package(&name, &overrides).await) });
        }

        let mut packaged: Vec<Option<Packaged>> = std::iter::repeat_with(|| None).take(names.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.context("Build task")?;
            packaged[index] = Some(result?);
        }

        let writer = ArtifactWriter::open(self.output_dir(overrides)).await?;
        let mut reports = Vec::with_capacity(names.len());
        for packaged in packaged.into_iter().flatten() {
            reports.push(Self::write(&writer, packaged).await?);
        }
        Ok(reports)
    }

    /// Composes `names` (or every distribution) and discards the results.
    ///
    /// # Errors
    /// The first error of [`Project::compose`].
    pub fn check_all(&self, names: &[String], overrides: &BuildOverrides) -> Result<Vec<(String, usize)>, CarveError> {
        self.select(names)?
            .into_iter()
            .map(|name| {
                let composed = self.compose(&name, overrides)?;
                debug!(distribution = %name, components = composed.components().len(), "Distribution checked");
                Ok((name, composed.components().len()))
            })
            .collect()
    }

    async fn package(&self, name: &str, overrides: &BuildOverrides) -> Result<Packaged, CarveError> {
        let distribution = self.distribution(name)?;
        let manifest = self.manifest_for(distribution)?;
        let flags = self.flags_for(distribution, overrides);
        let options = self.package_options(distribution);

        let registry = Arc::clone(&self.registry);
        let binding = options.binding.clone();
        let label = name.to_owned();
        let exported = tokio::task::spawn_blocking(move || {
            let slot = ExportSlot::new(binding);
            Composition::new(&registry, label)
                .resolve(&manifest)?
                .apply_flags(&flags)?
                .merge_constants()?
                .export(&slot)
        })
        .await
        .context(format!("Distribution '{name}'"))??;

        let artifacts = EntryPackager::new(options)
            .package(name, &exported)
            .context(format!("Distribution '{name}'"))?;
        debug!(distribution = %name, artifacts = artifacts.len(), "Distribution packaged");
        Ok(Packaged { name: name.to_owned(), components: exported.components().len(), artifacts })
    }

    async fn write(writer: &ArtifactWriter, packaged: Packaged) -> Result<BuildReport, CarveError> {
        let name = packaged.name;
        let written = writer
            .write_all(&packaged.artifacts)
            .await
            .context(format!("Distribution '{name}'"))?;
        let emitted: Vec<ArtifactKind> = packaged.artifacts.iter().map(Artifact::kind).collect();
        let removed = writer
            .remove_stale(&name, &emitted)
            .await
            .context(format!("Distribution '{name}'"))?;

        info!(
            distribution = %name,
            root = %writer.root().display(),
            artifacts = written.len(),
            stale_removed = removed.len(),
            "Distribution built"
        );
        Ok(BuildReport { distribution: name, components: packaged.components, artifacts: written })
    }

    fn select(&self, names: &[String]) -> Result<Vec<String>, CarveError> {
        if names.is_empty() {
            return Ok(self.distribution_names().into_iter().map(str::to_owned).collect());
        }
        for name in names {
            self.distribution(name)?;
        }
        Ok(names.to_vec())
    }

    fn manifest_for(&self, distribution: &DistributionConfig) -> Result<Manifest, CarveError> {
        let path = self.base_dir.join(&distribution.manifest);
        load_manifest(&path).context(format!("Manifest of '{}'", distribution.name))
    }

    fn flags_for(&self, distribution: &DistributionConfig, overrides: &BuildOverrides) -> FeatureFlagSet {
        let mut flags = FeatureFlagSet::from(BuildFlags::defaults());
        flags.merge(&self.config.flags);
        flags.merge(&distribution.flags);
        for name in &overrides.enable {
            flags.set(name, true);
        }
        for name in &overrides.disable {
            flags.set(name, false);
        }

        let gated = self.registry.optional().flags();
        for (name, _) in flags.iter() {
            if !BuildFlags::is_known(name) && !gated.contains(&name) {
                warn!(distribution = %distribution.name, flag = %name, "Unknown feature flag");
            }
        }
        flags
    }

    fn package_options(&self, distribution: &DistributionConfig) -> PackageOptions {
        let output = &self.config.output;
        PackageOptions {
            binding: output.binding.clone(),
            minify: distribution.minify,
            source_map: output.source_map,
            surface: output.surface,
            banner: Some(format!(
                "{} v{} ({})",
                self.registry.name(),
                self.registry.version(),
                distribution.name
            )),
        }
    }
}
