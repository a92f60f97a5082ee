use crate::error::{LoadError, LoadErrorExt};
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

/// Config file used when no path is given (any extension the `config` crate understands).
pub const DEFAULT_CONFIG: &str = "carve";
/// Prefix for environment overrides, e.g. `CARVE__OUTPUT__DIR=build`.
pub const ENV_PREFIX: &str = "CARVE";

/// Loads a configuration file and overlays environment variables on top of it.
///
/// Layers, lowest priority first:
/// 1. **Base file**: `path`, or `carve.{toml,json,...}` in the working directory.
/// 2. **Environment**: variables prefixed with `CARVE__`; nested keys are separated by
///    double underscores (`CARVE__OUTPUT__BINDING` maps to `output.binding`).
///
/// # Errors
/// Returns [`LoadError::Config`] if the file is missing, unreadable or does not match `T`.
///
/// # Example
/// ```rust,no_run
/// use carve_kernel::config::load_config;
/// use carve_kernel::domain::config::CarveConfig;
///
/// let cfg: CarveConfig = load_config(Some("carve.toml")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, LoadError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            // Keys arrive lower-cased; `__` becomes the `.` nesting separator.
            Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true),
        );

    info!(path = %effective_path.display(), "Loading config");

    let config = builder
        .build()
        .context(format!("Failed to read {}", effective_path.display()))?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
