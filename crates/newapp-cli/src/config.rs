//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `NEWAPP_<SECTION>__<KEY>`, e.g.
//!    `NEWAPP_DEFAULTS__INSECURE_REGISTRY=true`
//! 3. `.newapp.toml` in the current directory
//! 4. The user config file (or the file given with `--config`)
//! 5. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = ".newapp.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults applied to every `generate` / `build` run.
    pub defaults: Defaults,
    /// Where searchers find images and templates.
    pub catalog: CatalogConfig,
    /// Output settings.
    pub output: OutputConfig,
    /// Language detection.
    pub detectors: DetectorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// `source` or `docker`.
    pub strategy: Option<String>,
    pub insecure_registry: bool,
    pub allow_missing_images: bool,
    /// `key=value` labels used when none are given on the command line.
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file or directory searched in addition to the built-in one.
    pub path: Option<PathBuf>,
    /// Include the built-in catalog.
    pub builtin: bool,
    /// Limit image stream searches to these namespaces.
    pub namespaces: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            builtin: true,
            namespaces: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Detector priority; empty uses every built-in detector in its default order.
    pub order: Vec<String>,
}

impl AppConfig {
    /// Load configuration by layering every source over the defaults.
    ///
    /// `config_file` is the path the user passed via `--config`; it must
    /// exist. Without it the user config file is optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&Self::default()).context("failed to encode default configuration")?,
        );

        match config_file {
            Some(path) => {
                debug!(path = %path.display(), "loading explicit config file");
                builder = builder.add_source(File::from(path.clone()).format(FileFormat::Toml).required(true));
            }
            None => {
                let global = Self::config_path();
                debug!(path = %global.display(), "loading user config file if present");
                builder = builder
                    .add_source(File::from(global).format(FileFormat::Toml).required(false))
                    .add_source(
                        File::from(PathBuf::from(LOCAL_CONFIG_FILE))
                            .format(FileFormat::Toml)
                            .required(false),
                    );
            }
        }

        builder
            .add_source(
                Environment::with_prefix("NEWAPP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.newapp.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "newapp", "newapp")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// The file `config set` writes to and `config path` reports.
    pub fn active_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path)
    }

    /// Value at a dotted key such as `defaults.strategy`.
    pub fn get(&self, key: &str) -> Option<toml::Value> {
        let root = toml::Value::try_from(self).ok()?;
        key.split('.')
            .try_fold(&root, |value, segment| value.get(segment))
            .cloned()
    }

    /// Set a dotted key in a TOML document, typing `raw` after the key's
    /// current default so the result still deserializes.
    pub fn set_in_document(document: &str, key: &str, raw: &str) -> anyhow::Result<String> {
        let current = Self::default()
            .get(key)
            .or_else(|| known_optional(key))
            .with_context(|| format!("unknown config key '{key}'"))?;
        let value = typed_value(&current, raw)?;

        let mut table: toml::Table = if document.trim().is_empty() {
            toml::Table::new()
        } else {
            toml::from_str(document).context("existing config file is not valid TOML")?
        };

        let segments: Vec<&str> = key.split('.').collect();
        let (last, parents) = segments
            .split_last()
            .with_context(|| format!("unknown config key '{key}'"))?;
        let mut cursor = &mut table;
        for segment in parents {
            cursor = cursor
                .entry(segment.to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()))
                .as_table_mut()
                .with_context(|| format!("'{segment}' is not a table"))?;
        }
        cursor.insert(last.to_string(), value);

        let rendered = toml::to_string_pretty(&table).context("failed to render config")?;
        toml::from_str::<AppConfig>(&rendered).context("resulting configuration is invalid")?;
        Ok(rendered)
    }
}

/// Keys whose default is `None` and so do not appear when serialized.
fn known_optional(key: &str) -> Option<toml::Value> {
    match key {
        "defaults.strategy" | "catalog.path" => Some(toml::Value::String(String::new())),
        _ => None,
    }
}

fn typed_value(current: &toml::Value, raw: &str) -> anyhow::Result<toml::Value> {
    Ok(match current {
        toml::Value::Boolean(_) => toml::Value::Boolean(
            raw.parse()
                .with_context(|| format!("expected true or false, got '{raw}'"))?,
        ),
        toml::Value::Integer(_) => toml::Value::Integer(
            raw.parse()
                .with_context(|| format!("expected an integer, got '{raw}'"))?,
        ),
        toml::Value::Array(_) => toml::Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_string()))
                .collect(),
        ),
        _ => toml::Value::String(raw.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_enabled_by_default() {
        let cfg = AppConfig::default();
        assert!(cfg.catalog.builtin);
        assert_eq!(cfg.output.format, "auto");
    }

    #[test]
    fn load_explicit_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\nstrategy = \"docker\"\ninsecure_registry = true\n\n[detectors]\norder = [\"python\"]\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.defaults.strategy.as_deref(), Some("docker"));
        assert!(cfg.defaults.insecure_registry);
        assert_eq!(cfg.detectors.order, vec!["python"]);
        assert!(cfg.catalog.builtin);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(AppConfig::load(Some(&PathBuf::from("/no/such/newapp.toml"))).is_err());
    }

    #[test]
    fn get_reads_dotted_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("catalog.builtin"), Some(toml::Value::Boolean(true)));
        assert_eq!(cfg.get("defaults.nope"), None);
    }

    #[test]
    fn set_types_values_after_defaults() {
        let doc = AppConfig::set_in_document("", "defaults.insecure_registry", "true").unwrap();
        let doc = AppConfig::set_in_document(&doc, "detectors.order", "ruby, python").unwrap();
        let doc = AppConfig::set_in_document(&doc, "defaults.strategy", "docker").unwrap();

        let cfg: AppConfig = toml::from_str(&doc).unwrap();
        assert!(cfg.defaults.insecure_registry);
        assert_eq!(cfg.detectors.order, vec!["ruby", "python"]);
        assert_eq!(cfg.defaults.strategy.as_deref(), Some("docker"));
    }

    #[test]
    fn set_rejects_bad_values_and_keys() {
        assert!(AppConfig::set_in_document("", "defaults.insecure_registry", "maybe").is_err());
        assert!(AppConfig::set_in_document("", "nothing.here", "1").is_err());
    }

    #[test]
    fn config_path_is_not_empty() {
        assert!(!AppConfig::config_path().as_os_str().is_empty());
    }
}
