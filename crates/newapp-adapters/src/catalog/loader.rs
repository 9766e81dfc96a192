//! Filesystem-based catalog loader.
//!
//! A catalog path is either a single `.toml`/`.json` file or a directory
//! whose catalog files are merged in file-name order.
//!
//! ```text
//! catalog/
//! ├── images.toml
//! ├── streams.toml
//! └── templates/
//!     └── databases.json
//! ```
//!
//! An explicit file that fails to load is an error. Inside a directory a
//! broken file is skipped with a warning so one bad entry does not hide the
//! rest of the catalog.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use newapp_core::error::{NewAppError, NewAppResult};

use super::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Toml,
    Json,
}

impl CatalogFormat {
    /// Format implied by a file extension, `None` for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse and validate catalog text.
pub fn parse_catalog(text: &str, format: CatalogFormat) -> NewAppResult<Catalog> {
    let catalog: Catalog = match format {
        CatalogFormat::Toml => toml::from_str(text).map_err(|e| NewAppError::Configuration {
            message: format!("invalid catalog: {e}"),
        })?,
        CatalogFormat::Json => serde_json::from_str(text).map_err(|e| NewAppError::Configuration {
            message: format!("invalid catalog: {e}"),
        })?,
    };
    catalog.validate()?;
    Ok(catalog)
}

/// Loads a [`Catalog`] from a file or directory.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    path: PathBuf,
}

impl CatalogLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> NewAppResult<Catalog> {
        if self.path.is_file() {
            return load_file(&self.path);
        }
        if !self.path.is_dir() {
            return Err(NewAppError::Configuration {
                message: format!("catalog path {} does not exist", self.path.display()),
            });
        }

        let mut catalog = Catalog::new();
        let entries = WalkDir::new(&self.path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable catalog entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && CatalogFormat::from_path(e.path()).is_some());

        for entry in entries {
            match load_file(entry.path()) {
                Ok(found) => {
                    debug!(file = %entry.path().display(), entries = found.len(), "catalog file loaded");
                    catalog.merge(found);
                }
                Err(e) => {
                    warn!(
                        file = %entry.path().display(),
                        error = %e,
                        "skipping catalog file due to load error"
                    );
                }
            }
        }
        Ok(catalog)
    }
}

fn load_file(path: &Path) -> NewAppResult<Catalog> {
    let format = CatalogFormat::from_path(path).ok_or_else(|| NewAppError::Configuration {
        message: format!("{} is not a .toml or .json catalog", path.display()),
    })?;
    let text = fs::read_to_string(path).map_err(|e| NewAppError::Configuration {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_catalog(&text, format).map_err(|e| NewAppError::Configuration {
        message: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const IMAGES: &str = r#"
[[image]]
reference = "centos/ruby-22-centos7"
supports  = ["ruby"]
ports     = ["8080/tcp"]
builder   = true
"#;

    const TEMPLATES: &str = r#"{
  "template": [
    { "name": "mysql-ephemeral", "parameters": [{ "name": "MYSQL_USER", "required": true }] }
  ]
}"#;

    #[test]
    fn loads_single_toml_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("images.toml");
        fs::write(&file, IMAGES).unwrap();

        let catalog = CatalogLoader::new(&file).load().unwrap();
        assert_eq!(catalog.images.len(), 1);
        assert!(catalog.images[0].registry);
        assert!(catalog.images[0].metadata.builder);
    }

    #[test]
    fn directory_merges_toml_and_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.toml"), IMAGES).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/b.json"), TEMPLATES).unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let catalog = CatalogLoader::new(dir.path()).load().unwrap();
        assert_eq!(catalog.images.len(), 1);
        assert_eq!(catalog.templates.len(), 1);
        assert!(catalog.templates[0].parameters[0].required);
    }

    #[test]
    fn broken_file_in_directory_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.toml"), IMAGES).unwrap();
        fs::write(dir.path().join("bad.toml"), "[[image]]\nreference = \"UPPER\"\n").unwrap();

        let catalog = CatalogLoader::new(dir.path()).load().unwrap();
        assert_eq!(catalog.images.len(), 1);
    }

    #[test]
    fn broken_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.toml");
        fs::write(&file, "[[image]]\nports = [\"8080\"]\n").unwrap();

        let err = CatalogLoader::new(&file).load().unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn missing_path_is_a_configuration_error() {
        let err = CatalogLoader::new("/definitely/not/here").load().unwrap_err();
        assert!(matches!(err, NewAppError::Configuration { .. }));
    }
}
