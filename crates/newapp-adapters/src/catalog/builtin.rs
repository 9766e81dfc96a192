//! Built-in catalog and catalog discovery.
//!
//! [`resolve_catalog`] is the single entry-point for assembling the catalog a
//! run searches. It starts from the built-in entries (unless disabled) and
//! adds catalog files from, in priority order:
//!
//! 1. Paths given explicitly (`--catalog`, or `catalog_paths` in config).
//! 2. **`$NEWAPP_CATALOG_DIR`**, when no explicit path was given.
//! 3. **`./catalog`** relative to the current directory.
//! 4. **`<executable-dir>/catalog`**.
//!
//! Explicit paths must exist. Of the discovered directories only the first
//! one that exists is used.

use std::path::PathBuf;

use tracing::{debug, info, instrument};

use newapp_core::error::{NewAppError, NewAppResult};

use super::{Catalog, CatalogFormat, CatalogLoader, parse_catalog};

/// Environment variable naming an extra catalog directory.
pub const CATALOG_DIR_ENV: &str = "NEWAPP_CATALOG_DIR";

/// Catalog entries that ship with the binary.
pub const BUILTIN_CATALOG: &str = r#"
# ── Builder images ────────────────────────────────────────────────────────────

[[image]]
reference   = "centos/ruby-22-centos7"
description = "Ruby 2.2 builder"
supports    = ["ruby", "ruby:2.2"]
ports       = ["8080/tcp"]
builder     = true

[[image]]
reference   = "centos/nodejs-6-centos7"
description = "Node.js 6 builder"
supports    = ["nodejs", "nodejs:6"]
ports       = ["8080/tcp"]
builder     = true

[[image]]
reference   = "centos/python-35-centos7"
description = "Python 3.5 builder"
supports    = ["python", "python:3.5"]
ports       = ["8080/tcp"]
builder     = true

[[image]]
reference   = "centos/php-70-centos7"
description = "PHP 7.0 builder"
supports    = ["php", "php:7.0"]
ports       = ["8080/tcp"]
builder     = true

[[image]]
reference   = "centos/perl-524-centos7"
description = "Perl 5.24 builder"
supports    = ["perl", "perl:5.24"]
ports       = ["8080/tcp"]
builder     = true

[[image]]
reference   = "openshift/wildfly-101-centos7"
description = "WildFly 10.1 builder"
supports    = ["jee", "java", "wildfly"]
ports       = ["8080/tcp"]
builder     = true

# ── Runtime images ────────────────────────────────────────────────────────────

[[image]]
reference   = "centos/mysql-57-centos7"
description = "MySQL 5.7"
supports    = ["mysql"]
ports       = ["3306/tcp"]
volumes     = ["/var/lib/mysql/data"]

[[image]]
reference   = "centos/postgresql-95-centos7"
description = "PostgreSQL 9.5"
supports    = ["postgresql"]
ports       = ["5432/tcp"]
volumes     = ["/var/lib/pgsql/data"]

[[image]]
reference   = "mongo"
description = "MongoDB"
ports       = ["27017/tcp"]
volumes     = ["/data/db"]

[[image]]
reference   = "centos:7"
description = "CentOS 7 base image"

[[image]]
reference   = "centos:latest"
description = "CentOS base image"

# ── Image trackers ────────────────────────────────────────────────────────────

[[image_stream]]
name        = "ruby"
tag         = "latest"
image       = "centos/ruby-22-centos7"
description = "Ruby (latest)"
supports    = ["ruby"]
ports       = ["8080/tcp"]
builder     = true

[[image_stream]]
name        = "ruby"
tag         = "2.2"
image       = "centos/ruby-22-centos7"
description = "Ruby 2.2"
supports    = ["ruby:2.2"]
ports       = ["8080/tcp"]
builder     = true

[[image_stream]]
name        = "nodejs"
tag         = "latest"
image       = "centos/nodejs-6-centos7"
description = "Node.js (latest)"
supports    = ["nodejs"]
ports       = ["8080/tcp"]
builder     = true

# ── Templates ─────────────────────────────────────────────────────────────────

[[template]]
name        = "mysql-ephemeral"
description = "MySQL database service, without persistent storage"

[[template.parameters]]
name     = "DATABASE_SERVICE_NAME"
value    = "mysql"
required = true

[[template.parameters]]
name        = "MYSQL_USER"
required    = true
description = "Username for the MySQL user"

[[template.parameters]]
name  = "MYSQL_DATABASE"
value = "sampledb"

[[template]]
name        = "postgresql-ephemeral"
description = "PostgreSQL database service, without persistent storage"

[[template.parameters]]
name     = "DATABASE_SERVICE_NAME"
value    = "postgresql"
required = true

[[template.parameters]]
name  = "POSTGRESQL_DATABASE"
value = "sampledb"
"#;

/// Parse [`BUILTIN_CATALOG`].
pub fn builtin_catalog() -> NewAppResult<Catalog> {
    parse_catalog(BUILTIN_CATALOG, CatalogFormat::Toml).map_err(|e| NewAppError::Internal {
        message: format!("built-in catalog is invalid: {e}"),
    })
}

/// Assemble the catalog for one run; see the module docs for the order.
#[instrument]
pub fn resolve_catalog(explicit: &[PathBuf], include_builtin: bool) -> NewAppResult<Catalog> {
    let mut catalog = if include_builtin {
        builtin_catalog()?
    } else {
        Catalog::new()
    };

    if explicit.is_empty() {
        if let Some(dir) = candidate_paths().into_iter().find(|p| p.is_dir()) {
            debug!(path = %dir.display(), "using discovered catalog directory");
            catalog.merge(CatalogLoader::new(dir).load()?);
        }
    } else {
        for path in explicit {
            catalog.merge(CatalogLoader::new(path).load()?);
        }
    }

    info!(
        images = catalog.images.len(),
        image_streams = catalog.image_streams.len(),
        templates = catalog.templates.len(),
        "catalog resolved"
    );
    Ok(catalog)
}

// ── Resolution helpers ────────────────────────────────────────────────────────

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);

    if let Ok(env_dir) = std::env::var(CATALOG_DIR_ENV) {
        paths.push(PathBuf::from(env_dir));
    }
    paths.push(PathBuf::from("catalog"));
    if let Some(exe_sibling) = exe_sibling_catalog() {
        paths.push(exe_sibling);
    }
    paths
}

fn exe_sibling_catalog() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("catalog")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = builtin_catalog().unwrap();
        assert!(catalog.images.iter().any(|i| i.metadata.builder));
        assert!(catalog.templates.iter().any(|t| t.name == "mysql-ephemeral"));
        assert_eq!(
            catalog.image_streams.iter().filter(|s| s.name == "ruby").count(),
            2
        );
    }

    #[test]
    fn explicit_paths_are_merged_after_builtin() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("extra.toml");
        fs::write(&file, "[[image]]\nreference = \"example/custom\"\n").unwrap();

        let builtin = builtin_catalog().unwrap().len();
        let catalog = resolve_catalog(&[file], true).unwrap();
        assert_eq!(catalog.len(), builtin + 1);
        assert_eq!(
            catalog.images.last().map(|i| i.reference.as_str()),
            Some("example/custom")
        );
    }

    #[test]
    fn builtin_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("only.toml");
        fs::write(&file, "[[template]]\nname = \"only\"\n").unwrap();

        let catalog = resolve_catalog(&[file], false).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        assert!(resolve_catalog(&[PathBuf::from("/no/such/catalog.toml")], true).is_err());
    }
}
