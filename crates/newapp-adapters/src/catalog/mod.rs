//! Catalogs of known images, image trackers and templates.
//!
//! A catalog is what the searchers search. It is loaded from TOML or JSON
//! files (see [`CatalogLoader`]) and merged with the built-in catalog that
//! ships with the binary.
//!
//! # Format
//!
//! ```toml
//! [[image]]
//! reference   = "centos/ruby-22-centos7"
//! description = "Ruby 2.2 builder"
//! supports    = ["ruby", "ruby:2.2"]
//! ports       = ["8080/tcp"]
//! builder     = true       # marks the image as able to build source
//! registry    = true       # pullable from a registry (default)
//! daemon      = false      # present in the local daemon
//!
//! [[image_stream]]
//! name      = "ruby"
//! namespace = "openshift"
//! tag       = "2.2"
//! image     = "centos/ruby-22-centos7"
//! builder   = true
//!
//! [[template]]
//! name        = "mysql-ephemeral"
//! description = "MySQL without persistent storage"
//!
//! [[template.parameters]]
//! name     = "MYSQL_USER"
//! required = true
//! ```

mod builtin;
mod loader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use newapp_core::domain::component::BUILDER_SCRIPTS_LABEL;
use newapp_core::domain::{ImageMetadata, ImageReference, PortSpec, TemplateRecord};
use newapp_core::error::{NewAppError, NewAppResult};

pub use builtin::{BUILTIN_CATALOG, builtin_catalog, resolve_catalog};
pub use loader::{CatalogFormat, CatalogLoader, parse_catalog};

/// Scripts location recorded on images marked `builder = true`.
const DEFAULT_SCRIPTS_URL: &str = "image:///usr/libexec/s2i";

// ── Entries ───────────────────────────────────────────────────────────────────

/// Metadata fields shared by images and image trackers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub supports: Vec<String>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub builder: bool,
}

impl CatalogMetadata {
    /// Convert to the domain's [`ImageMetadata`].
    pub fn to_image_metadata(&self) -> NewAppResult<ImageMetadata> {
        let exposed_ports = self
            .ports
            .iter()
            .map(|p| p.parse::<PortSpec>().map_err(NewAppError::from))
            .collect::<NewAppResult<Vec<_>>>()?;

        let mut labels = self.labels.clone();
        if self.builder {
            labels
                .entry(BUILDER_SCRIPTS_LABEL.to_string())
                .or_insert_with(|| DEFAULT_SCRIPTS_URL.to_string());
        }

        Ok(ImageMetadata {
            exposed_ports,
            env: self.env.clone().into_iter().collect(),
            labels,
            volumes: self.volumes.clone(),
            supports: self.supports.clone(),
        })
    }
}

/// An image that can be pulled by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub reference: String,
    #[serde(flatten)]
    pub metadata: CatalogMetadata,
    /// Pullable from a registry.
    #[serde(default = "default_true")]
    pub registry: bool,
    /// Present in the local container daemon.
    #[serde(default)]
    pub daemon: bool,
}

impl CatalogImage {
    pub fn image_reference(&self) -> NewAppResult<ImageReference> {
        Ok(ImageReference::parse(&self.reference)?)
    }
}

/// One tag of an image tracker that already exists on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImageStream {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    /// The image the tag currently points at.
    pub image: String,
    #[serde(flatten)]
    pub metadata: CatalogMetadata,
}

impl CatalogImageStream {
    /// `namespace/name:tag`, the form users type to select it.
    pub fn display_name(&self) -> String {
        format!("{}/{}:{}", self.namespace, self.name, self.tag)
    }

    pub fn image_reference(&self) -> NewAppResult<ImageReference> {
        Ok(ImageReference::parse(&self.display_name())?)
    }
}

fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    "openshift".to_string()
}

fn default_tag() -> String {
    "latest".to_string()
}

// ── Catalog ───────────────────────────────────────────────────────────────────

/// Everything the searchers know about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "image")]
    pub images: Vec<CatalogImage>,
    #[serde(default, rename = "image_stream")]
    pub image_streams: Vec<CatalogImageStream>,
    #[serde(default, rename = "template")]
    pub templates: Vec<TemplateRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.image_streams.is_empty() && self.templates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.image_streams.len() + self.templates.len()
    }

    /// Append every entry of `other`. Entries are not de-duplicated; the
    /// resolver collapses matches that name the same image.
    pub fn merge(&mut self, other: Catalog) {
        self.images.extend(other.images);
        self.image_streams.extend(other.image_streams);
        self.templates.extend(other.templates);
    }

    /// Check every reference and port parses and every template has a name.
    pub fn validate(&self) -> NewAppResult<()> {
        for image in &self.images {
            image.image_reference()?;
            image.metadata.to_image_metadata()?;
        }
        for stream in &self.image_streams {
            ImageReference::parse(&stream.image)?;
            stream.image_reference()?;
            stream.metadata.to_image_metadata()?;
        }
        for template in &self.templates {
            if template.name.trim().is_empty() {
                return Err(NewAppError::Configuration {
                    message: "catalog template has an empty name".into(),
                });
            }
            if template.parameters.iter().any(|p| p.name.trim().is_empty()) {
                return Err(NewAppError::Configuration {
                    message: format!(
                        "template \"{}\" has a parameter with an empty name",
                        template.name
                    ),
                });
            }
        }
        Ok(())
    }
}
