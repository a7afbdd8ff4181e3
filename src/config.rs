//! Configuration for the publish pipeline.
//!
//! All behaviour is controlled through [`PublishConfig`], built via its
//! [`PublishConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across request tasks and to log the settings
//! a batch ran under.
//!
//! # Design choice: builder over constructor
//! A positional constructor breaks on every new field. The builder lets
//! callers set only what they care about and rely on documented defaults
//! for the rest.

use crate::error::PagecastError;
use crate::storage::{s3::S3Settings, StorageBackend};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one publish run.
///
/// Built via [`PublishConfig::builder()`] or [`PublishConfig::default()`].
///
/// # Example
/// ```rust
/// use pagecast::PublishConfig;
///
/// let config = PublishConfig::builder()
///     .max_surface_pixels(4000)
///     .build()
///     .unwrap();
/// assert_eq!(config.scale, 1.5);
/// ```
#[derive(Clone)]
pub struct PublishConfig {
    /// Render scale applied to every page's declared unit size. Default: 1.5.
    ///
    /// A page of W×H points renders to a ⌈1.5·W⌉×⌈1.5·H⌉ pixel surface.
    /// The factor is applied uniformly to every page of a batch so the
    /// viewer can rely on consistent relative sizing across pages.
    pub scale: f32,

    /// Maximum rendered surface dimension (width or height) in pixels.
    /// Default: 10 000.
    ///
    /// A safety cap independent of the scale factor: a malformed page box
    /// claiming an enormous media size would otherwise make pdfium allocate
    /// an unbounded bitmap. Below the cap, dimensions are exactly
    /// `natural size × scale`; at the cap both edges shrink proportionally.
    pub max_surface_pixels: u32,

    /// Document password for encrypted uploads.
    pub password: Option<String>,

    /// Pre-constructed storage backend. Takes precedence over
    /// [`PublishConfig::storage_settings`]. Useful in tests and when the
    /// caller wires its own backend (caching, instrumentation).
    pub storage: Option<Arc<dyn StorageBackend>>,

    /// Declarative storage settings, used when no pre-built backend is set.
    pub storage_settings: Option<StorageSettings>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            scale: 1.5,
            max_surface_pixels: 10_000,
            password: None,
            storage: None,
            storage_settings: None,
        }
    }
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("scale", &self.scale)
            .field("max_surface_pixels", &self.max_surface_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("storage", &self.storage.as_ref().map(|_| "<dyn StorageBackend>"))
            .field("storage_settings", &self.storage_settings)
            .finish()
    }
}

impl PublishConfig {
    /// Create a new builder for `PublishConfig`.
    pub fn builder() -> PublishConfigBuilder {
        PublishConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PublishConfig`].
#[derive(Debug)]
pub struct PublishConfigBuilder {
    config: PublishConfig,
}

impl PublishConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn max_surface_pixels(mut self, px: u32) -> Self {
        self.config.max_surface_pixels = px;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn storage(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.config.storage = Some(backend);
        self
    }

    pub fn storage_settings(mut self, settings: StorageSettings) -> Self {
        self.config.storage_settings = Some(settings);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PublishConfig, PagecastError> {
        let c = &self.config;
        if !c.scale.is_finite() || c.scale <= 0.0 {
            return Err(PagecastError::InvalidConfig(format!(
                "scale must be a positive finite factor, got {}",
                c.scale
            )));
        }
        if c.max_surface_pixels < 100 {
            return Err(PagecastError::InvalidConfig(
                "max_surface_pixels must be ≥ 100".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Declarative storage selection, resolvable without any pre-built backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageSettings {
    /// Local directory served by a static-file layer.
    Filesystem {
        /// Directory assets are written under, created if missing.
        root: PathBuf,
        /// Public URL prefix under which `root` is served.
        public_base: String,
    },
    /// S3-compatible bucket (AWS, MinIO, ...).
    S3(S3Settings),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_contract() {
        let config = PublishConfig::default();
        assert_eq!(config.scale, 1.5);
        assert_eq!(config.max_surface_pixels, 10_000);
        assert!(config.password.is_none());
        assert!(config.storage.is_none());
    }

    #[test]
    fn builder_rejects_nonpositive_scale() {
        let err = PublishConfig::builder().scale(0.0).build().unwrap_err();
        assert!(matches!(err, PagecastError::InvalidConfig(_)));

        let err = PublishConfig::builder().scale(f32::NAN).build().unwrap_err();
        assert!(matches!(err, PagecastError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_tiny_surface_cap() {
        let err = PublishConfig::builder().max_surface_pixels(1).build().unwrap_err();
        assert!(matches!(err, PagecastError::InvalidConfig(_)));

        // The floor itself is accepted.
        let config = PublishConfig::builder().max_surface_pixels(100).build().unwrap();
        assert_eq!(config.max_surface_pixels, 100);
    }

    #[test]
    fn debug_hides_password_and_backend() {
        let config = PublishConfig::builder().password("hunter2").build().unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("redacted"));
    }
}
