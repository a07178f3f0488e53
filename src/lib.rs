//! prismic-blog: a paginated blog listing backed by a Prismic repository
//!
//! The first page of posts is fetched and rendered ahead of time; further
//! pages are loaded through the pagination cursor the content API returns.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod listing;
pub mod prismic;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;

use prismic::PrismicClient;

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new blog from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a blog from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Build the content API client for this site
    pub fn client(&self) -> Result<PrismicClient> {
        if self.config.prismic.endpoint.is_empty() {
            anyhow::bail!(
                "No content API endpoint configured; set prismic.endpoint in _config.yml or {}",
                config::ENDPOINT_ENV
            );
        }
        Ok(PrismicClient::new(&self.config.prismic)?)
    }

    /// Generate the static first page
    pub async fn generate(&self) -> Result<()> {
        let client = self.client()?;
        commands::generate::run(self, &client).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
