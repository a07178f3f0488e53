//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::listing::LoadMode;

/// Environment variable overriding `prismic.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";

/// Environment variable overriding `prismic.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // Directory
    pub public_dir: String,

    // Listing
    pub date_format: String,
    pub post_route: String,
    pub load_more_label: String,
    pub load_mode: LoadMode,

    /// Seconds before the generated first page is considered stale
    pub revalidate: u64,

    // Content API
    #[serde(default)]
    pub prismic: PrismicConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),

            public_dir: "public".to_string(),

            date_format: "d MMM yyyy".to_string(),
            post_route: "/post".to_string(),
            load_more_label: "Carregar mais posts".to_string(),
            load_mode: LoadMode::default(),

            revalidate: 60 * 30,

            prismic: PrismicConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, access_token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            tracing::debug!("Using content API endpoint from {}", ENDPOINT_ENV);
            self.prismic.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
            self.prismic.access_token = Some(token);
        }
    }

    /// Regeneration interval for the first page
    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.revalidate)
    }
}

/// Prismic repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismicConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: usize,
    /// Fields to project, relative to `document_type`
    pub fetch: Vec<String>,
}

impl Default for PrismicConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 1,
            fetch: ["title", "uid", "first_publication_date", "subtitle", "author"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

impl PrismicConfig {
    /// Fully qualified field projection (`posts.title`, ...)
    pub fn fetch_fields(&self) -> Vec<String> {
        self.fetch
            .iter()
            .map(|field| format!("{}.{}", self.document_type, field))
            .collect()
    }
}
