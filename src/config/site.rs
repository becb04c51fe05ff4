//! Site configuration (_config.yml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

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
    pub date_format: String,
    pub logo: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,

    // Content repository
    #[serde(default)]
    pub prismic: PrismicConfig,

    // Posts
    #[serde(default)]
    pub posts: PostsConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "UTC".to_string(),
            date_format: "dd MMM yyyy".to_string(),
            logo: "/images/logo.svg".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),

            prismic: PrismicConfig::default(),
            posts: PostsConfig::default(),
            extra: HashMap::new(),
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
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            tracing::debug!("Using content endpoint from {}", ENDPOINT_ENV);
            self.prismic.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|t| !t.trim().is_empty()) {
            tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
            self.prismic.access_token = Some(token);
        }
    }

    /// Check the settings that would otherwise fail halfway through a build
    pub fn validate(&self) -> Result<()> {
        if self.prismic.endpoint.trim().is_empty() {
            bail!(
                "No content repository configured: set prismic.endpoint in _config.yml or {}",
                ENDPOINT_ENV
            );
        }
        if url::Url::parse(&self.prismic.endpoint).is_err() {
            bail!("Invalid prismic.endpoint: {}", self.prismic.endpoint);
        }
        if self.posts.words_per_minute == 0 {
            bail!("posts.words_per_minute must be greater than zero");
        }
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            bail!("Unknown timezone: {}", self.timezone);
        }
        Ok(())
    }

    /// Root path with a guaranteed trailing slash
    pub fn root_path(&self) -> String {
        let root = self.root.trim_end_matches('/');
        format!("{}/", root)
    }
}

/// Prismic repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismicConfig {
    /// API endpoint, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    /// Page size for list queries; the repository default applies when unset
    pub page_size: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for PrismicConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: None,
            timeout_secs: 30,
        }
    }
}

impl PrismicConfig {
    /// Fields requested for the post list
    pub fn summary_fields(&self) -> Vec<String> {
        ["title", "subtitle", "author"]
            .iter()
            .map(|field| format!("{}.{}", self.document_type, field))
            .collect()
    }
}

/// Post rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostsConfig {
    /// Slugs rendered at build time; everything else renders on demand
    #[serde(default)]
    pub prerender: Vec<String>,
    /// Seconds before a served post is refetched in the background
    pub revalidate: u64,
    pub words_per_minute: u32,
    /// Skip summaries whose uid was already listed
    pub dedupe: bool,
    /// Reuse the first content block's body for every block
    pub shared_first_body: bool,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            prerender: Vec::new(),
            revalidate: 60 * 60,
            words_per_minute: 200,
            dedupe: false,
            shared_first_body: false,
        }
    }
}
