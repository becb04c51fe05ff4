//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
language: pt-BR
timezone: America/Sao_Paulo
date_format: dd MMM yyyy
logo: /images/logo.svg

# URL
url: http://localhost:4000
root: /

# Directory
source_dir: source
public_dir: public

# Content repository
# PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these values
prismic:
  endpoint: https://your-repo.cdn.prismic.io/api/v2
  document_type: posts
  timeout_secs: 30

# Posts
posts:
  prerender:
    - como-utilizar-hooks
    - criando-um-app-cra-do-zero
  revalidate: 3600
  words_per_minute: 200
  dedupe: false
  shared_first_body: false
"#;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="26" viewBox="0 0 240 26">
  <text x="0" y="20" font-family="sans-serif" font-size="22" fill="#f8f8f8">spacetraveling<tspan fill="#ff57b2">.</tspan></text>
</svg>
"##;

/// Initialize a new site in the given directory
///
/// An existing `_config.yml` is left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("source/images"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        tracing::warn!("Keeping existing {:?}", config_path);
    } else {
        fs::write(&config_path, CONFIG)?;
        tracing::info!("Created: {:?}", config_path);
    }

    let logo_path = target_dir.join("source/images/logo.svg");
    if !logo_path.exists() {
        fs::write(&logo_path, LOGO)?;
    }

    Ok(())
}
