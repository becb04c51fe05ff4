//! Generator module - fetches posts and writes the static site using built-in Tera templates

use anyhow::{Context as _, Result};
use serde_json::json;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::cms::{ContentSource, Query};
use crate::content::{Normalizer, PostDetail};
use crate::helpers::is_safe_slug;
use crate::pagination::{PaginationState, Paginator};
use crate::templates::TemplateRenderer;
use crate::Blog;

/// What a generation run wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Summaries on the first list page
    pub listed: usize,
    /// Slugs whose post pages were written
    pub posts: Vec<String>,
    /// Prerender slugs with no matching document
    pub missing: Vec<String>,
}

/// Static site generator using Tera templates
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    normalizer: Normalizer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        let normalizer = Normalizer::from_config(&blog.config)?;
        let renderer = TemplateRenderer::new(&blog.config, normalizer.dates().clone())?;

        Ok(Self {
            blog: blog.clone(),
            renderer,
            normalizer,
        })
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Generate the entire site
    pub async fn generate(&self, source: &dyn ContentSource) -> Result<GenerateReport> {
        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create dir {:?}", public_dir))?;

        self.copy_source_assets()?;

        let state = self.list_props(source).await?;
        self.write_index(&state)?;

        let mut report = GenerateReport {
            listed: state.results.len(),
            ..Default::default()
        };

        for slug in self.static_paths(source).await? {
            match self.post_props(source, &slug).await? {
                Some(post) => {
                    self.write_post(&slug, &post)?;
                    report.posts.push(slug);
                }
                None => {
                    tracing::warn!("No post found for prerender slug {:?}", slug);
                    report.missing.push(slug);
                }
            }
        }

        self.write_not_found()?;

        Ok(report)
    }

    /// The list query: every post, summary fields only
    pub fn list_query(&self) -> Query {
        let prismic = &self.blog.config.prismic;
        Query::documents_of_type(&prismic.document_type)
            .fetch(prismic.summary_fields())
            .page_size(prismic.page_size)
    }

    /// First page of the post list
    pub async fn list_props(&self, source: &dyn ContentSource) -> Result<PaginationState> {
        let paginator = Paginator::start(source, &self.normalizer, &self.list_query()).await?;
        Ok(paginator.into_state())
    }

    /// Slugs to prerender: the configured ones that exist upstream, in list order
    pub async fn static_paths(&self, source: &dyn ContentSource) -> Result<Vec<String>> {
        let wanted = &self.blog.config.posts.prerender;
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let mut paginator = Paginator::start(source, &self.normalizer, &self.list_query())
            .await?
            .dedupe(true);
        paginator.load_all().await?;

        let mut slugs = Vec::new();
        for uid in paginator.into_state().results.into_iter().filter_map(|p| p.uid) {
            if !wanted.contains(&uid) {
                continue;
            }
            if !is_safe_slug(&uid) {
                tracing::warn!("Skipping post with unusable slug {:?}", uid);
                continue;
            }
            slugs.push(uid);
        }

        for slug in wanted.iter().filter(|slug| !slugs.contains(slug)) {
            tracing::debug!("Prerender slug {:?} is not listed upstream", slug);
        }

        Ok(slugs)
    }

    /// A full post, `None` when the repository has no such slug
    pub async fn post_props(
        &self,
        source: &dyn ContentSource,
        slug: &str,
    ) -> Result<Option<PostDetail>> {
        let document_type = &self.blog.config.prismic.document_type;
        let doc = source.get_by_uid(document_type, slug).await?;
        Ok(doc.map(|doc| self.normalizer.detail(&doc)))
    }

    /// Write `index.html` and `index.json`
    pub fn write_index(&self, state: &PaginationState) -> Result<()> {
        let html = self.renderer.render_index(state)?;
        let props = json!({ "postsPagination": state });
        write_page(&self.blog.public_dir, &html, &props)?;
        tracing::info!("Generated: index ({} posts)", state.results.len());
        Ok(())
    }

    /// Write `post/<slug>/index.html` and `index.json`
    pub fn write_post(&self, slug: &str, post: &PostDetail) -> Result<()> {
        if !is_safe_slug(slug) {
            anyhow::bail!("Refusing to write post with slug {:?}", slug);
        }

        let html = self.renderer.render_post(post)?;
        let props = json!({ "post": post });
        let dir = self.blog.public_dir.join("post").join(slug);
        write_page(&dir, &html, &props)?;
        tracing::info!("Generated: {:?}", dir);
        Ok(())
    }

    fn write_not_found(&self) -> Result<()> {
        let output_path = self.blog.public_dir.join("404.html");
        fs::write(&output_path, self.renderer.render_not_found()?)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Copy source assets (images, etc.) to public directory
    fn copy_source_assets(&self) -> Result<()> {
        let source_dir = &self.blog.source_dir;
        if !source_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(source_dir)?;
            let dest = self.blog.public_dir.join(relative);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::copy(path, &dest).with_context(|| format!("Failed to copy {:?}", path))?;
            tracing::debug!("Copied: {:?}", relative);
        }

        Ok(())
    }
}

/// Write a page and its props into `dir`
fn write_page(dir: &Path, html: &str, props: &serde_json::Value) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create dir {:?}", dir))?;

    let html_path = dir.join("index.html");
    fs::write(&html_path, html).with_context(|| format!("Failed to write {:?}", html_path))?;

    let json_path = dir.join("index.json");
    fs::write(&json_path, serde_json::to_string_pretty(props)?)
        .with_context(|| format!("Failed to write {:?}", json_path))?;

    Ok(())
}
