//! Generate static files

use anyhow::Result;

use crate::cms::ContentSource;
use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Fetch posts from the configured repository and write the site
pub async fn run(blog: &Blog) -> Result<GenerateReport> {
    let source = blog.content_source()?;
    run_with_source(blog, &source).await
}

/// Generate from an explicit content source
pub async fn run_with_source(blog: &Blog, source: &dyn ContentSource) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    let report = generator.generate(source).await?;

    tracing::info!(
        "Generated index with {} posts and {} post pages",
        report.listed,
        report.posts.len()
    );
    if !report.missing.is_empty() {
        tracing::warn!("Not found upstream: {}", report.missing.join(", "));
    }

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(report)
}
