//! List posts in the content repository

use anyhow::Result;

use crate::cms::ContentSource;
use crate::generator::Generator;
use crate::pagination::{PaginationState, Paginator};
use crate::Blog;

/// Print the first page of posts, or every post with `all`
pub async fn run(blog: &Blog, all: bool) -> Result<()> {
    let source = blog.content_source()?;
    let state = collect(blog, &source, all).await?;

    println!("Posts ({}):", state.results.len());
    for post in &state.results {
        println!(
            "  {} - {} [{}]",
            post.first_publication_date.as_deref().unwrap_or("unpublished"),
            post.data.title,
            post.uid.as_deref().unwrap_or("-")
        );
    }
    if state.has_more() {
        println!("More posts available, use --all to list them.");
    }

    Ok(())
}

/// The post list as the site would show it
pub async fn collect(
    blog: &Blog,
    source: &dyn ContentSource,
    all: bool,
) -> Result<PaginationState> {
    let generator = Generator::new(blog)?;
    let query = generator.list_query();

    let mut paginator = Paginator::start(source, generator.normalizer(), &query)
        .await?
        .dedupe(blog.config.posts.dedupe);
    if all {
        paginator.load_all().await?;
    }

    Ok(paginator.into_state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::{summary_doc, MemorySource};
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn source() -> MemorySource {
        MemorySource::new(vec![summary_doc("a", None, "A")], Some("p2")).with_page(
            "p2",
            vec![summary_doc("a", None, "A"), summary_doc("b", None, "B")],
            None,
        )
    }

    #[tokio::test]
    async fn test_collect_first_page() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::with_config(dir.path(), SiteConfig::default());

        let state = collect(&blog, &source(), false).await.unwrap();
        assert_eq!(state.results.len(), 1);
        assert!(state.has_more());
    }

    #[tokio::test]
    async fn test_collect_all_with_dedupe() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.posts.dedupe = true;
        let blog = Blog::with_config(dir.path(), config);

        let state = collect(&blog, &source(), true).await.unwrap();
        let uids: Vec<_> = state.results.iter().filter_map(|p| p.uid.as_deref()).collect();
        assert_eq!(uids, vec!["a", "b"]);
        assert!(!state.has_more());
    }
}
