//! Show a single post

use anyhow::{bail, Result};

use crate::cms::ContentSource;
use crate::content::PostDetail;
use crate::generator::Generator;
use crate::Blog;

/// Print a post's metadata and section outline
pub async fn run(blog: &Blog, slug: &str) -> Result<()> {
    let source = blog.content_source()?;
    let generator = Generator::new(blog)?;
    let post = fetch(&generator, &source, slug).await?;

    println!("{}", post.data.title);
    if let Some(date) = &post.first_publication_date {
        println!("  date:    {}", generator.normalizer().dates().format(date));
    }
    println!("  author:  {}", post.data.author);
    println!(
        "  reading: {} min",
        post.reading_time(blog.config.posts.words_per_minute)
    );
    if !post.data.banner.url.is_empty() {
        println!("  banner:  {}", post.data.banner.url);
    }
    for section in &post.data.content {
        println!("  - {} ({} fragments)", section.heading, section.body.len());
    }

    Ok(())
}

async fn fetch(
    generator: &Generator,
    source: &dyn ContentSource,
    slug: &str,
) -> Result<PostDetail> {
    match generator.post_props(source, slug).await? {
        Some(post) => Ok(post),
        None => bail!("No post with slug {:?}", slug),
    }
}
