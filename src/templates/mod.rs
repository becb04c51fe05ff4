//! Built-in spacetraveling templates using Tera template engine
//!
//! Templates are embedded directly in the binary. Autoescaping stays on for
//! `.html` templates; rendered rich text is marked `safe` where it is used.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{ContentBlock, PostDetail};
use crate::helpers::{self, DateFormatter};
use crate::i18n::Locale;
use crate::pagination::PaginationState;

/// Seconds before the fallback page reloads itself
const FALLBACK_REFRESH_SECS: u32 = 2;

/// Template renderer with the embedded spacetraveling theme
pub struct TemplateRenderer {
    tera: Tera,
    config: SiteConfig,
    locale: &'static Locale,
    dates: DateFormatter,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig, dates: DateFormatter) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("fallback.html", include_str!("spacetraveling/fallback.html")),
            ("404.html", include_str!("spacetraveling/404.html")),
            ("error.html", include_str!("spacetraveling/error.html")),
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self {
            tera,
            config: config.clone(),
            locale: Locale::for_language(&config.language),
            dates,
        })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// The post list with its "load more" trigger
    pub fn render_index(&self, state: &PaginationState) -> Result<String> {
        let root = self.config.root_path();
        let posts: Vec<PostItem> = state
            .results
            .iter()
            .map(|post| PostItem {
                href: post
                    .uid
                    .as_deref()
                    .map(|uid| helpers::post_path(&root, uid))
                    .unwrap_or_else(|| root.clone()),
                title: post.data.title.clone(),
                subtitle: post.data.subtitle.clone(),
                author: post.data.author.clone(),
                date: post.first_publication_date.clone().unwrap_or_default(),
            })
            .collect();

        let mut context = self.base_context();
        context.insert("posts", &posts);
        context.insert("next_page", &state.next_page);
        context.insert("api_url", &helpers::url_for(&self.config, "api/posts"));
        self.render("index.html", &context)
    }

    /// A full post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let view = self.post_view(post);
        let mut context = self.base_context();
        context.insert("post", &view);
        self.render("post.html", &context)
    }

    /// The placeholder served while a post is still being built
    pub fn render_fallback(&self) -> Result<String> {
        let mut context = self.base_context();
        context.insert("refresh_secs", &FALLBACK_REFRESH_SECS);
        self.render("fallback.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.render("404.html", &self.base_context())
    }

    /// Shown when the repository could not be reached for a post
    pub fn render_error(&self) -> Result<String> {
        self.render("error.html", &self.base_context())
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteView {
                title: self.config.title.clone(),
                language: self.config.language.clone(),
                root: self.config.root_path(),
                logo: helpers::url_for(&self.config, &self.config.logo),
                version: env!("CARGO_PKG_VERSION"),
            },
        );
        context.insert("i18n", self.locale);
        context
    }

    fn post_view(&self, post: &PostDetail) -> PostView {
        let path = post
            .uid
            .as_deref()
            .map(|uid| helpers::post_path("/", uid))
            .unwrap_or_else(|| "/".to_string());

        PostView {
            title: post.data.title.clone(),
            banner_url: post.data.banner.url.clone(),
            author: post.data.author.clone(),
            date: post
                .first_publication_date
                .as_ref()
                .map(|date| self.dates.format(date))
                .unwrap_or_default(),
            datetime: post
                .first_publication_date
                .as_ref()
                .map(helpers::date_xml)
                .unwrap_or_default(),
            reading_time: post.reading_time(self.config.posts.words_per_minute),
            permalink: helpers::full_url_for(&self.config, &path),
            description: post
                .data
                .content
                .iter()
                .flat_map(|section| section.body.iter())
                .map(|fragment| fragment.html.clone())
                .next()
                .unwrap_or_default(),
            content: post.data.content.clone(),
        }
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(helpers::strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(helpers::truncate(
        &s,
        length,
        Some(&omission),
    )))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub title: String,
    pub language: String,
    pub root: String,
    pub logo: String,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostItem {
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
    pub reading_time: u32,
    pub permalink: String,
    pub description: String,
    pub content: Vec<ContentBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Banner, BodyFragment, DetailData, PostSummary, SummaryData};
    use crate::helpers::parse_timestamp;
    use crate::i18n::PT_BR;

    fn renderer() -> TemplateRenderer {
        let config = SiteConfig::default();
        let dates = DateFormatter::new("dd MMM yyyy", &PT_BR, chrono_tz::Tz::UTC);
        TemplateRenderer::new(&config, dates).unwrap()
    }

    fn summary(uid: &str, title: &str) -> PostSummary {
        PostSummary {
            uid: Some(uid.to_string()),
            first_publication_date: Some("25 mar 2021".to_string()),
            data: SummaryData {
                title: title.to_string(),
                subtitle: "Sub".to_string(),
                author: "Jane".to_string(),
            },
        }
    }

    fn detail() -> PostDetail {
        PostDetail {
            uid: Some("como-utilizar-hooks".to_string()),
            first_publication_date: parse_timestamp("2021-03-25T19:25:28+0000"),
            data: DetailData {
                title: "Como utilizar Hooks".to_string(),
                banner: Banner {
                    url: "https://images.prismic.io/banner.png".to_string(),
                },
                author: "Jane".to_string(),
                content: vec![ContentBlock {
                    heading: "Intro <script>".to_string(),
                    body: vec![BodyFragment {
                        html: "<p>Hello <strong>world</strong></p>".to_string(),
                    }],
                }],
            },
        }
    }

    #[test]
    fn test_index_with_more() {
        let html = renderer()
            .render_index(&PaginationState {
                results: vec![summary("a", "First"), summary("b", "Second")],
                next_page: Some("https://blog.cdn.prismic.io/page=2".to_string()),
            })
            .unwrap();

        assert!(html.contains("<title>spacetraveling | Início</title>"));
        assert!(html.contains(r#"href="/post/a/""#));
        assert!(html.find("First").unwrap() < html.find("Second").unwrap());
        assert!(html.contains("25 mar 2021"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains(r#"data-api="/api/posts""#));
        // static hosting falls back to the repository's own next page
        assert!(html.contains(r#"var months = ["jan","fev","mar""#));
        assert!(html.contains("return getJson(token)"));
    }

    #[test]
    fn test_index_without_more() {
        let html = renderer()
            .render_index(&PaginationState {
                results: vec![summary("a", "First")],
                next_page: None,
            })
            .unwrap();
        assert!(!html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_index_escapes_titles() {
        let html = renderer()
            .render_index(&PaginationState {
                results: vec![summary("a", "<b>bold</b>")],
                next_page: None,
            })
            .unwrap();
        assert!(html.contains("&lt;b&gt;bold&lt;&#x2F;b&gt;"));
    }

    #[test]
    fn test_post_page() {
        let html = renderer().render_post(&detail()).unwrap();

        assert!(html.contains("<title>Como utilizar Hooks | spacetraveling</title>"));
        assert!(html.contains("25 mar 2021"));
        assert!(html.contains(r#"datetime="2021-03-25T19:25:28+00:00""#));
        assert!(html.contains("1 min"));
        assert!(html.contains("<p>Hello <strong>world</strong></p>"));
        assert!(html.contains("Intro &lt;script&gt;"));
        assert!(html.contains(r#"<meta name="description" content="Hello world">"#));
    }

    #[test]
    fn test_fallback_and_not_found() {
        let renderer = renderer();
        assert!(renderer.render_fallback().unwrap().contains("Carregando..."));
        assert!(renderer
            .render_not_found()
            .unwrap()
            .contains("Post não encontrado"));
    }

    #[test]
    fn test_error_page() {
        let html = renderer().render_error().unwrap();
        assert!(html.contains("Não foi possível carregar o post"));
        assert!(!html.contains("http-equiv=\"refresh\""));
    }
}
