//! Content repository access
//!
//! [`ContentSource`] is the seam between the site and the headless CMS.
//! [`PrismicClient`] implements it over the Prismic REST API.

mod document;
mod error;
pub(crate) mod lenient;
mod prismic;

use async_trait::async_trait;

pub use document::{ContentBlock, Document, Image, PostData};
pub use error::{CmsError, Result};
pub use prismic::PrismicClient;

/// A search predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `at(path, "value")`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    fn to_query(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                format!("[at({},{})]", path, quote(value))
            }
        }
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A document search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    /// Restrict returned fields, e.g. `posts.title`
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
}

impl Query {
    /// All documents of a custom type
    pub fn documents_of_type(document_type: &str) -> Self {
        Self {
            predicates: vec![Predicate::at("document.type", document_type)],
            ..Self::default()
        }
    }

    /// The document of a custom type with the given uid
    pub fn by_uid(document_type: &str, uid: &str) -> Self {
        Self {
            predicates: vec![Predicate::at(format!("my.{}.uid", document_type), uid)],
            page_size: Some(1),
            ..Self::default()
        }
    }

    pub fn fetch(mut self, fields: Vec<String>) -> Self {
        self.fetch = fields;
        self
    }

    pub fn page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    /// The `q` parameter, e.g. `[[at(document.type,"posts")]]`
    pub fn predicate_string(&self) -> String {
        let inner: String = self.predicates.iter().map(Predicate::to_query).collect();
        format!("[{}]", inner)
    }
}

/// One page of search results
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    pub results: Vec<Document>,
    /// Opaque token for the following page
    pub next_page: Option<String>,
}

/// Where posts come from
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a search and return its first page
    async fn query(&self, query: &Query) -> Result<ResultPage>;

    /// Follow a `next_page` token from an earlier page
    async fn fetch_next(&self, token: &str) -> Result<ResultPage>;

    /// Fetch a single document; `None` when no document has that uid
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<Document>>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory content source

    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves pre-built pages keyed by token and documents keyed by uid
    #[derive(Default)]
    pub struct MemorySource {
        pub first: Vec<Value>,
        pub first_next: Option<String>,
        pub pages: HashMap<String, (Vec<Value>, Option<String>)>,
        pub documents: Mutex<HashMap<String, Value>>,
        pub fetches: AtomicUsize,
        pub fail_next: bool,
        pub fail_documents: bool,
    }

    impl MemorySource {
        pub fn new(first: Vec<Value>, first_next: Option<&str>) -> Self {
            Self {
                first,
                first_next: first_next.map(str::to_string),
                ..Self::default()
            }
        }

        pub fn with_page(mut self, token: &str, results: Vec<Value>, next: Option<&str>) -> Self {
            self.pages
                .insert(token.to_string(), (results, next.map(str::to_string)));
            self
        }

        pub fn with_document(self, uid: &str, document: Value) -> Self {
            self.set_document(uid, document);
            self
        }

        pub fn set_document(&self, uid: &str, document: Value) {
            self.documents
                .lock()
                .unwrap()
                .insert(uid.to_string(), document);
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn page(results: &[Value], next: &Option<String>) -> ResultPage {
            ResultPage {
                results: results
                    .iter()
                    .map(|v| serde_json::from_value(v.clone()).unwrap())
                    .collect(),
                next_page: next.clone(),
            }
        }
    }

    #[async_trait]
    impl ContentSource for MemorySource {
        async fn query(&self, _query: &Query) -> Result<ResultPage> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Self::page(&self.first, &self.first_next))
        }

        async fn fetch_next(&self, token: &str) -> Result<ResultPage> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_next {
                return Err(CmsError::Status {
                    status: 500,
                    url: token.to_string(),
                });
            }
            match self.pages.get(token) {
                Some((results, next)) => Ok(Self::page(results, next)),
                None => Err(CmsError::InvalidToken {
                    token: token.to_string(),
                    reason: "unknown page".to_string(),
                }),
            }
        }

        async fn get_by_uid(&self, _document_type: &str, uid: &str) -> Result<Option<Document>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_documents {
                return Err(CmsError::Status {
                    status: 503,
                    url: format!("memory://documents/{}", uid),
                });
            }
            let documents = self.documents.lock().unwrap();
            Ok(documents
                .get(uid)
                .map(|v| serde_json::from_value(v.clone()).unwrap()))
        }
    }

    /// A summary record as the list query returns it
    pub fn summary_doc(uid: &str, date: Option<&str>, title: &str) -> Value {
        json!({
            "uid": uid,
            "type": "posts",
            "first_publication_date": date,
            "data": {
                "title": [{"type": "heading1", "text": title, "spans": []}],
                "subtitle": format!("{} subtitle", title),
                "author": [{"type": "paragraph", "text": "Jane", "spans": []}]
            }
        })
    }

    /// A full post with one content block per `(heading, body paragraphs)`
    pub fn post_doc(uid: &str, title: &str, blocks: &[(&str, &[&str])]) -> Value {
        let content: Vec<Value> = blocks
            .iter()
            .map(|(heading, paragraphs)| {
                json!({
                    "heading": heading,
                    "body": paragraphs
                        .iter()
                        .map(|text| json!({"type": "paragraph", "text": text, "spans": []}))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        json!({
            "uid": uid,
            "type": "posts",
            "first_publication_date": "2021-03-25T19:25:28+0000",
            "data": {
                "title": [{"type": "heading1", "text": title, "spans": []}],
                "subtitle": "",
                "author": [{"type": "paragraph", "text": "Jane", "spans": []}],
                "banner": {"url": format!("https://images.prismic.io/{}.png", uid)},
                "content": content
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_predicate() {
        let query = Query::documents_of_type("posts");
        assert_eq!(query.predicate_string(), r#"[[at(document.type,"posts")]]"#);
    }

    #[test]
    fn test_uid_predicate_is_quoted() {
        let query = Query::by_uid("posts", r#"we"ird"#);
        assert_eq!(query.predicate_string(), r#"[[at(my.posts.uid,"we\"ird")]]"#);
        assert_eq!(query.page_size, Some(1));
    }

    #[test]
    fn test_builder() {
        let query = Query::documents_of_type("posts")
            .fetch(vec!["posts.title".to_string()])
            .page_size(Some(5));
        assert_eq!(query.fetch, vec!["posts.title"]);
        assert_eq!(query.page_size, Some(5));
    }
}
