use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmsError {
    /// Transport failure; the request URL, which may carry the access token, is stripped
    #[error("Request to content repository failed: {0}")]
    Http(reqwest::Error),

    #[error("Content repository returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response from content repository: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Content repository has no master ref")]
    NoMasterRef,

    #[error("Invalid pagination token {token:?}: {reason}")]
    InvalidToken { token: String, reason: String },

    #[error("Invalid content repository endpoint {0:?}")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for CmsError {
    fn from(err: reqwest::Error) -> Self {
        CmsError::Http(err.without_url())
    }
}

pub type Result<T> = std::result::Result<T, CmsError>;
