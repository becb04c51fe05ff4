//! Content module - post models, normalization and reading time

mod normalize;
mod post;
pub mod reading_time;

pub use normalize::{BodyMode, Normalizer};
pub use post::{
    Banner, BodyFragment, ContentBlock, DetailData, PostDetail, PostSummary, SummaryData,
};
