//! Nearest-neighbor retrieval

pub mod search;

pub use search::{Retriever, DEFAULT_TOP_K};
