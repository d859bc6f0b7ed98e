//! Transcript ingestion: segmentation and the segment-embed-store pipeline

pub mod pipeline;
pub mod segmenter;

pub use pipeline::IngestionPipeline;
pub use segmenter::Segmenter;
