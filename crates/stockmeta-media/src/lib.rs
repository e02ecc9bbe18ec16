//! stockmeta-media: media sampling, thumbnails, and the AI/keyword providers.

pub mod normalize;
pub mod providers;
pub mod scan;
pub mod thumbnail;
pub mod types;

pub use normalize::MediaNormalizer;
pub use scan::scan_folder;
pub use types::{CompletionRequest, KeywordScorer, Sample, ScoredKeyword, VisionProvider};
