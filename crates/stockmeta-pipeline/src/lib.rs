//! stockmeta-pipeline: metadata generation for stock media.
//!
//! One file flows through [`synthesize::Synthesizer`]: a sample is taken,
//! keyword lists for every platform and the bilingual title/description are
//! requested concurrently, then the keyword lists are translated with their
//! positions preserved. [`batch::run_batch`] drives the synthesizer over a
//! selection, one file at a time, recording results in [`state::AppState`].

pub mod batch;
pub mod edit;
pub mod istock;
pub mod keywords;
pub mod parse;
pub mod prompts;
pub mod state;
pub mod synthesize;
pub mod translate;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchError, BatchProgress, BatchSummary, run_batch};
pub use state::AppState;
pub use synthesize::Synthesizer;
