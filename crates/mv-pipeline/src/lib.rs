//! Assembly pipeline for the montage service.
//!
//! One run goes through four stages, each in its own module:
//!
//! 1. [`fetch`] streams every source URL into a scratch file.
//! 2. [`probe`] checks whether the sources share codec and resolution.
//! 3. [`assemble`] writes the concat manifest and runs the media tool,
//!    stream copy first and transcode as the only fallback.
//! 4. [`publish`] moves the result into the output directory.
//!
//! The [`janitor`] removes downloads and the manifest once assembly has
//! finished, whether it succeeded or not.

pub mod assemble;
pub mod fetch;
pub mod janitor;
pub mod model;
pub mod pipeline;
pub mod probe;
pub mod publish;

#[cfg(any(test, feature = "test-util"))]
pub mod test_fixtures;

pub use assemble::{AssembledVideo, Assembler, ConcatManifest};
pub use fetch::Fetcher;
pub use janitor::Janitor;
pub use model::{AssemblyRequest, AssemblyResult, SourceAsset, MIN_SOURCES};
pub use pipeline::AssemblyPipeline;
pub use publish::{download_url, sanitize_artifact_name, Artifact, Delivery, Publication, Publisher};
