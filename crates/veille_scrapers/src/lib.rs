pub mod adapters;
pub mod dates;
pub mod fetch;
pub mod pipeline;

pub use adapters::{adapter_for, Extracted, SourceAdapter};
pub use fetch::Fetcher;
pub use pipeline::{Pipeline, RunOptions};
