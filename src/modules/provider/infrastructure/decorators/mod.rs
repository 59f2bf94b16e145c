pub mod source_adapter;

pub use source_adapter::{CallOutcome, SourceAdapter, StreamAttempt};
