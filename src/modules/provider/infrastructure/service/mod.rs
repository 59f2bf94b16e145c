pub mod aggregation;
pub mod streaming_resolver;

pub use aggregation::{SearchAggregator, SourceOutcome};
pub use streaming_resolver::{ResolverConfig, StreamingResolver};
