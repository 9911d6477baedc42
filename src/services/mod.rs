pub mod providers;
pub mod recommendations;

pub use providers::{CatalogProvider, CompletionProvider, ProviderError};
pub use recommendations::{PipelineSettings, RecommendationService};
