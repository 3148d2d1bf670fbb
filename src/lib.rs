pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod scrape;
pub mod text;

pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use report::AnalysisResult;
