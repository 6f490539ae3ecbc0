mod exporter;
mod item_pipeline;
mod record;
mod summarizer;
pub use exporter::*;
pub use item_pipeline::*;
pub use record::*;
pub use summarizer::*;
