pub mod config;
pub mod document;
pub mod types;

pub use config::SvctreeConfig;
pub use document::ServiceDocument;
pub use types::*;
