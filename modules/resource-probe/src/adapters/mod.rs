//! Adapters, one per resource kind.

pub mod datasets;
pub mod files;
pub mod mcp;
pub mod models;
pub mod sql_records;
pub mod tool_groups;
pub mod vector_store_files;
pub mod vector_stores;

pub use datasets::DatasetProbe;
pub use files::FileProbe;
pub use mcp::McpProbe;
pub use models::ModelProbe;
pub use sql_records::SqlRecordProbe;
pub use tool_groups::ToolGroupProbe;
pub use vector_store_files::VectorStoreFileProbe;
pub use vector_stores::VectorStoreProbe;
