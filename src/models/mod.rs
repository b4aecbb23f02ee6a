//! Data models for schemadex.
//!
//! Plain data carried by the index: catalog facts per table and the guide
//! document attached to a schema. All types serialize to the cache document
//! layout (`columns`/`sample_rows`, `file`/`content`).

mod guide;
mod table;

pub use guide::GuideInfo;
pub use table::{ColumnInfo, TableInfo};
