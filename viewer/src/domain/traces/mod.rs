//! Trace processing pipeline
//!
//! Pure, stateless transformation from raw query-result records to a
//! rendered/exportable view:
//!
//! - `record` - raw record access, key-variant lookup, envelope unwrap
//! - `normalize` - Stage 1: records -> typed Spans and RuntimeLogs
//! - `extract` - Stage 1b: RuntimeLog bodies -> ConversationItems
//! - `aggregate` - Stage 2: group by trace, hierarchy, item buckets
//! - `render` - Stage 3: delta-filtered tree view and session summary
//! - `export` - structured document export
//!
//! The fetch layer (log-store query execution) is outside this module; see
//! `data::query` for the query text it uses.

pub mod aggregate;
mod extract;
pub mod export;
pub mod normalize;
pub mod record;
pub mod render;
pub mod types;
