//! Rowcast - spreadsheet ingestion backend for broadcast overlays
//!
//! Upload an Excel workbook, browse its rows, mark one as active, and let a
//! downstream presentation tool (e.g. vMix) poll the selection over HTTP.
//!
//! # Features
//!
//! - Magic-byte signature check before parsing (.xlsx ZIP / legacy .xls OLE2)
//! - First-sheet parsing with normalized column keys and synthesized row ids
//! - In-process row store with import / list / select / reset operations
//! - REST API with CORS and request tracing
//!
//! # Example
//!
//! ```
//! use rowcast::store::RowStore;
//! use rowcast::types::Row;
//!
//! let store = RowStore::new();
//! let mut row = Row::new("row_1");
//! row.insert("name", "Alice");
//! store.import(vec![row], "roster.xlsx");
//!
//! assert_eq!(store.info().count, 1);
//! assert_eq!(store.select(store.list()[0].id()).unwrap().get("name"), Some("Alice"));
//! ```

pub mod api;
pub mod error;
pub mod excel;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{RowcastError, RowcastResult};
pub use store::RowStore;
pub use types::{Row, StoreInfo};
