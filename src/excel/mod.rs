//! Excel ingestion: upload signature sniffing and sheet-to-row parsing.
//!
//! `check_signature` runs on the raw upload bytes before any parsing;
//! `parse` turns a verified buffer into ordered [`Row`](crate::types::Row)
//! records; `validate` is a final structural sanity check on the batch.

mod parser;
mod signature;

pub use parser::{parse, validate};
pub use signature::{check_signature, SignatureCheck, MAX_UPLOAD_SIZE};
