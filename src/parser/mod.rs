pub mod bulk_lines;

pub use bulk_lines::{ParsedBatch, ParsedLine, RejectReason, RejectedLine, parse_bulk_lines};
