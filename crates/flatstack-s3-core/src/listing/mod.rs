//! Bucket listing: request parsing, the single-call page fetch with
//! lookahead, and response assembly for the three listing contracts.

pub mod assembler;
pub mod invoker;
pub mod parser;

pub use assembler::ResultAssembler;
pub use invoker::invoke_listing;
pub use parser::{ParsedListing, parse_listing_request};
