//! HTTP protocol layer module
//!
//! Protocol-level building blocks (content types, conditional requests,
//! range parsing, response builders) kept separate from the routing and
//! file-serving logic.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_416_response,
    build_500_response, build_options_response,
};
