//! Request handler module
//!
//! Routing dispatch and static file serving. The route table is fixed:
//! the root path returns the configured root document, every other path
//! falls through to the public asset directory.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
