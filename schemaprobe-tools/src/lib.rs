//! Auxiliary command-line tools shipped next to schemaprobe.
//!
//! - `textpatch`: find-and-replace in one file, written atomically
//! - `httpprobe`: send one HTTP request and print the raw response
//!
//! Both follow the same exit code convention as schemaprobe: 0 for success,
//! 1 for I/O or transport failures, 3 for invalid arguments. `textpatch`
//! additionally exits with 2 when the pattern does not occur.

pub mod error;
pub mod httpprobe;
pub mod textpatch;

pub use error::ToolError;
