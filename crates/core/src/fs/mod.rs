//! FileSystem abstraction for testable file operations

mod mock;
mod real;
mod r#trait;

pub use mock::{FsOperation, MockFileSystem};
pub use r#trait::{FileSystem, FileType};
pub use real::RealFileSystem;
