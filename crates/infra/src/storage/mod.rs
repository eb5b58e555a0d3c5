//! Token persistence

pub mod token_file;

pub use token_file::FileTokenStore;
