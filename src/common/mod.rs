pub mod error;
pub mod filename;
pub mod response;
