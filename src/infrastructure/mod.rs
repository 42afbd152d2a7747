pub mod db;
pub mod source;
pub mod storage;
