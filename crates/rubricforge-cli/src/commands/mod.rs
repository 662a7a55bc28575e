pub mod batch;
pub mod evaluate;
pub mod init;
pub mod merge;
pub mod validate;
