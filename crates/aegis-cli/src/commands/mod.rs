pub mod claim;
pub mod init;
pub mod settle;
pub mod start;
pub mod status;
