pub mod init;
pub mod split;
