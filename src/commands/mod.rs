pub mod auth;
pub mod init;
pub mod run;
pub mod slots;
