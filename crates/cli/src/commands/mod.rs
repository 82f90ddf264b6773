pub mod chat;
pub mod config_cmd;
pub mod search;
pub mod serve;
pub mod tools;
