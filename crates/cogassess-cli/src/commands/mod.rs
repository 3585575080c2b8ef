pub mod config;
pub mod items;
pub mod run;
pub mod session;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
