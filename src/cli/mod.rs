pub mod app;
pub mod booking;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod info;
pub mod intents;
pub mod loading_page;
pub mod output;
pub mod plan;
pub mod run;
pub mod runtime;

pub use env::CliArgs;
