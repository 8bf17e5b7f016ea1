#[macro_use]
extern crate log;

pub mod cli;
pub mod env;
pub mod error;
pub mod launcher;
pub mod logger;
pub mod ports;
pub mod procs;
pub mod reclaim;
pub mod server_config;
pub mod server_status;
pub mod shell;
pub mod supervisor;
pub mod ui;
pub mod web;

pub use miette::Result;
