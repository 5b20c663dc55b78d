pub mod aggregate;
pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod gate;
pub mod merge;
pub mod model;
pub mod parsers;
pub mod report;
pub mod runner;
