pub mod config;
pub mod dataset;
pub mod error;
pub mod experiment_log;
pub mod provider;
pub mod report;
pub mod runner;
