// Storewise - store classification backend
//
// This crate provides the backend that onboards e-commerce stores, keeps
// per-store platform credentials, and reprocesses product classification
// data in the background. The job orchestration core lives in kernel/jobs,
// the category discovery engine in domains/discovery.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
