pub mod app;
pub mod application;
pub mod chunking;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod git;
pub mod progress;
pub mod queue;
pub mod repositories;
pub mod search;
pub mod webserver;
