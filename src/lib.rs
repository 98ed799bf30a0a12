pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod targets;
pub mod transform;
