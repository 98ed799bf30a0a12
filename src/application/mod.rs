//! Application services layer.

pub mod demo;
pub mod error;
pub mod revalidate;
