//! Presentation layer: askama templates for demo fragments and the page shell.

pub mod views;
