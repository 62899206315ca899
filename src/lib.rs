// Main library entry point for callorder.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;
