//! HTTP route modules for the Atrium server.

pub mod config;
pub mod sys;
