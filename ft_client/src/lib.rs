//! Internals of the film tickets terminal client.
//!
//! This library provides command parsing, configuration, logging setup and
//! the interactive session used by the ft_client binary.

pub mod app;
pub mod commands;
pub mod config;
pub mod logging;
