//! Core types for the crm-chat front-end
//!
//! This crate provides the session store, configuration, and logging
//! infrastructure shared by the other crm-chat components.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use error::{Error, Result};
