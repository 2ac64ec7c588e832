//! # Printer Module
//!
//! This module provides label geometry for the target printer.
//!
//! ## Modules
//!
//! - [`config`]: Label size, gap, and resolution

pub mod config;

pub use config::LabelSpec;
