//! mmu-cfg: MMU configuration builder
//!
//! A library for rendering versioned configuration templates, carrying
//! user-edited values over from a previous install, and upgrading old
//! installs across schema changes.

pub mod build;
pub mod config;
pub mod parser;
pub mod render;
pub mod section;
pub mod store;
pub mod sync;
pub mod upgrade;
