//! Lua definitions front-end.
//!
//! Definitions files are Lua scripts. Every registered module type is a
//! global function taking a property table, and a `modgraph` table exposes
//! the host platform and configuration overrides.
//!
//! # Submodules
//!
//! - [`convert`] - Lua values to property bags
//! - [`globals`] - Module type functions and the `modgraph` table
//! - [`runtime`] - Lua VM setup and file loading

pub mod convert;
pub mod globals;
pub mod runtime;
