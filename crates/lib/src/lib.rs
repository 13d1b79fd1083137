//! modgraph-lib: module graph configuration
//!
//! This crate turns declarative module definitions into a fully resolved
//! variant graph:
//! - `props`: property bags, `defaults` inheritance and overlays
//! - `module`: module types, their schemas and definition checks
//! - `mutator`: the pass chain splitting modules into variants
//! - `resolve`: binding dependency edges to variants
//! - `link`: static link ordering
//! - `policy`: VNDK and double-loadable boundary checks
//! - `configure`: the pipeline tying these together
//! - `actions`: build actions generated from a configured graph

pub mod actions;
pub mod config;
pub mod configure;
pub mod consts;
pub mod eval;
pub mod graph;
pub mod link;
pub mod lua;
pub mod module;
pub mod mutator;
pub mod platform;
pub mod policy;
pub mod props;
pub mod resolve;
pub mod util;
