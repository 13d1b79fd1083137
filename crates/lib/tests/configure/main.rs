//! Integration tests driving the whole pipeline from Lua definitions.

mod common;
mod determinism_tests;
mod link_order_tests;
mod resolution_tests;
mod stubs_tests;
mod vndk_tests;
