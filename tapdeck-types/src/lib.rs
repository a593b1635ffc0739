//! # Tapdeck Types
//!
//! Fundamental type definitions shared across the tapdeck firmware crates.
//!
//! - [`modifier`] - the 8-bit HID modifier bitfield and helpers
//! - [`keycode`] - HID usage ids and the symbolic-name / character lookup
//!   tables used by the layout DSL
//!
//! The crate is `no_std` and allocation-free so it can be used from the
//! firmware core, host-side tooling and tests alike.

#![no_std]

pub mod keycode;
pub mod modifier;
