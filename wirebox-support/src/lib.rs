//! # Wirebox Support
//!
//! Shared utilities for the Wirebox DI container.
//!
//! This crate provides text rendering for diagnostics: short type names,
//! binding labels, resolution paths and suggestion ranking.

pub mod rendering;
