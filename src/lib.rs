//! Catalog administration core.
//!
//! This crate implements the client-side engine of an e-commerce admin
//! console: reconciling a hierarchical category tree into renderable rows
//! (flattening, expand/collapse state, search with ancestor inclusion,
//! structural queries for safe re-parenting and deletion) and keeping a
//! product form's price and inventory fields mutually consistent
//! (cost/base/current price derivation, profit and discount clamping).
//!
//! The engines in [`catalog`] and [`pricing`] are pure and synchronous; all
//! I/O is delegated to the backend category and product services behind the
//! async traits in [`services`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod catalog;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod pricing;
pub mod services;
