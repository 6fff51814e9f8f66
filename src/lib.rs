//! Chemical inventory library
//!
//! An inventory ledger of laboratory chemicals kept consistent with a remote
//! record store, plus an append-only audit trail of usage and stock corrections.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod models;
pub mod notifications;
pub mod repositories;
pub mod services;

pub use errors::ServiceError;
pub use services::{AuditTrail, InventoryLedger, LedgerSettings};
