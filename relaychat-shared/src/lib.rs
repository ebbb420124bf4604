#![cfg_attr(not(test), forbid(unsafe_code))]
//! Shared wire models and configuration for the relaychat client crates.

pub mod config;
pub mod models;
