//! Personal tracker for daily habits. Every day starts from a fixed set of activities that
//! can be checked off, given an amount and annotated. Days are saved per user into a local
//! key-value store and summarized into daily and all time completion.
//!

pub mod activity;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod storage;
pub mod utils;
