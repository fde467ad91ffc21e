//! Terminal companion for a dental clinic's patient records.
//!
//! Reads patients and their visits from the clinic's Supabase backend, with
//! debounced search, paged loading, a per-patient visit cache and retryable
//! errors.

pub mod app;
pub mod cache;
pub mod companion;
pub mod config;
pub mod event;
pub mod logging;
pub mod remote;
pub mod ui;
