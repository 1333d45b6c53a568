//! Post-mastectomy radiotherapy risk calculator.
//!
//! Loads a fitted logistic model from static tables, builds the input form from
//! per-feature metadata, resolves missing answers to fallback averages, and
//! scores a single submission.

pub mod calculator;
pub mod config;
pub mod error;
pub mod telemetry;
