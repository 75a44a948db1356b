//! Cinebill - Billing Core for a Subscription Streaming Platform
//!
//! This crate reconciles local subscription and payment state with the
//! payment vendor's webhook-reported truth, and lets administrators grant
//! subscription time directly.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
