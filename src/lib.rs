//! Load harness for tiered inference gateways.
//!
//! A run draws credentials per tier, drives one of three load shapes
//! (burst, soak, rate-limit probe) against the gateway, classifies every
//! response, and gates the result on latency and success thresholds. The
//! `tierstress` binary is the primary interface.
pub mod args;
pub mod classify;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod plan;
pub mod runner;
pub mod shutdown;
pub mod summary;
pub mod threshold;
