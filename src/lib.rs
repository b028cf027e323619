//! cachekit: Lazily Generated Image Renditions
//!
//! Derived image files ("artifacts") are named deterministically, produced at
//! most once per storage state and tracked by a positive generation cache.
//! Generators register under colon-delimited ids; batch sweeps select them with
//! segment-aware wildcard patterns.

pub mod artifact;
pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod lifecycle;
pub mod logging;
pub mod orchestrator;
pub mod pattern;
pub mod registry;
pub mod storage;
