//! Publish Carousel - continuous re-publication of native content
//!
//! Long-running cycles sweep collections in a native document store and
//! re-publish every document to a downstream notifier, each at its own pace,
//! with progress checkpointed so a restart resumes where it left off.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
