//! CLI library components for the conflation tool.

#![deny(unsafe_code)]

pub mod features;
pub mod logging;
