//! Test Helper Utilities
//!
//! Shared utilities for testing rackscan-common

#![allow(dead_code)]

pub mod log_capture;

pub use log_capture::{LogCapture, LogRecord};
