//! Utilities

pub mod timing_log;
