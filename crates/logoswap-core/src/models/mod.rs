//! Data models for detections, configuration and reports.

pub mod config;
pub mod detection;
pub mod report;
