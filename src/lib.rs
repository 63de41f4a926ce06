//! attendance-kiosk library crate.
//!
//! Client-side attendance capture: drives a camera device, captures a still
//! frame, submits it to a face-recognition service and reconciles the result
//! into observable workflow status.

pub mod api;
pub mod config;
pub mod device;
pub mod workflow;
