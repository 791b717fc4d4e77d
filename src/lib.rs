//! Observer-satellite look angles and periodic position refresh.

pub mod config;
pub mod geometry;
pub mod observer;
pub mod predict;
pub mod presenter;
pub mod tracking;
