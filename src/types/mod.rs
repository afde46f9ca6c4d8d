//! Shared type definitions
//!
//! This module contains the configuration and generation types used across the service.

pub mod config;
pub mod generation;
