//! Shared types and configuration for Ferrobank.
//!
//! This crate provides common types used across all other crates:
//! - Configuration management
//! - Auth request/response payloads
//! - Pagination types for list endpoints

pub mod auth;
pub mod config;
pub mod types;

pub use config::{AppConfig, TokenVariant};
