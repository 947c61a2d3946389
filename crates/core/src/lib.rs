//! Core business logic for Ferrobank.
//!
//! This crate provides the pure, storage-agnostic pieces of the system:
//! - Session token creation and verification ([`token`])
//! - Password hashing ([`auth`])
//! - Supported currency validation ([`currency`])
//!
//! It deliberately carries zero web or database dependencies.

pub mod auth;
pub mod currency;
pub mod token;

pub use token::{TokenError, TokenMaker, TokenPayload};
