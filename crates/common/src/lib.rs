//! Common utilities and types shared across the speaking coach crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for access token claims and grants
pub mod jwt;
