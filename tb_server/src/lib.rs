//! HTTP server for the table booking engine.
//!
//! Exposes the booking lifecycle over a JSON API authenticated with Discord
//! OAuth tokens, and wires the engine to PostgreSQL storage and Discord
//! announcements.

/// HTTP routes, handlers and middleware.
pub mod api;

/// Environment configuration.
pub mod config;

/// Tracing subscriber setup and security event logging.
pub mod logging;
