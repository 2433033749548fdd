//! Integration tests for pulse-app.
//!
//! These tests verify the interaction between components:
//! - WebSocket connection lifecycle
//! - Command queue flushing across reconnects
//! - Tick flow from the wire into the price store

pub mod common;
