//! Core infrastructure for broker-reconnect.
//!
//! This crate provides the pieces shared by the connector and its adapters:
//! - Event system for observing connection lifecycle transitions
//! - The broker reply-code table used to classify connection closes

pub mod events;
pub mod reply_code;

pub use events::{EventListener, EventListeners, FnListener, LifecycleEvent};
