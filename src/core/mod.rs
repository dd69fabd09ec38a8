//! # Core Application Logic
//!
//! This module contains Keystone's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Bootstrapper         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │  identity  │      │   store    │
//!     │  Adapter   │      │  provider  │      │  (JSON)    │
//!     │ (ratatui)  │      │ (Cognito)  │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`bootstrap`]: `SessionStatus` and the startup session check
//! - [`state`]: The `App` struct and the view-selection policy
//! - [`action`]: The `Action` enum and `update()`
//! - [`config`]: Layered configuration and identity profiles
//! - [`store`]: Persisted preferences behind the restored gate
//! - [`i18n`]: Translation dictionary lookups

pub mod action;
pub mod bootstrap;
pub mod config;
pub mod i18n;
pub mod state;
pub mod store;
