//! # TUI Components
//!
//! UI building blocks for the terminal interface.
//!
//! ## Component Architecture
//!
//! Components in this directory follow two patterns:
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as parameters:
//! - `TitleBar`: top status bar with profile, language, status or error
//! - `LoadingView`: spinner shown until the session status settles
//!
//! ### Stateful Components (Event-Driven)
//!
//! Persistent state lives in `TuiState`; a transient wrapper borrows it each
//! frame to render:
//! - `AuthNavigatorState` / `AuthNavigator`: sign-in, sign-up, confirm
//! - `HomeNavigatorState` / `HomeNavigator`: home and settings drawer
//! - `Form` / `TextField`: the input fields both navigators are built from
//!
//! ### Props-Based Data Flow
//!
//! Components receive external data as "props" (function parameters), not by
//! reading `App` directly. This makes dependencies explicit and components
//! testable with a `TestBackend`.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs             (this file)
//! ├── title_bar.rs       (top status bar)
//! ├── loading.rs         (startup spinner)
//! ├── text_field.rs      (single-line input + form focus)
//! ├── auth_navigator.rs  (unauthenticated screens)
//! └── home_navigator.rs  (authenticated screens)
//! ```

pub mod auth_navigator;
pub mod home_navigator;
mod loading;
pub mod text_field;
mod title_bar;

pub use auth_navigator::{AuthEvent, AuthNavigator, AuthNavigatorState};
pub use home_navigator::{HomeEvent, HomeNavigator, HomeNavigatorState, HomeProps};
pub use loading::LoadingView;
pub use title_bar::TitleBar;
