//! # Sync Engine
//!
//! Keeps the view of a user's chatbot conversations in step with the service
//! and carries out what the user does against it.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • ViewState (watch)    │
//!                    │  • pollers + scheduler  │
//!                    │  • send / delete        │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    CLI     │      │  Chatbot   │      │  Identity  │
//!     │  Adapter   │      │  backend   │      │   store    │
//!     │ (stdin)    │      │ (reqwest)  │      │  (files)   │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`controller`]: `ChatController`, the entry point for a rendering layer
//! - [`state`]: `ViewState`, everything the view shows
//! - [`scheduler`]: named, cancellable poll timers

pub mod active_poller;
pub mod config;
pub mod context;
pub mod controller;
pub mod deletion;
pub mod dialog;
pub mod dispatcher;
pub mod identity;
pub mod list_poller;
pub mod scheduler;
pub mod state;

pub use controller::ChatController;
pub use deletion::DeleteOutcome;
pub use dispatcher::SendOutcome;
