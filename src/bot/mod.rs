//! # Bot Core Module
//!
//! Everything between an inbound DM and the paced reply lives here:
//!
//! - [`server`] - Event loop and per-user task dispatch
//! - [`session`] - Navigation state per remote node, with per-user locking
//! - [`router`] - Command grammar and the session state machine
//! - [`pager`] - Page math over menus and file bodies
//! - [`chunker`] - UTF-8 safe chunk splitting and paced ordered delivery
//!
//! ## Data Flow
//!
//! ```text
//! DmEvent ──► GopherBot ──► Session (per-user lock)
//!                              │
//!                        CommandRouter ──► GopherClient / Pager
//!                              │
//!                          reply text ──► Pacer ──► DmTransport
//! ```
//!
//! Commands from different users run fully in parallel; all processing of
//! one user's messages is serialized by that session's async mutex, so two
//! rapidly fired commands can never interleave state transitions.

pub mod chunker;
pub mod pager;
pub mod router;
pub mod server;
pub mod session;

pub use server::GopherBot;
