//! # Meshgopher - Gopher Browsing for Meshtastic Networks
//!
//! Meshgopher lets anyone on a Meshtastic mesh browse Gopherspace by direct
//! message. Users DM short commands to the bot's node and receive paged,
//! chunked replies sized for LoRa frames.
//!
//! ## Features
//!
//! - **Compact Command UI**: Single-letter navigation (`u <url>`, `n`, `p`,
//!   `b`, digits, `s <terms>`) with contextual prompts and inline help.
//! - **Minimal Gopher Client**: Menu, file, and search retrieval with
//!   defensive parsing of the loosely-typed menu wire format.
//! - **Per-User Sessions**: Independent navigation state per node, with
//!   history, paged listings, and pending-search tracking.
//! - **Ordered Delivery**: UTF-8 safe chunking with paced sends so
//!   multi-frame replies arrive in order over an unacknowledged transport.
//! - **Async Design**: Built with Tokio; one slow remote server never
//!   stalls another user's session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshgopher::config::Config;
//! use meshgopher::bot::GopherBot;
//! use meshgopher::transport::ChannelTransport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let (transport, _outgoing) = ChannelTransport::new();
//!     let (_events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
//!     let mut bot = GopherBot::new(config, Arc::new(transport));
//!     bot.run(events_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bot`] - Core navigation logic: sessions, pager, command router, chunked delivery
//! - [`gopher`] - Gopher protocol client and wire-format parsing
//! - [`transport`] - Direct-message transport seam (channel and console implementations)
//! - [`config`] - Configuration management
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   GopherBot     │ ← Event loop, per-user dispatch
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Command Router │ ← Session state machine
//! └─────────────────┘
//!     │           │
//! ┌────────┐ ┌─────────────┐
//! │ Gopher │ │ Chunker /   │
//! │ Client │ │ Pacer       │
//! └────────┘ └─────────────┘
//! ```
//!
//! The underlying radio link is deliberately out of scope: the bot consumes
//! direct-message events and emits replies through the [`transport`] seam,
//! so any Meshtastic integration (serial, TCP, test harness) can drive it.

pub mod bot;
pub mod config;
pub mod gopher;
pub mod logutil;
pub mod transport;
