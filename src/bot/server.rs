//! Event loop and per-user dispatch.
//!
//! [`GopherBot`] consumes direct-message events from the transport seam and
//! hands each one to a task bound to the sending node. All work for one
//! user happens under that user's session lock, so rapid-fire commands from
//! the same node are applied strictly in order while different users'
//! fetches and paced sends overlap freely.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::Duration;

use super::chunker::Pacer;
use super::router::CommandRouter;
use super::session::SessionStore;
use crate::config::Config;
use crate::gopher::GopherClient;
use crate::logutil::escape_log;
use crate::transport::{DmEvent, DmTransport, SendFailure};

pub struct GopherBot {
    config: Config,
    sessions: Arc<SessionStore>,
    router: Arc<CommandRouter>,
    pacer: Pacer,
}

impl GopherBot {
    pub fn new(config: Config, transport: Arc<dyn DmTransport>) -> Self {
        let client = GopherClient::new(&config.gopher);
        let router = Arc::new(CommandRouter::new(client, config.clone()));
        let pacer = Pacer::new(transport, &config.delivery);
        Self {
            config,
            sessions: Arc::new(SessionStore::new()),
            router,
            pacer,
        }
    }

    /// Main event loop: processes inbound DMs until the event channel
    /// closes or a shutdown signal arrives. A periodic tick drives idle
    /// session eviction even when no events come in.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<DmEvent>) -> Result<()> {
        info!("'{}' event loop started", self.config.bot.name);

        let mut periodic = tokio::time::interval(Duration::from_secs(60));
        periodic.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = periodic.tick() => {
                    let timeout_min = self.config.bot.session_idle_minutes as i64;
                    let evicted = self.sessions.evict_idle(timeout_min);
                    if evicted > 0 {
                        info!("evicted {} idle session(s), {} active", evicted, self.sessions.len());
                    }
                }

                event = events.recv() => {
                    match event {
                        Some(event) => self.dispatch(event),
                        None => {
                            info!("event channel closed; shutting down");
                            break;
                        }
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Hand one inbound event to a task bound to its sender. Broadcast and
    /// other non-direct traffic is dropped here, before any session work.
    pub fn dispatch(&self, event: DmEvent) {
        if !event.is_direct {
            debug!(
                "ignoring non-direct message from {}",
                escape_log(&event.sender)
            );
            return;
        }

        let session = self.sessions.get_or_create(&event.sender);
        let router = Arc::clone(&self.router);
        let pacer = self.pacer.clone();

        tokio::spawn(async move {
            // Holding the session lock across the fetch and the paced send
            // serializes this user's commands and keeps their replies in
            // order. No other user's lock is ever taken here.
            let mut session = session.lock().await;
            let reply = router.handle(&mut session, &event.content).await;
            if let Err(e) = pacer.send(&session.user_id, &reply).await {
                warn!(
                    "reply to {} not fully delivered: {}",
                    escape_log(&session.user_id),
                    e
                );
            }
        });
    }

    /// Process one direct message to completion on the caller's task.
    /// Used by integration tests and embedders that need the reply fully
    /// delivered before continuing.
    pub async fn handle_dm(&self, sender: &str, content: &str) -> Result<(), SendFailure> {
        let session = self.sessions.get_or_create(sender);
        let mut session = session.lock().await;
        let reply = self.router.handle(&mut session, content).await;
        self.pacer.send(&session.user_id, &reply).await
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
