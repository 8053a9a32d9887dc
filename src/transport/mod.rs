//! # Direct-Message Transport Seam
//!
//! The radio link is an external collaborator: meshgopher consumes inbound
//! direct-message events and pushes reply text through the [`DmTransport`]
//! trait. Connection handling, reconnection, and Meshtastic protocol details
//! live on the other side of this seam.
//!
//! Two implementations ship with the crate:
//!
//! - [`ChannelTransport`] - hands outbound DMs to an mpsc receiver; used by
//!   tests and by embedders that bridge to a real device elsewhere.
//! - [`ConsoleTransport`] - prints outbound DMs to stdout, paired with
//!   [`spawn_console_reader`] turning stdin lines into events, so `start`
//!   can be exercised end-to-end without a radio.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// An inbound text message event from the mesh.
#[derive(Debug, Clone)]
pub struct DmEvent {
    /// Node id of the sender (e.g. `!abcd1234`).
    pub sender: String,
    /// Decoded message text.
    pub content: String,
    /// True when addressed specifically to our node. Broadcast traffic is
    /// filtered out before any session work happens.
    pub is_direct: bool,
    /// Channel index the message arrived on.
    pub channel: u32,
}

/// The outgoing transport rejected a message.
#[derive(Debug, Error)]
#[error("send failure: {0}")]
pub struct SendFailure(pub String);

/// Outgoing direct-message primitive.
///
/// `send_direct_message` is a fire-and-forget enqueue: success means the
/// transport accepted the message, not that the radio delivered it. The
/// pacing layer relies on this returning promptly; it must never block on
/// delivery acknowledgment.
pub trait DmTransport: Send + Sync {
    fn send_direct_message(&self, dest: &str, text: &str) -> Result<(), SendFailure>;
}

/// An outbound DM captured by [`ChannelTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingDm {
    pub dest: String,
    pub content: String,
}

/// Transport that forwards outbound DMs to an mpsc receiver.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OutgoingDm>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutgoingDm>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DmTransport for ChannelTransport {
    fn send_direct_message(&self, dest: &str, text: &str) -> Result<(), SendFailure> {
        self.tx
            .send(OutgoingDm {
                dest: dest.to_string(),
                content: text.to_string(),
            })
            .map_err(|_| SendFailure("outgoing channel closed".into()))
    }
}

/// Transport that writes outbound DMs to stdout for interactive use.
pub struct ConsoleTransport;

impl DmTransport for ConsoleTransport {
    fn send_direct_message(&self, dest: &str, text: &str) -> Result<(), SendFailure> {
        println!("-> {dest}\n{text}");
        Ok(())
    }
}

/// Spawn a task that turns stdin lines into [`DmEvent`]s from a fixed
/// sender id. EOF closes the channel, which ends the bot's event loop.
pub fn spawn_console_reader(sender_id: &str) -> mpsc::UnboundedReceiver<DmEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    let sender_id = sender_id.to_string();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let event = DmEvent {
                sender: sender_id.clone(),
                content: line,
                is_direct: true,
                channel: 0,
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
    rx
}
