//! Per-connection mailbox and close signal.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::{mpsc, watch};

use crate::net::messages::{Frame, ServerMessage};

pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Sending half of a connection, held by the hub.
///
/// Delivery never waits: a full or closed mailbox fails immediately.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    mailbox: mpsc::Sender<Frame>,
    closer: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a frame. Returns `false` if the mailbox is full or the
    /// connection is gone.
    pub fn deliver(&self, frame: Frame) -> bool {
        !self.is_closed() && self.mailbox.try_send(frame).is_ok()
    }

    /// Serializes and queues a single message.
    pub fn send(&self, message: &ServerMessage) -> bool {
        match message.to_frame() {
            Ok(frame) => self.deliver(frame),
            Err(e) => {
                log::error!("Failed to encode message for connection {}: {}", self.id, e);
                false
            }
        }
    }

    /// Signals the connection's writer to stop.
    pub fn close(&self) {
        self.closer.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closer.borrow() || self.mailbox.is_closed()
    }
}

/// Receiving half of a connection, drained by its socket writer.
#[derive(Debug)]
pub struct ConnectionInbox {
    id: ConnectionId,
    frames: mpsc::Receiver<Frame>,
    closed: watch::Receiver<bool>,
}

impl ConnectionInbox {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next queued frame, or `None` once the connection was closed.
    pub async fn next(&mut self) -> Option<Frame> {
        if *self.closed.borrow() {
            return None;
        }
        tokio::select! {
            biased;
            () = closed(&mut self.closed) => None,
            frame = self.frames.recv() => frame,
        }
    }
}

async fn closed(signal: &mut watch::Receiver<bool>) {
    // An error means every handle was dropped, which also ends the connection.
    let _ = signal.wait_for(|closed| *closed).await;
}

/// Creates a connected handle/inbox pair with room for `capacity` frames.
pub fn channel(capacity: usize) -> (ConnectionHandle, ConnectionInbox) {
    let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    let (mailbox, frames) = mpsc::channel(capacity.max(1));
    let (closer, closed) = watch::channel(false);
    (
        ConnectionHandle {
            id,
            mailbox,
            closer: Arc::new(closer),
        },
        ConnectionInbox { id, frames, closed },
    )
}
