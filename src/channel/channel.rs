//! # Unbounded multi-producer / multi-consumer channel.
//!
//! [`Channel`] is built on [`tokio::sync::mpsc::unbounded_channel`]. The receiving half is
//! shared behind an async [`Mutex`], which turns the single-consumer mpsc into a
//! competing-consumers queue: whichever receiver holds the lock takes the next message.
//!
//! ## Rules
//! - **Never waits on send**: the buffer is unbounded.
//! - **Awaits on receive**: `recv()` parks until a message arrives.
//! - **Exactly-one delivery**: each message goes to one receiver only.
//! - **Global FIFO**: messages leave in enqueue order; which receiver gets which is unspecified.
//! - **Fair hand-off**: tokio's mutex is FIFO, so waiting receivers take turns.
//!
//! ## Example
//! ```rust
//! use poolvisor::{Channel, Message};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ch: Channel<u32> = Channel::new();
//! let tx = ch.sender();
//! tx.send(1).unwrap();
//! tx.terminate().unwrap();
//!
//! let rx = ch.receiver();
//! assert_eq!(rx.next_item().await, Some(1));
//! assert_eq!(rx.next_item().await, None); // marker consumed
//! # }
//! ```

use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::sync::{mpsc, Mutex};

use super::message::Message;
use crate::error::ChannelError;

/// Executor-owned channel holding both halves.
///
/// Because the channel keeps a receiver alive for its whole lifetime, sends through a
/// sender obtained from it only fail after the channel and every [`Receiver`] are dropped.
pub struct Channel<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Channel<T> {
    /// Allocates a new unbounded channel.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Sender { tx },
            rx: Receiver {
                rx: Arc::new(Mutex::new(rx)),
            },
        }
    }

    /// Returns a new producer endpoint.
    pub fn sender(&self) -> Sender<T> {
        self.tx.clone()
    }

    /// Returns a new consumer endpoint competing with every other receiver.
    pub fn receiver(&self) -> Receiver<T> {
        self.rx.clone()
    }

    /// Enqueues an item through the channel's own sender.
    pub fn send(&self, item: T) -> Result<(), ChannelError> {
        self.tx.send(item)
    }

    /// Enqueues one termination marker through the channel's own sender.
    pub fn terminate(&self) -> Result<(), ChannelError> {
        self.tx.terminate()
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer endpoint. Cheap to clone.
pub struct Sender<T> {
    tx: mpsc::UnboundedSender<Message<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Sender<T> {
    /// Enqueues [`Message::Item`]. Returns immediately.
    pub fn send(&self, item: T) -> Result<(), ChannelError> {
        self.tx
            .send(Message::Item(item))
            .map_err(|_| ChannelError::Closed)
    }

    /// Enqueues [`Message::Terminate`]. Returns immediately.
    pub fn terminate(&self) -> Result<(), ChannelError> {
        self.tx
            .send(Message::Terminate)
            .map_err(|_| ChannelError::Closed)
    }

    /// Returns `true` once every receiver is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer endpoint. Clones compete for the same messages.
pub struct Receiver<T> {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Message<T>>>>,
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> Receiver<T> {
    /// Waits for the next message.
    ///
    /// Returns `None` only when every sender is dropped and the buffer is empty.
    pub async fn recv(&self) -> Option<Message<T>> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// Waits for the next item.
    ///
    /// Returns `None` when a termination marker is taken (it is consumed, not re-enqueued)
    /// or when the channel is closed and empty.
    pub async fn next_item(&self) -> Option<T> {
        self.recv().await.and_then(Message::into_item)
    }
}

impl<T: Send + 'static> Receiver<T> {
    /// Drains items as a stream that ends at the first termination marker this receiver takes.
    pub fn into_stream(self) -> impl Stream<Item = T> + Send + 'static {
        stream::unfold(self, |rx| async move {
            let item = rx.next_item().await?;
            Some((item, rx))
        })
    }
}
