//! Buffered progress notifications
//!
//! Each run owns the only [`Notifier`]. Notifications queue up in an
//! unbounded channel until the observer reads them, so emitting never
//! blocks and an observer that attaches late still sees everything. The
//! [`NotificationStream`] ends once the run has finished and the queue is
//! drained.

use futures::Stream;
use specsmith_types::MessageEvent;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Create a connected notifier/stream pair for one run
pub fn notification_channel() -> (Notifier, NotificationStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Notifier { sender }, NotificationStream { receiver })
}

/// Producer side, held by the run context
#[derive(Debug)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<MessageEvent>,
}

impl Notifier {
    /// Queue a notification for the observer
    pub fn emit(&self, event: MessageEvent) {
        tracing::debug!(msg = %event.msg, "Progress notification");
        if self.sender.send(event).is_err() {
            tracing::trace!("Notification stream dropped, discarding");
        }
    }

    /// Whether an observer still holds the stream
    pub fn is_observed(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Consumer side, handed out once per run
#[derive(Debug)]
pub struct NotificationStream {
    receiver: mpsc::UnboundedReceiver<MessageEvent>,
}

impl NotificationStream {
    /// Wait for the next notification, `None` once the run is over
    pub async fn recv(&mut self) -> Option<MessageEvent> {
        self.receiver.recv().await
    }
}

impl Stream for NotificationStream {
    type Item = MessageEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
