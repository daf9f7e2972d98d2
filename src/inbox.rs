//! Priority-ordered mailbox for traffic controllers.
//!
//! Messages arrive over a plain mpsc channel; the inbox reorders whatever has
//! already arrived so that higher-priority kinds are acted on first, while
//! messages of equal priority keep their arrival order. Airplanes read their
//! channels directly and need none of this.

use crate::message::Message;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;
use tokio::sync::mpsc;

/// Outcome of waiting on an empty inbox.
#[derive(Debug, PartialEq, Eq)]
pub enum InboxWait {
    /// A message arrived and was queued.
    Message,
    /// The wait interval elapsed with no mail.
    TimedOut,
    /// All senders are gone.
    Closed,
}

struct QueuedMessage {
    priority: u8,
    seq: u64,
    message: Message,
}

impl PartialEq for QueuedMessage {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedMessage {}

impl PartialOrd for QueuedMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: highest priority first, then lowest sequence number so
        // equal priorities stay FIFO.
        self.priority
            .cmp(&other.priority)
            .then(other.seq.cmp(&self.seq))
    }
}

/// Receiving half of a controller mailbox.
pub struct PriorityInbox {
    rx: mpsc::UnboundedReceiver<Message>,
    pending: BinaryHeap<QueuedMessage>,
    next_seq: u64,
}

/// Creates a controller mailbox; the sender half goes into the registry.
pub fn channel() -> (mpsc::UnboundedSender<Message>, PriorityInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        tx,
        PriorityInbox {
            rx,
            pending: BinaryHeap::new(),
            next_seq: 0,
        },
    )
}

impl PriorityInbox {
    fn queue(&mut self, message: Message) {
        let priority = message.kind.priority();
        self.pending.push(QueuedMessage {
            priority,
            seq: self.next_seq,
            message,
        });
        self.next_seq += 1;
    }

    /// Pulls everything that has already arrived into the priority queue.
    pub fn drain_pending(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.queue(message);
        }
    }

    /// Removes and returns the highest-priority queued message.
    pub fn pop(&mut self) -> Option<Message> {
        self.pending.pop().map(|queued| queued.message)
    }

    /// Waits up to `interval` for new mail on an empty inbox.
    pub async fn wait_for_message(&mut self, interval: Duration) -> InboxWait {
        match tokio::time::timeout(interval, self.rx.recv()).await {
            Ok(Some(message)) => {
                self.queue(message);
                InboxWait::Message
            }
            Ok(None) => InboxWait::Closed,
            Err(_) => InboxWait::TimedOut,
        }
    }
}
