//! Arrival-order handling per conversation
//!
//! Updates are handled on separate tasks, and the per-user mutex alone only
//! gives mutual exclusion: whichever task reaches it first wins. The sequencer
//! chains every update of a conversation behind the previous one, so a user's
//! messages are relayed in the order they arrived. Updates of different
//! conversations never wait for each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use relay_core::{TopicId, Update, UserId};
use tokio::sync::oneshot;

/// Conversation whose updates are handled one after another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKey {
    /// A user's private chat
    User(UserId),
    /// A user's topic in the staff forum
    Topic(TopicId),
}

impl SequenceKey {
    /// `None` for updates outside any single conversation, such as commands
    /// in the general thread
    pub fn of(update: &Update) -> Option<Self> {
        match update {
            Update::Message(msg) | Update::EditedMessage(msg) => {
                if msg.chat.is_private() {
                    msg.sender_id().map(Self::User)
                } else {
                    msg.thread_id.map(Self::Topic)
                }
            }
            Update::Reaction(reaction) if reaction.chat.is_private() => {
                reaction.user.as_ref().map(|user| Self::User(user.id))
            }
            Update::Reaction(_) => None,
        }
    }
}

#[derive(Debug)]
struct Tail {
    seq: u64,
    done: oneshot::Receiver<()>,
}

/// Hands out turns in the order `enqueue` is called
#[derive(Debug, Default)]
pub struct Sequencer {
    tails: Arc<DashMap<SequenceKey, Tail>>,
    next_seq: AtomicU64,
}

impl Sequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next turn for `update`
    ///
    /// Must be called in arrival order, before the update's task is spawned.
    pub fn enqueue(&self, update: &Update) -> Turn {
        let Some(key) = SequenceKey::of(update) else {
            return Turn::unordered();
        };
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (finished, done) = oneshot::channel();
        let previous = self.tails.insert(key, Tail { seq, done });

        Turn {
            slot: Some(Slot {
                key,
                seq,
                tails: Arc::clone(&self.tails),
                _finished: finished,
            }),
            previous: previous.map(|tail| tail.done),
        }
    }

    /// Conversations with an update queued or in progress
    pub fn pending(&self) -> usize {
        self.tails.len()
    }
}

#[derive(Debug)]
struct Slot {
    key: SequenceKey,
    seq: u64,
    tails: Arc<DashMap<SequenceKey, Tail>>,
    // Dropping it wakes the next turn of the conversation
    _finished: oneshot::Sender<()>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        let seq = self.seq;
        self.tails.remove_if(&self.key, |_, tail| tail.seq == seq);
    }
}

/// A place in a conversation's queue, released on drop
#[derive(Debug)]
pub struct Turn {
    slot: Option<Slot>,
    previous: Option<oneshot::Receiver<()>>,
}

impl Turn {
    fn unordered() -> Self {
        Self {
            slot: None,
            previous: None,
        }
    }

    /// Wait until the previous update of the conversation is finished
    pub async fn ready(&mut self) {
        if let Some(previous) = self.previous.take() {
            // The sender is only ever dropped, never used to send
            let _ = previous.await;
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.slot.is_some()
    }
}
