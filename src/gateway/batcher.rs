//! Fixed-capacity buffer of captured chat lines.

use hearsay_core::message::ChatMessage;

/// Collects messages until `capacity` is reached, then hands the whole batch
/// over in arrival order and starts again empty.
pub(super) struct MessageBatcher {
    buffer: Vec<ChatMessage>,
    capacity: usize,
}

impl MessageBatcher {
    pub(super) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a message. Returns the full batch when this message fills it.
    pub(super) fn push(&mut self, message: ChatMessage) -> Option<Vec<ChatMessage>> {
        self.buffer.push(message);
        if self.buffer.len() >= self.capacity {
            Some(std::mem::replace(
                &mut self.buffer,
                Vec::with_capacity(self.capacity),
            ))
        } else {
            None
        }
    }

    /// Drain a partial batch, if any.
    pub(super) fn take(&mut self) -> Option<Vec<ChatMessage>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    pub(super) fn len(&self) -> usize {
        self.buffer.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
