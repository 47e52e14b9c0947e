// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crossbeam_channel::{Receiver, Sender};

/// An unbounded, thread-safe event channel.
///
/// Generic over the event type so `lode-core` stays free of the event types
/// higher-level crates define.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a bus with an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        log::trace!("EventBus initialized.");
        Self { sender, receiver }
    }

    /// Sends an event, logging an error if the receiver is gone.
    pub fn publish(&self, event: T) {
        if self.sender.send(event).is_err() {
            log::error!("Failed to publish event: receiver disconnected.");
        }
    }

    /// A clone of the sending end, for producers.
    pub fn sender(&self) -> Sender<T> {
        self.sender.clone()
    }

    /// The receiving end, for the owner of the bus.
    pub fn receiver(&self) -> &Receiver<T> {
        &self.receiver
    }

    /// Takes every event currently queued, without blocking.
    ///
    /// Events published while the returned batch is processed are left for the
    /// next drain.
    pub fn drain(&self) -> Vec<T> {
        let pending = self.receiver.len();
        self.receiver.try_iter().take(pending).collect()
    }

    /// Number of events waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no event is waiting.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
