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

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::oneshot;

type Callback<E> = Box<dyn FnMut(&E) + Send>;

struct Registry<E> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<E>)>,
}

fn lock<E>(registry: &Mutex<Registry<E>>) -> MutexGuard<'_, Registry<E>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A thread-safe list of callbacks for events of type `E`.
///
/// Cloning a hub yields another handle to the same list. Callbacks run on the
/// emitting thread while the list is locked, so they must not subscribe to or
/// emit into the same hub.
pub struct CallbackHub<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E: 'static> CallbackHub<E> {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Registers `callback`. It stays registered until the returned ticket is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Ticket
    where
        F: FnMut(&E) + Send + 'static,
    {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.callbacks.push((id, Box::new(callback)));
            id
        };

        let weak: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
        Ticket {
            cancel: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    lock(&registry).callbacks.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Invokes every registered callback with `event`.
    pub fn emit(&self, event: &E) {
        let mut registry = lock(&self.registry);
        for (_, callback) in registry.callbacks.iter_mut() {
            callback(event);
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).callbacks.len()
    }

    /// Subscribes a one-shot listener that completes with the first event
    /// accepted by `filter`.
    ///
    /// Dropping the ticket before that happens cancels the listener, and the
    /// receiver then resolves to an error.
    pub fn next_matching<P>(&self, mut filter: P) -> (Ticket, oneshot::Receiver<E>)
    where
        E: Clone + Send,
        P: FnMut(&E) -> bool + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let mut sender = Some(sender);
        let ticket = self.subscribe(move |event| {
            if filter(event) {
                if let Some(sender) = sender.take() {
                    // The waiter may have given up already.
                    let _ = sender.send(event.clone());
                }
            }
        });
        (ticket, receiver)
    }
}

impl<E: 'static> Default for CallbackHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for CallbackHub<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E> fmt::Debug for CallbackHub<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHub")
            .field("subscribers", &lock(&self.registry).callbacks.len())
            .finish()
    }
}

/// A subscription to a [`CallbackHub`]. Dropping it unsubscribes.
#[must_use = "dropping a ticket immediately unsubscribes its callback"]
pub struct Ticket {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    #[test]
    fn emit_reaches_subscribers() {
        let hub = CallbackHub::<u32>::new();
        let total = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&total);
        let _ticket = hub.subscribe(move |value| {
            seen.fetch_add(*value, Ordering::SeqCst);
        });

        hub.emit(&3);
        hub.emit(&4);
        assert_eq!(total.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn dropping_ticket_unsubscribes() {
        let hub = CallbackHub::<u32>::new();
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        let ticket = hub.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hub.subscriber_count(), 1);

        drop(ticket);
        hub.emit(&1);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ticket_outliving_hub_is_harmless() {
        let hub = CallbackHub::<u32>::new();
        let ticket = hub.subscribe(|_| {});
        drop(hub);
        drop(ticket);
    }

    #[tokio::test]
    async fn next_matching_completes_from_another_thread() {
        let hub = CallbackHub::<u32>::new();
        let (ticket, receiver) = hub.next_matching(|value| *value > 10);

        let emitter = hub.clone();
        let handle = thread::spawn(move || {
            emitter.emit(&1);
            emitter.emit(&42);
            emitter.emit(&99);
        });

        assert_eq!(receiver.await.unwrap(), 42);
        handle.join().unwrap();
        drop(ticket);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_listener_resolves_to_error() {
        let hub = CallbackHub::<u32>::new();
        let (ticket, receiver) = hub.next_matching(|_| true);
        drop(ticket);
        assert!(receiver.await.is_err());
    }
}
