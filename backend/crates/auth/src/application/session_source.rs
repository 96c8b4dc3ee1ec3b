//! Session Source
//!
//! Request-scoped view of "who is signed in". The gate creates one
//! [`SessionHandle`] per request and hands it to downstream handlers, which
//! read it or subscribe to changes (sign-out publishes `None`).

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::identity::Identity;

/// Callback invoked with the new identity after every change
pub type SessionCallback = Box<dyn Fn(Option<&Identity>) + Send + 'static>;

/// Read access to the current session
pub trait SessionSource {
    fn current(&self) -> Option<Identity>;

    /// Register `callback`; it runs until the subscription is dropped
    fn on_change(&self, callback: SessionCallback) -> SessionSubscription;
}

/// Watch-channel backed session source
#[derive(Clone)]
pub struct SessionHandle {
    sender: Arc<watch::Sender<Option<Identity>>>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("current", &*self.sender.borrow())
            .finish()
    }
}

impl SessionHandle {
    pub fn new(identity: Option<Identity>) -> Self {
        let (sender, _) = watch::channel(identity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Replace the identity and notify subscribers
    pub fn publish(&self, identity: Option<Identity>) {
        self.sender.send_replace(identity);
    }

    /// Receiver for async consumers
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.sender.subscribe()
    }
}

impl SessionSource for SessionHandle {
    fn current(&self) -> Option<Identity> {
        self.sender.borrow().clone()
    }

    fn on_change(&self, callback: SessionCallback) -> SessionSubscription {
        let mut receiver = self.sender.subscribe();
        let task = tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let identity = receiver.borrow_and_update().clone();
                callback(identity.as_ref());
            }
        });
        SessionSubscription { task }
    }
}

/// Active `on_change` registration; dropping it unsubscribes
#[derive(Debug)]
pub struct SessionSubscription {
    task: JoinHandle<()>,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
