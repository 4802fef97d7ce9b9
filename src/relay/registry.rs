//! Live connections and the username → connection presence map.

use std::{fmt, sync::Arc};

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use super::events::ServerEvent;

/// Events a connection may have queued before it counts as stalled and is
/// dropped.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Outbound half of a connection. Whoever holds a clone can push events to
/// that client.
pub type ConnectionSender = mpsc::Sender<Arc<ServerEvent>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct Inner {
    connections: DashMap<ConnectionId, ConnectionSender>,
    presence: DashMap<String, ConnectionId>,
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, sender: ConnectionSender) -> ConnectionId {
        let id = ConnectionId::new();
        self.inner.connections.insert(id, sender);
        id
    }

    /// Drops the connection's sender and every presence entry still pointing
    /// at it. Returns the released usernames.
    pub fn disconnect(&self, id: ConnectionId) -> Vec<String> {
        self.inner.connections.remove(&id);
        self.remove(id)
    }

    /// Last writer wins. Returns the handle this username pointed at before,
    /// if it was a different one.
    pub fn register(&self, username: &str, id: ConnectionId) -> Option<ConnectionId> {
        self.inner
            .presence
            .insert(username.to_owned(), id)
            .filter(|previous| *previous != id)
    }

    pub fn lookup(&self, username: &str) -> Option<ConnectionId> {
        self.inner.presence.get(username).map(|entry| *entry.value())
    }

    pub fn remove(&self, id: ConnectionId) -> Vec<String> {
        let mut released = Vec::new();
        self.inner.presence.retain(|username, current| {
            if *current == id {
                released.push(username.clone());
                false
            } else {
                true
            }
        });
        released
    }

    pub fn online_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self
            .inner
            .presence
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        users.sort();
        users
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Returns false when the connection is gone or was dropped for falling
    /// behind.
    pub fn send_to(&self, id: ConnectionId, event: Arc<ServerEvent>) -> bool {
        let outcome = match self.inner.connections.get(&id) {
            Some(sender) => sender.try_send(event),
            None => return false,
        };
        self.settle(id, &outcome)
    }

    /// Delivers to every live connection except `except`. Returns how many
    /// connections accepted the event.
    pub fn broadcast(&self, event: Arc<ServerEvent>, except: Option<ConnectionId>) -> usize {
        // collected first: settling may remove entries, which can't happen mid-iteration
        let outcomes: Vec<_> = self
            .inner
            .connections
            .iter()
            .filter(|entry| Some(*entry.key()) != except)
            .map(|entry| (*entry.key(), entry.value().try_send(event.clone())))
            .collect();

        outcomes
            .into_iter()
            .filter(|(id, outcome)| self.settle(*id, outcome))
            .count()
    }

    fn settle(&self, id: ConnectionId, outcome: &Result<(), TrySendError<Arc<ServerEvent>>>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let released = self.disconnect(id);
                tracing::warn!(connection = %id, released = ?released, "outbound queue full, dropping connection");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}
