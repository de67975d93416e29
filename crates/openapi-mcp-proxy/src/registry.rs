//! Registry of live SSE sessions.
//!
//! Maps a session id to its channel so `POST`ed messages can be routed to the
//! right server instance. A session is registered when its stream opens and
//! removed when the channel reports that it closed.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use openapi_mcp_server::SseChannel;

/// Session id to channel map, shared between the `GET` and `POST` routes.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, SseChannel>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel under its session id. Returns `false` if the id is taken.
    pub fn insert(&self, channel: SseChannel) -> bool {
        match self.sessions.entry(channel.session_id().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(channel);
                true
            }
        }
    }

    /// Insert `channel` and remove it again once it closes.
    ///
    /// If the channel is already closed it is removed immediately.
    pub fn register(&self, channel: &SseChannel) -> bool {
        if !self.insert(channel.clone()) {
            return false;
        }

        let sessions: Weak<DashMap<String, SseChannel>> = Arc::downgrade(&self.sessions);
        let session_id = channel.session_id().to_string();
        channel.on_close(move || {
            if let Some(sessions) = sessions.upgrade()
                && sessions.remove(&session_id).is_some()
            {
                tracing::debug!(%session_id, "session removed from registry");
            }
        });
        true
    }

    /// Look up a live session.
    pub fn get(&self, session_id: &str) -> Option<SseChannel> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    /// Remove a session. Removing an unknown id is a no-op.
    pub fn remove(&self, session_id: &str) -> Option<SseChannel> {
        self.sessions.remove(session_id).map(|(_, channel)| channel)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every live session, ending their event streams.
    pub fn close_all(&self) {
        let channels: Vec<SseChannel> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for channel in channels {
            channel.close();
        }
    }
}
