//! The presence tracker and its configuration.

use std::collections::HashMap;
use std::fmt;

use relaybot_protocol::{ActivityId, PeerId, PeerPresence, PersonaState};

// ---------------------------------------------------------------------------
// WatchedActivity
// ---------------------------------------------------------------------------

/// The activity the bot reports on, with a human-readable label.
///
/// Defaults to Dota 2 (app 570). `activity: None` watches nothing: no
/// notable-activity lines are logged and the watched count stays zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedActivity {
    pub activity: Option<ActivityId>,
    pub label: String,
}

impl WatchedActivity {
    pub fn new(activity: ActivityId, label: impl Into<String>) -> Self {
        Self {
            activity: Some(activity),
            label: label.into(),
        }
    }

    /// Watches nothing.
    pub fn none() -> Self {
        Self {
            activity: None,
            label: String::new(),
        }
    }

    /// Returns `true` if `presence` is online and running this activity.
    pub fn is_playing(&self, presence: &PeerPresence) -> bool {
        presence.state == PersonaState::Online
            && self.activity.is_some()
            && presence.activity == self.activity
    }
}

impl Default for WatchedActivity {
    fn default() -> Self {
        Self::new(ActivityId(570), "Dota 2")
    }
}

// ---------------------------------------------------------------------------
// PresenceSnapshot
// ---------------------------------------------------------------------------

/// Aggregate counts over every known peer.
///
/// Always `watched <= online <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresenceSnapshot {
    /// Peers whose state is `Online`.
    pub online: usize,
    /// All peers ever seen.
    pub total: usize,
    /// Online peers running the watched activity.
    pub watched: usize,
}

impl fmt::Display for PresenceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} people online", self.online, self.total)
    }
}

// ---------------------------------------------------------------------------
// PresenceTracker
// ---------------------------------------------------------------------------

/// One presence record per peer, built from push updates.
///
/// Entries are never removed: a peer that stops sending updates keeps its
/// last known state.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    peers: HashMap<PeerId, PeerPresence>,
    watched: WatchedActivity,
}

impl PresenceTracker {
    /// An empty tracker watching `watched`.
    pub fn new(watched: WatchedActivity) -> Self {
        Self {
            peers: HashMap::new(),
            watched,
        }
    }

    pub fn watched(&self) -> &WatchedActivity {
        &self.watched
    }

    /// Upserts a peer's record.
    ///
    /// State and activity are replaced as sent. A display name is kept
    /// across updates that don't carry one. Logs a line when the peer is
    /// online and playing the watched activity.
    ///
    /// Returns `true` if the update was notable.
    pub fn apply_update(&mut self, mut update: PeerPresence) -> bool {
        if update.name.is_none() {
            update.name = self
                .peers
                .get(&update.peer_id)
                .and_then(|known| known.name.clone());
        }

        let notable = self.watched.is_playing(&update);
        if notable {
            let who = update.name.as_deref().unwrap_or(update.peer_id.as_str());
            tracing::info!(
                peer = %update.peer_id,
                "{who} is playing {}",
                self.watched.label
            );
        } else {
            tracing::trace!(
                peer = %update.peer_id,
                state = ?update.state,
                "presence updated"
            );
        }

        self.peers.insert(update.peer_id.clone(), update);
        notable
    }

    /// Counts online, total, and watched peers in one pass.
    pub fn snapshot(&self) -> PresenceSnapshot {
        self.peers.values().fold(
            PresenceSnapshot {
                total: self.peers.len(),
                ..PresenceSnapshot::default()
            },
            |mut snap, presence| {
                if presence.state == PersonaState::Online {
                    snap.online += 1;
                    if self.watched.is_playing(presence) {
                        snap.watched += 1;
                    }
                }
                snap
            },
        )
    }

    /// The last known presence of `peer`.
    pub fn get(&self, peer: &PeerId) -> Option<&PeerPresence> {
        self.peers.get(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
