//! In-process room registry for real-time fan-out.
//!
//! Each live connection owns a bounded outbound channel and a set of rooms.
//! The registry keeps both directions of that relation so a broadcast only
//! touches the members of one room. State lives in process memory and is lost
//! on restart.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use bandstand_domain::error::BandstandError;
use bandstand_domain::id::UserId;
use bandstand_domain::notification::{Notification, Room};

use crate::ports::Notifier;

/// Handle for one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct Connection {
    user: UserId,
    rooms: HashSet<Room>,
    sender: mpsc::Sender<Notification>,
}

#[derive(Default)]
struct RegistryState {
    rooms: HashMap<Room, HashSet<ConnectionId>>,
    connections: HashMap<ConnectionId, Connection>,
}

/// Room → connections map with per-connection bounded queues.
///
/// The lock is never held across an `.await`; delivery uses `try_send`, so a
/// slow consumer loses notifications instead of stalling the sender.
pub struct RoomRegistry {
    buffer: usize,
    next_id: AtomicU64,
    state: Mutex<RegistryState>,
}

impl RoomRegistry {
    /// Create a registry whose connections buffer up to `buffer` notifications.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            next_id: AtomicU64::new(1),
            state: Mutex::new(RegistryState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection of `user` subscribed to `rooms`.
    ///
    /// Returns its id and the receiving end of its outbound queue.
    pub fn connect(
        &self,
        user: UserId,
        rooms: impl IntoIterator<Item = Room>,
    ) -> (ConnectionId, mpsc::Receiver<Notification>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.buffer);
        let rooms: HashSet<Room> = rooms.into_iter().collect();

        let mut state = self.lock();
        for room in &rooms {
            state.rooms.entry(*room).or_default().insert(id);
        }
        tracing::debug!(
            connection = %id,
            user_id = %user,
            rooms = rooms.len(),
            "connection registered"
        );
        state.connections.insert(
            id,
            Connection {
                user,
                rooms,
                sender,
            },
        );
        (id, receiver)
    }

    /// Remove a connection from every room it joined. Unknown ids are ignored.
    pub fn disconnect(&self, id: ConnectionId) {
        let mut state = self.lock();
        let Some(connection) = state.connections.remove(&id) else {
            return;
        };
        for room in connection.rooms {
            if let Some(members) = state.rooms.get_mut(&room) {
                members.remove(&id);
                if members.is_empty() {
                    state.rooms.remove(&room);
                }
            }
        }
        tracing::debug!(connection = %id, "connection removed");
    }

    /// Subscribe every live connection of `user` to `room`.
    ///
    /// Returns the number of connections that were not yet in the room.
    pub fn join(&self, user: UserId, room: Room) -> usize {
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut joined = 0;
        for (id, connection) in &mut state.connections {
            if connection.user == user && connection.rooms.insert(room) {
                state.rooms.entry(room).or_default().insert(*id);
                joined += 1;
            }
        }
        tracing::debug!(user_id = %user, %room, joined, "user joined room");
        joined
    }

    /// Unsubscribe every live connection of `user` from `room`.
    ///
    /// Returns the number of connections that left the room.
    pub fn leave(&self, user: UserId, room: Room) -> usize {
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut left = 0;
        for (id, connection) in &mut state.connections {
            if connection.user == user && connection.rooms.remove(&room) {
                if let Some(members) = state.rooms.get_mut(&room) {
                    members.remove(id);
                }
                left += 1;
            }
        }
        if state.rooms.get(&room).is_some_and(HashSet::is_empty) {
            state.rooms.remove(&room);
        }
        tracing::debug!(user_id = %user, %room, left, "user left room");
        left
    }

    /// Whether the connection has joined `room`.
    #[must_use]
    pub fn is_subscribed(&self, id: ConnectionId, room: Room) -> bool {
        self.lock()
            .rooms
            .get(&room)
            .is_some_and(|members| members.contains(&id))
    }

    /// Number of connections currently in `room`.
    #[must_use]
    pub fn room_size(&self, room: Room) -> usize {
        self.lock().rooms.get(&room).map_or(0, HashSet::len)
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Queue `notification` for every connection in its room.
    ///
    /// Returns the number of connections it was queued for. A connection with
    /// a full queue misses this notification.
    pub fn broadcast(&self, notification: &Notification) -> usize {
        let state = self.lock();
        let Some(members) = state.rooms.get(&notification.room) else {
            return 0;
        };

        let mut reached = 0;
        for id in members {
            let Some(connection) = state.connections.get(id) else {
                continue;
            };
            match connection.sender.try_send(notification.clone()) {
                Ok(()) => reached += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection = %id,
                        room = %notification.room,
                        event = %notification.event,
                        "outbound queue full, dropping notification"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(connection = %id, "receiver gone, skipping");
                }
            }
        }
        reached
    }
}

impl Notifier for RoomRegistry {
    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), BandstandError>> + Send {
        let reached = self.broadcast(&notification);
        tracing::debug!(
            room = %notification.room,
            event = %notification.event,
            reached,
            "notification sent"
        );
        async { Ok(()) }
    }

    fn join(&self, user: UserId, room: Room) {
        RoomRegistry::join(self, user, room);
    }

    fn leave(&self, user: UserId, room: Room) {
        RoomRegistry::leave(self, user, room);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandstand_domain::id::{BandId, UserId};
    use bandstand_domain::notification::NotificationKind;

    fn song_created(band_id: BandId) -> Notification {
        Notification::to_band(
            band_id,
            NotificationKind::SongCreated,
            &serde_json::json!({ "bandId": band_id }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn should_deliver_to_every_member_of_room() {
        let registry = RoomRegistry::new(8);
        let band_id = BandId::new();
        let (_a, mut rx_a) = registry.connect(UserId::new(), [Room::Band(band_id)]);
        let user = UserId::new();
        let (_b, mut rx_b) = registry.connect(user, [Room::Band(band_id), Room::User(user)]);

        let reached = registry.broadcast(&song_created(band_id));

        assert_eq!(reached, 2);
        assert_eq!(rx_a.recv().await.unwrap().event, NotificationKind::SongCreated);
        assert_eq!(rx_b.recv().await.unwrap().event, NotificationKind::SongCreated);
    }

    #[tokio::test]
    async fn should_not_deliver_to_other_rooms() {
        let registry = RoomRegistry::new(8);
        let (_id, mut rx) = registry.connect(UserId::new(), [Room::Band(BandId::new())]);

        let reached = registry.broadcast(&song_created(BandId::new()));

        assert_eq!(reached, 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn should_leave_all_rooms_when_disconnected() {
        let registry = RoomRegistry::new(8);
        let room = Room::Band(BandId::new());
        let (id, _rx) = registry.connect(UserId::new(), [room, Room::User(UserId::new())]);
        assert!(registry.is_subscribed(id, room));

        registry.disconnect(id);

        assert!(!registry.is_subscribed(id, room));
        assert_eq!(registry.room_size(room), 0);
        assert_eq!(registry.connection_count(), 0);
    }

    #[tokio::test]
    async fn should_stop_delivering_band_traffic_after_user_leaves() {
        let registry = RoomRegistry::new(8);
        let band_id = BandId::new();
        let removed = UserId::new();
        let (phone, mut rx_phone) = registry.connect(removed, [Room::Band(band_id)]);
        let (laptop, _rx_laptop) = registry.connect(removed, [Room::Band(band_id)]);
        let (stayer, mut rx_stayer) = registry.connect(UserId::new(), [Room::Band(band_id)]);

        assert_eq!(registry.leave(removed, Room::Band(band_id)), 2);

        assert!(!registry.is_subscribed(phone, Room::Band(band_id)));
        assert!(!registry.is_subscribed(laptop, Room::Band(band_id)));
        assert!(registry.is_subscribed(stayer, Room::Band(band_id)));
        assert_eq!(registry.broadcast(&song_created(band_id)), 1);
        assert!(rx_stayer.recv().await.is_some());
        assert!(rx_phone.try_recv().is_err());
    }

    #[test]
    fn should_join_every_connection_of_user_once() {
        let registry = RoomRegistry::new(8);
        let band_id = BandId::new();
        let user = UserId::new();
        let (a, _rx_a) = registry.connect(user, [Room::User(user)]);
        let (b, _rx_b) = registry.connect(user, [Room::User(user)]);
        let stranger = UserId::new();
        let (other, _rx_other) = registry.connect(stranger, [Room::User(stranger)]);

        assert_eq!(registry.join(user, Room::Band(band_id)), 2);
        assert_eq!(registry.join(user, Room::Band(band_id)), 0);

        assert!(registry.is_subscribed(a, Room::Band(band_id)));
        assert!(registry.is_subscribed(b, Room::Band(band_id)));
        assert!(!registry.is_subscribed(other, Room::Band(band_id)));
        assert_eq!(registry.room_size(Room::Band(band_id)), 2);
    }

    #[test]
    fn should_drop_empty_room_when_last_member_leaves() {
        let registry = RoomRegistry::new(8);
        let room = Room::Band(BandId::new());
        let user = UserId::new();
        let (_id, _rx) = registry.connect(user, [room]);

        assert_eq!(registry.leave(user, room), 1);
        assert_eq!(registry.leave(user, room), 0);
        assert_eq!(registry.room_size(room), 0);
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn should_ignore_disconnect_of_unknown_connection() {
        let registry = RoomRegistry::new(8);
        registry.disconnect(ConnectionId(42));
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn should_drop_notification_when_queue_full() {
        let registry = RoomRegistry::new(1);
        let band_id = BandId::new();
        let (_id, _rx) = registry.connect(UserId::new(), [Room::Band(band_id)]);

        assert_eq!(registry.broadcast(&song_created(band_id)), 1);
        assert_eq!(registry.broadcast(&song_created(band_id)), 0);
    }

    #[test]
    fn should_skip_connection_whose_receiver_was_dropped() {
        let registry = RoomRegistry::new(4);
        let band_id = BandId::new();
        let (_id, rx) = registry.connect(UserId::new(), [Room::Band(band_id)]);
        drop(rx);

        assert_eq!(registry.broadcast(&song_created(band_id)), 0);
    }

    #[tokio::test]
    async fn should_broadcast_through_notifier_port() {
        let registry = std::sync::Arc::new(RoomRegistry::new(4));
        let band_id = BandId::new();
        let (_id, mut rx) = registry.connect(UserId::new(), [Room::Band(band_id)]);

        registry.notify(song_created(band_id)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().room, Room::Band(band_id));
    }
}
