//! WebSocket endpoint for real-time notifications.
//!
//! The handshake authenticates the bearer token (query `token` or the
//! `Authorization` header) before upgrading. An accepted connection joins
//! `user:<id>` and one `band:<id>` room per membership, then receives every
//! notification queued for those rooms as a JSON text frame. Members added to
//! or removed from a band while connected join or leave its room at once.
//!
//! Clients may push `{"event": ..., "data": {...}}` frames; a relayable
//! event whose `data.bandId` names a joined room is fanned out to that room.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use bandstand_app::ports::{BandRepository, Notifier, Repositories, UserRepository};
use bandstand_app::rooms::{ConnectionId, RoomRegistry};
use bandstand_app::services::band_service::BandService;
use bandstand_domain::error::{AuthError, BandstandError};
use bandstand_domain::id::{BandId, UserId};
use bandstand_domain::notification::{Notification, NotificationKind, Room};
use bandstand_domain::user::User;

use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters accepted by the handshake.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
}

/// Frame pushed by a client for relay.
#[derive(Debug, Deserialize)]
struct ClientFrame {
    event: NotificationKind,
    data: serde_json::Value,
}

/// Why a client frame was not relayed.
#[derive(Debug, PartialEq, Eq)]
enum Dropped {
    Malformed,
    NotRelayable(NotificationKind),
    MissingBand,
    NotJoined(BandId),
}

/// `GET /api/ws`
///
/// Responds 401 without upgrading when the token is missing or invalid.
pub async fn upgrade<P: Repositories>(
    State(state): State<AppState<P>>,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let user = match authenticate(&state, params.token.as_deref(), &headers).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };
    let rooms = match rooms_for(&state.bands, user.id).await {
        Ok(rooms) => rooms,
        Err(err) => return ApiError::from(err).into_response(),
    };

    let registry = Arc::clone(&state.rooms);
    ws.on_upgrade(move |socket| serve(socket, registry, user, rooms))
}

/// Rooms a connection of `user` starts in: its own room plus one per band
/// membership.
async fn rooms_for<B, U, N>(
    bands: &BandService<B, U, N>,
    user: UserId,
) -> Result<Vec<Room>, BandstandError>
where
    B: BandRepository,
    U: UserRepository,
    N: Notifier,
{
    let band_ids = bands.band_ids_for_user(user).await?;
    let mut rooms = Vec::with_capacity(band_ids.len() + 1);
    rooms.push(Room::User(user));
    rooms.extend(band_ids.into_iter().map(Room::Band));
    Ok(rooms)
}

async fn authenticate<P: Repositories>(
    state: &AppState<P>,
    query_token: Option<&str>,
    headers: &HeaderMap,
) -> Result<User, ApiError> {
    let token = query_token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .or_else(|| bearer_token(headers))
        .ok_or(AuthError::MissingToken)?;
    Ok(state.auth.authenticate(token).await?)
}

async fn serve(socket: WebSocket, registry: Arc<RoomRegistry>, user: User, rooms: Vec<Room>) {
    let (connection, mut outbound) = registry.connect(user.id, rooms);
    tracing::info!(%connection, user_id = %user.id, "websocket connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            notification = outbound.recv() => {
                let Some(notification) = notification else {
                    break;
                };
                let text = match serde_json::to_string(&notification) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(%err, event = %notification.event, "failed to encode notification");
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match relay(&registry, connection, text.as_str()) {
                        Ok(reached) => tracing::debug!(%connection, reached, "client frame relayed"),
                        Err(reason) => tracing::debug!(%connection, ?reason, "client frame dropped"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!(%connection, %err, "websocket read failed");
                    break;
                }
            },
        }
    }

    registry.disconnect(connection);
    tracing::info!(%connection, user_id = %user.id, "websocket disconnected");
}

/// Fan a client frame out to the band room it names.
fn relay(registry: &RoomRegistry, connection: ConnectionId, text: &str) -> Result<usize, Dropped> {
    let frame: ClientFrame = serde_json::from_str(text).map_err(|_| Dropped::Malformed)?;
    if !frame.event.is_client_rebroadcastable() {
        return Err(Dropped::NotRelayable(frame.event));
    }
    let band_id: BandId = frame
        .data
        .get("bandId")
        .and_then(serde_json::Value::as_str)
        .and_then(|raw| raw.parse().ok())
        .ok_or(Dropped::MissingBand)?;
    let room = Room::Band(band_id);
    if !registry.is_subscribed(connection, room) {
        return Err(Dropped::NotJoined(band_id));
    }

    Ok(registry.broadcast(&Notification {
        room,
        event: frame.event,
        data: frame.data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandstand_app::services::testing::InMemory;
    use bandstand_domain::band::{Band, BandRole};

    fn frame(event: &str, band_id: BandId) -> String {
        serde_json::json!({ "event": event, "data": { "bandId": band_id, "status": "going" } })
            .to_string()
    }

    #[tokio::test]
    async fn should_relay_to_joined_band_room_including_sender() {
        let registry = RoomRegistry::new(8);
        let band_id = BandId::new();
        let (sender, mut rx_sender) = registry.connect(UserId::new(), [Room::Band(band_id)]);
        let (_peer, mut rx_peer) = registry.connect(UserId::new(), [Room::Band(band_id)]);

        let reached = relay(&registry, sender, &frame("rehearsal:rsvp", band_id)).unwrap();

        assert_eq!(reached, 2);
        let received = rx_peer.recv().await.unwrap();
        assert_eq!(received.event, NotificationKind::RehearsalRsvp);
        assert_eq!(received.data["status"], "going");
        assert_eq!(rx_sender.recv().await.unwrap().room, Room::Band(band_id));
    }

    #[test]
    fn should_drop_frame_for_band_not_joined() {
        let registry = RoomRegistry::new(8);
        let joined = BandId::new();
        let other = BandId::new();
        let (sender, _rx) = registry.connect(UserId::new(), [Room::Band(joined)]);
        let (_peer, _peer_rx) = registry.connect(UserId::new(), [Room::Band(other)]);

        let result = relay(&registry, sender, &frame("song:updated", other));

        assert_eq!(result, Err(Dropped::NotJoined(other)));
    }

    #[test]
    fn should_drop_server_only_events() {
        let registry = RoomRegistry::new(8);
        let band_id = BandId::new();
        let (sender, _rx) = registry.connect(UserId::new(), [Room::Band(band_id)]);

        let result = relay(&registry, sender, &frame("setlist:deleted", band_id));

        assert_eq!(
            result,
            Err(Dropped::NotRelayable(NotificationKind::SetlistDeleted))
        );
    }

    #[test]
    fn should_drop_unknown_events_and_missing_band() {
        let registry = RoomRegistry::new(8);
        let (sender, _rx) = registry.connect(UserId::new(), [Room::Band(BandId::new())]);

        assert_eq!(
            relay(&registry, sender, r#"{"event":"chat:message","data":{}}"#),
            Err(Dropped::Malformed)
        );
        assert_eq!(
            relay(&registry, sender, r#"{"event":"song:created","data":{"title":"x"}}"#),
            Err(Dropped::MissingBand)
        );
        assert_eq!(relay(&registry, sender, "not json"), Err(Dropped::Malformed));
    }

    #[tokio::test]
    async fn should_start_in_own_room_and_one_room_per_band() {
        let store = InMemory::default();
        let registry = Arc::new(RoomRegistry::new(4));
        let bands = BandService::new(store.clone(), store.clone(), registry);
        let user = store.seed_user("founder").id;
        let other = store.seed_user("elsewhere").id;
        let mut joined = Vec::new();
        for (name, owner) in [("First", user), ("Second", user), ("Theirs", other)] {
            let band = Band::builder()
                .name(name)
                .created_by(owner)
                .build()
                .unwrap();
            let band = bands.create_band(band).await.unwrap();
            if owner == user {
                joined.push(band.id);
            }
        }

        let rooms = rooms_for(&bands, user).await.unwrap();

        assert_eq!(rooms.len(), 3);
        assert_eq!(rooms[0], Room::User(user));
        for band_id in joined {
            assert!(rooms.contains(&Room::Band(band_id)));
        }
    }

    #[tokio::test]
    async fn should_start_in_own_room_only_without_memberships() {
        let store = InMemory::default();
        let registry = Arc::new(RoomRegistry::new(4));
        let bands = BandService::new(store.clone(), store.clone(), registry);
        let user = store.seed_user("solo").id;

        let rooms = rooms_for(&bands, user).await.unwrap();

        assert_eq!(rooms, vec![Room::User(user)]);
    }

    #[tokio::test]
    async fn should_stop_relaying_for_member_removed_while_connected() {
        let store = InMemory::default();
        let registry = Arc::new(RoomRegistry::new(8));
        let bands = BandService::new(store.clone(), store.clone(), Arc::clone(&registry));
        let admin = store.seed_user("admin").id;
        let player = store.seed_user("player").id;
        let band = Band::builder()
            .name("Live")
            .created_by(admin)
            .build()
            .unwrap();
        let band = bands.create_band(band).await.unwrap();
        bands
            .add_member(admin, band.id, player, BandRole::Member)
            .await
            .unwrap();
        let rooms = rooms_for(&bands, player).await.unwrap();
        let (connection, _rx) = registry.connect(player, rooms);
        assert!(relay(&registry, connection, &frame("rehearsal:rsvp", band.id)).is_ok());

        bands.remove_member(admin, band.id, player).await.unwrap();

        assert_eq!(
            relay(&registry, connection, &frame("rehearsal:rsvp", band.id)),
            Err(Dropped::NotJoined(band.id))
        );
    }
}
