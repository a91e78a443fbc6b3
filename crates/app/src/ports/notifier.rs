//! Notifier port — real-time fan-out of mutation events.

use std::future::Future;

use bandstand_domain::error::BandstandError;
use bandstand_domain::id::UserId;
use bandstand_domain::notification::{Notification, Room};

/// Delivers notifications to the connections subscribed to their room.
pub trait Notifier {
    /// Deliver a notification to every current subscriber of its room.
    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), BandstandError>> + Send;

    /// Subscribe the user's live connections to `room`.
    fn join(&self, user: UserId, room: Room);

    /// Unsubscribe the user's live connections from `room`.
    fn leave(&self, user: UserId, room: Room);
}

impl<T: Notifier + Send + Sync> Notifier for std::sync::Arc<T> {
    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), BandstandError>> + Send {
        (**self).notify(notification)
    }

    fn join(&self, user: UserId, room: Room) {
        (**self).join(user, room);
    }

    fn leave(&self, user: UserId, room: Room) {
        (**self).leave(user, room);
    }
}
