//! Fire-and-forget publication of mutation events.

use serde::Serialize;

use bandstand_domain::id::BandId;
use bandstand_domain::notification::{Notification, NotificationKind};

use crate::ports::Notifier;

/// Publish `data` as `event` to the band's room.
///
/// Failures are logged and swallowed: the mutation that triggered the
/// notification has already been committed.
pub(crate) async fn announce<N: Notifier>(
    notifier: &N,
    band_id: BandId,
    event: NotificationKind,
    data: &(impl Serialize + Sync),
) {
    let notification = match Notification::to_band(band_id, event, data) {
        Ok(notification) => notification,
        Err(err) => {
            tracing::error!(error = %err, %event, %band_id, "failed to encode notification");
            return;
        }
    };
    if let Err(err) = notifier.notify(notification).await {
        tracing::warn!(error = %err, %event, %band_id, "failed to deliver notification");
    }
}
