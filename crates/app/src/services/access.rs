//! Band-scoped authorization gate.

use bandstand_domain::band::{BandMember, BandRole};
use bandstand_domain::error::{BandstandError, ForbiddenError};
use bandstand_domain::id::{BandId, UserId};

use crate::ports::BandRepository;

/// Require `user_id` to hold one of `allowed` in `band_id`.
///
/// Returns the membership on success.
///
/// # Errors
///
/// Returns [`BandstandError::Forbidden`] when the user is not a member of the
/// band or holds a role outside `allowed`, or a storage error from the
/// repository.
pub async fn authorize_band_role<B: BandRepository>(
    bands: &B,
    user_id: UserId,
    band_id: BandId,
    allowed: &[BandRole],
) -> Result<BandMember, BandstandError> {
    match bands.get_membership(band_id, user_id).await? {
        Some(member) if member.has_any_role(allowed) => Ok(member),
        Some(member) => {
            tracing::debug!(%band_id, %user_id, role = %member.role, "role not allowed");
            Err(ForbiddenError { band_id }.into())
        }
        None => {
            tracing::debug!(%band_id, %user_id, "not a band member");
            Err(ForbiddenError { band_id }.into())
        }
    }
}
