//! Storage port — repository traits for persistence.
//!
//! Every rehearsal, song and setlist returned by a repository is hydrated:
//! its child rows (attendees, songs, resources, setlist entries) travel with
//! it, and an aggregate without children carries empty lists.

use std::future::Future;

use bandstand_domain::band::{Band, BandMember};
use bandstand_domain::error::BandstandError;
use bandstand_domain::id::{
    BandId, InstrumentId, RehearsalId, SessionId, SetlistId, SongId, SongResourceId, UserId,
};
use bandstand_domain::rehearsal::{
    AttendanceRecord, Rehearsal, RehearsalChanges, RsvpStatus, UpcomingRehearsal,
};
use bandstand_domain::session::Session;
use bandstand_domain::setlist::Setlist;
use bandstand_domain::song::{Song, SongChanges, SongResource};
use bandstand_domain::time::Timestamp;
use bandstand_domain::user::{Instrument, User, UserChanges, UserInstrument};

/// Accounts and their password hashes.
pub trait UserRepository {
    /// Persist a new user together with its password hash.
    fn create(
        &self,
        user: User,
        password_hash: String,
    ) -> impl Future<Output = Result<User, BandstandError>> + Send;

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send;

    /// Look up by email, compared case-insensitively.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send;

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send;

    /// The user and its stored password hash, for login.
    fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<(User, String)>, BandstandError>> + Send;

    /// Write the given profile fields and bump `updated_at` to `at`.
    ///
    /// Returns `None` when the user does not exist.
    fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send;

    /// The instrument catalogue, ordered by name.
    fn list_instruments(
        &self,
    ) -> impl Future<Output = Result<Vec<Instrument>, BandstandError>> + Send;

    /// Instruments the user plays, ordered by name.
    fn instruments_of(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Vec<UserInstrument>, BandstandError>> + Send;

    /// Replace the user's instruments with `instruments` in one transaction.
    fn replace_instruments(
        &self,
        id: UserId,
        instruments: &[InstrumentId],
    ) -> impl Future<Output = Result<(), BandstandError>> + Send;
}

/// Login sessions backing bearer tokens.
pub trait SessionRepository {
    fn create(
        &self,
        session: Session,
    ) -> impl Future<Output = Result<Session, BandstandError>> + Send;

    fn get_by_id(
        &self,
        id: SessionId,
    ) -> impl Future<Output = Result<Option<Session>, BandstandError>> + Send;

    /// Returns `false` when no such session existed.
    fn delete(&self, id: SessionId) -> impl Future<Output = Result<bool, BandstandError>> + Send;
}

/// Bands and their membership roster.
pub trait BandRepository {
    /// Insert the band and make its creator an `admin` member atomically.
    fn create_with_owner(
        &self,
        band: Band,
    ) -> impl Future<Output = Result<Band, BandstandError>> + Send;

    fn get_by_id(
        &self,
        id: BandId,
    ) -> impl Future<Output = Result<Option<Band>, BandstandError>> + Send;

    /// Bands the user is a member of, ordered by name.
    fn list_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Band>, BandstandError>> + Send;

    fn get_membership(
        &self,
        band_id: BandId,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<BandMember>, BandstandError>> + Send;

    /// Members ordered by join time.
    fn list_members(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<BandMember>, BandstandError>> + Send;

    fn add_member(
        &self,
        member: BandMember,
    ) -> impl Future<Output = Result<BandMember, BandstandError>> + Send;

    /// Returns `false` when the user was not a member.
    fn remove_member(
        &self,
        band_id: BandId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send;

    fn band_ids_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<BandId>, BandstandError>> + Send;
}

/// Rehearsals with their attendee and song rows.
pub trait RehearsalRepository {
    /// Insert the rehearsal, seed one `no_response` attendee per current band
    /// member and attach its songs, all in one transaction.
    ///
    /// Fails with [`ValidationError::SongNotInBand`] when a song belongs to
    /// another band; nothing is written in that case.
    ///
    /// [`ValidationError::SongNotInBand`]: bandstand_domain::error::ValidationError::SongNotInBand
    fn create(
        &self,
        rehearsal: Rehearsal,
    ) -> impl Future<Output = Result<Rehearsal, BandstandError>> + Send;

    fn get_by_id(
        &self,
        id: RehearsalId,
    ) -> impl Future<Output = Result<Option<Rehearsal>, BandstandError>> + Send;

    /// All rehearsals of a band ordered by start time.
    fn list_for_band(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<Rehearsal>, BandstandError>> + Send;

    /// Scheduled rehearsals starting strictly after `after` in any band the
    /// user belongs to, ordered by start time.
    fn list_upcoming_for_user(
        &self,
        user_id: UserId,
        after: Timestamp,
    ) -> impl Future<Output = Result<Vec<UpcomingRehearsal>, BandstandError>> + Send;

    /// Apply a non-empty change set in one transaction.
    ///
    /// Returns `None` when the rehearsal does not exist.
    fn update(
        &self,
        id: RehearsalId,
        changes: &RehearsalChanges,
        updated_at: Timestamp,
    ) -> impl Future<Output = Result<Option<Rehearsal>, BandstandError>> + Send;

    /// Returns `false` when no such rehearsal existed.
    fn delete(&self, id: RehearsalId)
    -> impl Future<Output = Result<bool, BandstandError>> + Send;

    /// The owning band, without hydrating the rehearsal.
    fn band_of(
        &self,
        id: RehearsalId,
    ) -> impl Future<Output = Result<Option<BandId>, BandstandError>> + Send;

    /// Set one attendee's RSVP. Returns `false` when the user has no
    /// attendee row on that rehearsal.
    fn set_rsvp(
        &self,
        id: RehearsalId,
        user_id: UserId,
        status: RsvpStatus,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send;

    /// Record actual attendance for a batch in one transaction. Records for
    /// users without an attendee row are skipped. Returns the number of rows
    /// updated.
    fn set_attendance(
        &self,
        id: RehearsalId,
        records: &[AttendanceRecord],
    ) -> impl Future<Output = Result<usize, BandstandError>> + Send;
}

/// Songs and their resources.
pub trait SongRepository {
    fn create(&self, song: Song) -> impl Future<Output = Result<Song, BandstandError>> + Send;

    fn get_by_id(
        &self,
        id: SongId,
    ) -> impl Future<Output = Result<Option<Song>, BandstandError>> + Send;

    /// Songs of a band ordered by title.
    fn list_for_band(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<Song>, BandstandError>> + Send;

    /// Apply a non-empty change set. Returns `None` when the song does not exist.
    fn update(
        &self,
        id: SongId,
        changes: &SongChanges,
    ) -> impl Future<Output = Result<Option<Song>, BandstandError>> + Send;

    fn delete(&self, id: SongId) -> impl Future<Output = Result<bool, BandstandError>> + Send;

    fn add_resource(
        &self,
        resource: SongResource,
    ) -> impl Future<Output = Result<SongResource, BandstandError>> + Send;

    /// Returns `false` unless the resource exists and belongs to `song_id`.
    fn delete_resource(
        &self,
        song_id: SongId,
        resource_id: SongResourceId,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send;
}

/// Setlists and their ordered song entries.
pub trait SetlistRepository {
    /// Insert the setlist and its entries in one transaction.
    ///
    /// Fails with `SongNotInBand` when an entry belongs to another band.
    fn create(
        &self,
        setlist: Setlist,
    ) -> impl Future<Output = Result<Setlist, BandstandError>> + Send;

    fn get_by_id(
        &self,
        id: SetlistId,
    ) -> impl Future<Output = Result<Option<Setlist>, BandstandError>> + Send;

    /// Setlists of a band, most recently created first.
    fn list_for_band(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<Setlist>, BandstandError>> + Send;

    /// Replace the ordered entries in one transaction. Returns `None` when the
    /// setlist does not exist.
    fn replace_songs(
        &self,
        id: SetlistId,
        song_ids: &[SongId],
    ) -> impl Future<Output = Result<Option<Setlist>, BandstandError>> + Send;

    fn delete(&self, id: SetlistId) -> impl Future<Output = Result<bool, BandstandError>> + Send;
}
