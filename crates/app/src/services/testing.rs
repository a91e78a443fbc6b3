//! In-memory port implementations shared by the service tests.
//!
//! Also available to other crates through the `testing` feature.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use bandstand_domain::band::{Band, BandMember, BandRole};
use bandstand_domain::error::{BandstandError, ValidationError};
use bandstand_domain::id::{
    BandId, InstrumentId, RehearsalId, SessionId, SetlistId, SongId, SongResourceId, UserId,
};
use bandstand_domain::notification::{Notification, Room};
use bandstand_domain::rehearsal::{
    AttendanceRecord, Attendee, Rehearsal, RehearsalChanges, RehearsalStatus, RsvpStatus,
    UpcomingRehearsal,
};
use bandstand_domain::session::Session;
use bandstand_domain::setlist::{Setlist, distinct};
use bandstand_domain::song::{Song, SongChanges, SongResource};
use bandstand_domain::time::Timestamp;
use bandstand_domain::user::{
    Instrument, Registration, User, UserChanges, UserInstrument,
};

use crate::ports::{
    BandRepository, Notifier, RehearsalRepository, Repositories, SessionRepository,
    SetlistRepository, SongRepository, UserRepository,
};

#[derive(Default)]
struct Store {
    users: HashMap<UserId, (User, String)>,
    sessions: HashMap<SessionId, Session>,
    bands: HashMap<BandId, Band>,
    members: Vec<BandMember>,
    rehearsals: HashMap<RehearsalId, Rehearsal>,
    songs: HashMap<SongId, Song>,
    setlists: HashMap<SetlistId, Setlist>,
    instruments: Vec<Instrument>,
    user_instruments: HashMap<UserId, Vec<InstrumentId>>,
}

impl Store {
    fn check_songs<'a>(
        &self,
        band_id: BandId,
        song_ids: impl IntoIterator<Item = &'a SongId>,
    ) -> Result<(), BandstandError> {
        for song_id in song_ids {
            if self.songs.get(song_id).is_none_or(|s| s.band_id != band_id) {
                return Err(ValidationError::SongNotInBand {
                    song_id: *song_id,
                    band_id,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Every repository port over one shared map, so cross-aggregate rules
/// (roster seeding, song ownership) behave like the real store.
#[derive(Clone, Default)]
pub struct InMemory(Arc<Mutex<Store>>);

impl InMemory {
    pub fn seed_user(&self, username: &str) -> User {
        let user = Registration {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "password123".to_string(),
            full_name: None,
        }
        .to_user();
        self.0
            .lock()
            .unwrap()
            .users
            .insert(user.id, (user.clone(), String::new()));
        user
    }

    /// A band whose members hold the given roles. The first member created it.
    pub fn seed_band(&self, members: &[(UserId, BandRole)]) -> BandId {
        let band = Band::builder()
            .name("The Testers")
            .created_by(members[0].0)
            .build()
            .unwrap();
        let band_id = band.id;
        let mut store = self.0.lock().unwrap();
        store.bands.insert(band_id, band);
        for (user_id, role) in members {
            store.members.push(BandMember::new(band_id, *user_id, *role));
        }
        band_id
    }

    pub fn seed_song(&self, band_id: BandId, title: &str, added_by: UserId) -> SongId {
        let song = Song::builder()
            .band_id(band_id)
            .title(title)
            .added_by(added_by)
            .build()
            .unwrap();
        let id = song.id;
        self.0.lock().unwrap().songs.insert(id, song);
        id
    }

    pub fn rehearsal(&self, id: RehearsalId) -> Option<Rehearsal> {
        self.0.lock().unwrap().rehearsals.get(&id).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.0.lock().unwrap().sessions.len()
    }

    pub fn expire_sessions(&self) {
        let mut store = self.0.lock().unwrap();
        for session in store.sessions.values_mut() {
            session.expires_at = session.created_at;
        }
    }

    pub fn delete_user(&self, id: UserId) {
        self.0.lock().unwrap().users.remove(&id);
    }

    pub fn seed_instrument(&self, name: &str) -> InstrumentId {
        let id = InstrumentId::new();
        self.0.lock().unwrap().instruments.push(Instrument {
            id,
            name: name.to_string(),
        });
        id
    }
}

impl UserRepository for InMemory {
    fn create(
        &self,
        user: User,
        password_hash: String,
    ) -> impl Future<Output = Result<User, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        store.users.insert(user.id, (user.clone(), password_hash));
        async move { Ok(user) }
    }

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result = store.users.get(&id).map(|(user, _)| user.clone());
        async move { Ok(result) }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result = store
            .users
            .values()
            .find(|(user, _)| user.email.eq_ignore_ascii_case(email))
            .map(|(user, _)| user.clone());
        async move { Ok(result) }
    }

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result = store
            .users
            .values()
            .find(|(user, _)| user.username == username)
            .map(|(user, _)| user.clone());
        async move { Ok(result) }
    }

    fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<(User, String)>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result = store
            .users
            .values()
            .find(|(user, _)| user.email.eq_ignore_ascii_case(email))
            .cloned();
        async move { Ok(result) }
    }

    fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let result = store.users.get_mut(&id).map(|(user, _)| {
            *user = changes.apply_to(user, at);
            user.clone()
        });
        async move { Ok(result) }
    }

    fn list_instruments(
        &self,
    ) -> impl Future<Output = Result<Vec<Instrument>, BandstandError>> + Send {
        let mut result = self.0.lock().unwrap().instruments.clone();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        async move { Ok(result) }
    }

    fn instruments_of(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Vec<UserInstrument>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let mut result: Vec<UserInstrument> = store
            .user_instruments
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|wanted| store.instruments.iter().find(|i| i.id == *wanted))
            .map(|instrument| UserInstrument {
                id: instrument.id,
                name: instrument.name.clone(),
                proficiency: None,
            })
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        async move { Ok(result) }
    }

    fn replace_instruments(
        &self,
        id: UserId,
        instruments: &[InstrumentId],
    ) -> impl Future<Output = Result<(), BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let unknown = instruments
            .iter()
            .find(|wanted| !store.instruments.iter().any(|i| i.id == **wanted));
        let result = match unknown {
            Some(instrument_id) => Err(ValidationError::UnknownValue {
                kind: "instrument",
                value: instrument_id.to_string(),
            }
            .into()),
            None => {
                store.user_instruments.insert(id, instruments.to_vec());
                Ok(())
            }
        };
        async move { result }
    }
}

impl SessionRepository for InMemory {
    fn create(
        &self,
        session: Session,
    ) -> impl Future<Output = Result<Session, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        store.sessions.insert(session.id, session.clone());
        async move { Ok(session) }
    }

    fn get_by_id(
        &self,
        id: SessionId,
    ) -> impl Future<Output = Result<Option<Session>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result = store.sessions.get(&id).cloned();
        async move { Ok(result) }
    }

    fn delete(&self, id: SessionId) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let removed = store.sessions.remove(&id).is_some();
        async move { Ok(removed) }
    }
}

impl BandRepository for InMemory {
    fn create_with_owner(
        &self,
        band: Band,
    ) -> impl Future<Output = Result<Band, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        store.bands.insert(band.id, band.clone());
        store
            .members
            .push(BandMember::new(band.id, band.created_by, BandRole::Admin));
        async move { Ok(band) }
    }

    fn get_by_id(
        &self,
        id: BandId,
    ) -> impl Future<Output = Result<Option<Band>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result = store.bands.get(&id).cloned();
        async move { Ok(result) }
    }

    fn list_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Band>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let mut result: Vec<Band> = store
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| store.bands.get(&m.band_id).cloned())
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        async move { Ok(result) }
    }

    fn get_membership(
        &self,
        band_id: BandId,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<BandMember>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result = store
            .members
            .iter()
            .find(|m| m.band_id == band_id && m.user_id == user_id)
            .cloned();
        async move { Ok(result) }
    }

    fn list_members(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<BandMember>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result: Vec<BandMember> = store
            .members
            .iter()
            .filter(|m| m.band_id == band_id)
            .cloned()
            .collect();
        async move { Ok(result) }
    }

    fn add_member(
        &self,
        member: BandMember,
    ) -> impl Future<Output = Result<BandMember, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        store.members.push(member.clone());
        async move { Ok(member) }
    }

    fn remove_member(
        &self,
        band_id: BandId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let before = store.members.len();
        store
            .members
            .retain(|m| !(m.band_id == band_id && m.user_id == user_id));
        let removed = store.members.len() != before;
        async move { Ok(removed) }
    }

    fn band_ids_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<BandId>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result: Vec<BandId> = store
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.band_id)
            .collect();
        async move { Ok(result) }
    }
}

impl RehearsalRepository for InMemory {
    fn create(
        &self,
        mut rehearsal: Rehearsal,
    ) -> impl Future<Output = Result<Rehearsal, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let result = store
            .check_songs(rehearsal.band_id, rehearsal.songs.iter().map(|s| &s.song_id))
            .map(|()| {
                rehearsal.attendees = store
                    .members
                    .iter()
                    .filter(|m| m.band_id == rehearsal.band_id)
                    .map(|m| Attendee::seeded(m.user_id))
                    .collect();
                store.rehearsals.insert(rehearsal.id, rehearsal.clone());
                rehearsal
            });
        async move { result }
    }

    fn get_by_id(
        &self,
        id: RehearsalId,
    ) -> impl Future<Output = Result<Option<Rehearsal>, BandstandError>> + Send {
        let result = self.rehearsal(id);
        async move { Ok(result) }
    }

    fn list_for_band(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<Rehearsal>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let mut result: Vec<Rehearsal> = store
            .rehearsals
            .values()
            .filter(|r| r.band_id == band_id)
            .cloned()
            .collect();
        result.sort_by_key(|r| r.starts_at);
        async move { Ok(result) }
    }

    fn list_upcoming_for_user(
        &self,
        user_id: UserId,
        after: Timestamp,
    ) -> impl Future<Output = Result<Vec<UpcomingRehearsal>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let mut result: Vec<UpcomingRehearsal> = store
            .rehearsals
            .values()
            .filter(|r| r.status == RehearsalStatus::Scheduled && r.starts_at > after)
            .filter(|r| {
                store
                    .members
                    .iter()
                    .any(|m| m.band_id == r.band_id && m.user_id == user_id)
            })
            .map(|r| UpcomingRehearsal {
                rehearsal: r.clone(),
                band_name: store
                    .bands
                    .get(&r.band_id)
                    .map(|b| b.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        result.sort_by_key(|u| u.rehearsal.starts_at);
        async move { Ok(result) }
    }

    fn update(
        &self,
        id: RehearsalId,
        changes: &RehearsalChanges,
        updated_at: Timestamp,
    ) -> impl Future<Output = Result<Option<Rehearsal>, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let result = match store.rehearsals.get(&id).cloned() {
            None => Ok(None),
            Some(current) => {
                let mut next = changes.apply_to(&current);
                next.updated_at = updated_at;
                store
                    .check_songs(next.band_id, next.songs.iter().map(|s| &s.song_id))
                    .map(|()| {
                        store.rehearsals.insert(id, next.clone());
                        Some(next)
                    })
            }
        };
        async move { result }
    }

    fn delete(
        &self,
        id: RehearsalId,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let removed = store.rehearsals.remove(&id).is_some();
        async move { Ok(removed) }
    }

    fn band_of(
        &self,
        id: RehearsalId,
    ) -> impl Future<Output = Result<Option<BandId>, BandstandError>> + Send {
        let result = self.rehearsal(id).map(|r| r.band_id);
        async move { Ok(result) }
    }

    fn set_rsvp(
        &self,
        id: RehearsalId,
        user_id: UserId,
        status: RsvpStatus,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let attendee = store
            .rehearsals
            .get_mut(&id)
            .and_then(|r| r.attendees.iter_mut().find(|a| a.user_id == user_id));
        let changed = match attendee {
            Some(attendee) => {
                attendee.status = status;
                true
            }
            None => false,
        };
        async move { Ok(changed) }
    }

    fn set_attendance(
        &self,
        id: RehearsalId,
        records: &[AttendanceRecord],
    ) -> impl Future<Output = Result<usize, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let mut updated = 0;
        if let Some(rehearsal) = store.rehearsals.get_mut(&id) {
            for record in records {
                if let Some(attendee) = rehearsal
                    .attendees
                    .iter_mut()
                    .find(|a| a.user_id == record.user_id)
                {
                    attendee.actual_attendance = Some(record.attendance);
                    updated += 1;
                }
            }
        }
        async move { Ok(updated) }
    }
}

impl SongRepository for InMemory {
    fn create(&self, song: Song) -> impl Future<Output = Result<Song, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        store.songs.insert(song.id, song.clone());
        async move { Ok(song) }
    }

    fn get_by_id(
        &self,
        id: SongId,
    ) -> impl Future<Output = Result<Option<Song>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result = store.songs.get(&id).cloned();
        async move { Ok(result) }
    }

    fn list_for_band(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<Song>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let mut result: Vec<Song> = store
            .songs
            .values()
            .filter(|s| s.band_id == band_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.title.cmp(&b.title));
        async move { Ok(result) }
    }

    fn update(
        &self,
        id: SongId,
        changes: &SongChanges,
    ) -> impl Future<Output = Result<Option<Song>, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let result = store.songs.get(&id).map(|current| changes.apply_to(current));
        if let Some(next) = &result {
            store.songs.insert(id, next.clone());
        }
        async move { Ok(result) }
    }

    fn delete(&self, id: SongId) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let removed = store.songs.remove(&id).is_some();
        async move { Ok(removed) }
    }

    fn add_resource(
        &self,
        resource: SongResource,
    ) -> impl Future<Output = Result<SongResource, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        if let Some(song) = store.songs.get_mut(&resource.song_id) {
            song.resources.push(resource.clone());
        }
        async move { Ok(resource) }
    }

    fn delete_resource(
        &self,
        song_id: SongId,
        resource_id: SongResourceId,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let removed = store.songs.get_mut(&song_id).is_some_and(|song| {
            let before = song.resources.len();
            song.resources.retain(|r| r.id != resource_id);
            song.resources.len() != before
        });
        async move { Ok(removed) }
    }
}

impl SetlistRepository for InMemory {
    fn create(
        &self,
        setlist: Setlist,
    ) -> impl Future<Output = Result<Setlist, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let result = store
            .check_songs(setlist.band_id, &setlist.song_ids)
            .map(|()| {
                store.setlists.insert(setlist.id, setlist.clone());
                setlist
            });
        async move { result }
    }

    fn get_by_id(
        &self,
        id: SetlistId,
    ) -> impl Future<Output = Result<Option<Setlist>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let result = store.setlists.get(&id).cloned();
        async move { Ok(result) }
    }

    fn list_for_band(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<Setlist>, BandstandError>> + Send {
        let store = self.0.lock().unwrap();
        let mut result: Vec<Setlist> = store
            .setlists
            .values()
            .filter(|s| s.band_id == band_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        async move { Ok(result) }
    }

    fn replace_songs(
        &self,
        id: SetlistId,
        song_ids: &[SongId],
    ) -> impl Future<Output = Result<Option<Setlist>, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let song_ids = distinct(song_ids);
        let result = match store.setlists.get(&id).map(|s| s.band_id) {
            None => Ok(None),
            Some(band_id) => store.check_songs(band_id, &song_ids).map(|()| {
                store.setlists.get_mut(&id).map(|s| {
                    s.song_ids = song_ids;
                    s.clone()
                })
            }),
        };
        async move { result }
    }

    fn delete(&self, id: SetlistId) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let mut store = self.0.lock().unwrap();
        let removed = store.setlists.remove(&id).is_some();
        async move { Ok(removed) }
    }
}

/// Repository family where every port is the same [`InMemory`] type.
pub struct InMemoryRepositories;

impl Repositories for InMemoryRepositories {
    type Users = InMemory;
    type Sessions = InMemory;
    type Bands = InMemory;
    type Rehearsals = InMemory;
    type Songs = InMemory;
    type Setlists = InMemory;
}

/// A room membership change requested through [`Notifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Joined(UserId, Room),
    Left(UserId, Room),
}

/// Captures every notification it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    memberships: Arc<Mutex<Vec<MembershipChange>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn memberships(&self) -> Vec<MembershipChange> {
        self.memberships.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), BandstandError>> + Send {
        self.sent.lock().unwrap().push(notification);
        async move { Ok(()) }
    }

    fn join(&self, user: UserId, room: Room) {
        self.memberships
            .lock()
            .unwrap()
            .push(MembershipChange::Joined(user, room));
    }

    fn leave(&self, user: UserId, room: Room) {
        self.memberships
            .lock()
            .unwrap()
            .push(MembershipChange::Left(user, room));
    }
}
