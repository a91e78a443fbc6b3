//! Shared application state for axum handlers.

use std::sync::Arc;

use bandstand_app::ports::Repositories;
use bandstand_app::rooms::RoomRegistry;
use bandstand_app::services::auth_service::AuthService;
use bandstand_app::services::band_service::BandService;
use bandstand_app::services::rehearsal_service::RehearsalService;
use bandstand_app::services::setlist_service::SetlistService;
use bandstand_app::services::song_service::SongService;
use bandstand_app::services::user_service::UserService;

/// Band service as wired into the HTTP adapter.
pub type Bands<P> =
    BandService<<P as Repositories>::Bands, <P as Repositories>::Users, Arc<RoomRegistry>>;

/// Rehearsal service as wired into the HTTP adapter.
pub type Rehearsals<P> = RehearsalService<
    <P as Repositories>::Rehearsals,
    <P as Repositories>::Bands,
    Arc<RoomRegistry>,
>;

/// Song service as wired into the HTTP adapter.
pub type Songs<P> =
    SongService<<P as Repositories>::Songs, <P as Repositories>::Bands, Arc<RoomRegistry>>;

/// Setlist service as wired into the HTTP adapter.
pub type Setlists<P> =
    SetlistService<<P as Repositories>::Setlists, <P as Repositories>::Bands, Arc<RoomRegistry>>;

/// Application state shared across all axum handlers.
///
/// Generic over one [`Repositories`] family to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<P: Repositories> {
    /// Accounts and bearer-token sessions.
    pub auth: Arc<AuthService<P::Users, P::Sessions>>,
    /// Profiles and instruments.
    pub users: Arc<UserService<P::Users>>,
    /// Bands and memberships.
    pub bands: Arc<Bands<P>>,
    pub rehearsals: Arc<Rehearsals<P>>,
    pub songs: Arc<Songs<P>>,
    pub setlists: Arc<Setlists<P>>,
    /// Room registry the WebSocket endpoint joins connections to.
    pub rooms: Arc<RoomRegistry>,
}

impl<P: Repositories> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            users: Arc::clone(&self.users),
            bands: Arc::clone(&self.bands),
            rehearsals: Arc::clone(&self.rehearsals),
            songs: Arc::clone(&self.songs),
            setlists: Arc::clone(&self.setlists),
            rooms: Arc::clone(&self.rooms),
        }
    }
}

impl<P: Repositories> AppState<P> {
    /// Create a new application state from service instances.
    ///
    /// The band, rehearsal, song and setlist services must announce through
    /// the same `rooms` registry.
    pub fn new(
        auth: AuthService<P::Users, P::Sessions>,
        users: UserService<P::Users>,
        bands: Bands<P>,
        rehearsals: Rehearsals<P>,
        songs: Songs<P>,
        setlists: Setlists<P>,
        rooms: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            users: Arc::new(users),
            bands: Arc::new(bands),
            rehearsals: Arc::new(rehearsals),
            songs: Arc::new(songs),
            setlists: Arc::new(setlists),
            rooms,
        }
    }
}
