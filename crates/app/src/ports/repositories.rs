//! A family of repository implementations backed by one store.

use crate::ports::storage::{
    BandRepository, RehearsalRepository, SessionRepository, SetlistRepository, SongRepository,
    UserRepository,
};

/// Names the concrete repository types of one storage backend.
///
/// Driving adapters are generic over a single `Repositories` type instead of
/// one parameter per repository.
pub trait Repositories: Send + Sync + 'static {
    type Users: UserRepository + Send + Sync + 'static;
    type Sessions: SessionRepository + Send + Sync + 'static;
    type Bands: BandRepository + Send + Sync + 'static;
    type Rehearsals: RehearsalRepository + Send + Sync + 'static;
    type Songs: SongRepository + Send + Sync + 'static;
    type Setlists: SetlistRepository + Send + Sync + 'static;
}
