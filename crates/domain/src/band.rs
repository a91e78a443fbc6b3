//! Band — a group of users collaborating on rehearsals, songs and setlists.

use serde::{Deserialize, Serialize};

use crate::define_label_enum;
use crate::error::{BandstandError, ValidationError};
use crate::id::{BandId, UserId};
use crate::time::{Timestamp, now};

define_label_enum!(
    /// Role of a user inside one band. Drives the authorization gate.
    BandRole("band role") {
        Admin => "admin",
        Leader => "leader",
        Member => "member",
    }
);

impl BandRole {
    /// Roles allowed to run a band: schedule rehearsals, curate setlists.
    pub const MANAGERS: &'static [Self] = &[Self::Admin, Self::Leader];

    /// Every role; used where plain membership is enough.
    pub const ANY: &'static [Self] = Self::ALL;

    /// Only band administrators (membership management).
    pub const ADMINS: &'static [Self] = &[Self::Admin];
}

/// A band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub id: BandId,
    pub name: String,
    pub description: Option<String>,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Band {
    /// Create a builder for constructing a [`Band`].
    #[must_use]
    pub fn builder() -> BandBuilder {
        BandBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when `name` is blank.
    pub fn validate(&self) -> Result<(), BandstandError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name").into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Band`].
#[derive(Debug, Default)]
pub struct BandBuilder {
    id: Option<BandId>,
    name: Option<String>,
    description: Option<String>,
    created_by: Option<UserId>,
}

impl BandBuilder {
    #[must_use]
    pub fn id(mut self, id: BandId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    /// Consume the builder, validate, and return a [`Band`].
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] if `name` is missing or blank,
    /// or if no creator was given.
    pub fn build(self) -> Result<Band, BandstandError> {
        let ts = now();
        let band = Band {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description,
            created_by: self
                .created_by
                .ok_or(ValidationError::MissingField("createdBy"))?,
            created_at: ts,
            updated_at: ts,
        };
        band.validate()?;
        Ok(band)
    }
}

/// One user's membership in one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandMember {
    pub band_id: BandId,
    pub user_id: UserId,
    pub role: BandRole,
    pub joined_at: Timestamp,
}

impl BandMember {
    /// A membership starting now.
    #[must_use]
    pub fn new(band_id: BandId, user_id: UserId, role: BandRole) -> Self {
        Self {
            band_id,
            user_id,
            role,
            joined_at: now(),
        }
    }

    /// Whether this membership's role is one of `allowed`.
    #[must_use]
    pub fn has_any_role(&self, allowed: &[BandRole]) -> bool {
        allowed.contains(&self.role)
    }
}
