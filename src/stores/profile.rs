//! Member profile store.
//!
//! The API encodes membership status as an integer (`1` active). Locally the
//! profile always carries [`MemberStatus`]; the integer form only exists on
//! the wire.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use super::{StoreCell, StoreState, unwrap_envelope};
use crate::net::{ApiClient, ApiError};

pub const PROFILE_PATH: &str = "/api/v1/persons/me";
pub const DEFAULT_AVATAR_URL: &str = "/default-avatar.png";
const NO_PROFILE_LOADED: &str = "No profile loaded to update";
const STORE_NAME: &str = "profile";

// =============================================================================
// MODEL
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    Active,
    #[default]
    Inactive,
}

impl MemberStatus {
    /// Normalize a wire value: `1` (or `"1"`/`"Active"`) is active, anything else inactive.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn from_wire(value: &serde_json::Value) -> Self {
        let active = match value {
            serde_json::Value::Number(n) => n.as_f64() == Some(1.0),
            serde_json::Value::String(s) => s == "1" || s.eq_ignore_ascii_case("active"),
            _ => false,
        };
        if active { Self::Active } else { Self::Inactive }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Active => 1,
            Self::Inactive => 0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

/// Canonical local view of the signed-in member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberProfile {
    pub id: i64,
    pub full_name: String,
    /// `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub gender: String,
    pub disability_type: String,
    pub address: String,
    pub contact_no: String,
    pub status: MemberStatus,
    pub date_registered: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

impl MemberProfile {
    /// Whole years between `date_of_birth` and `today` (days / 365.25, floored).
    /// `None` if the birth date is unparseable or in the future.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn age_on(&self, today: Date) -> Option<u32> {
        let born = parse_ymd(&self.date_of_birth)?;
        let days = (today - born).whole_days();
        if days < 0 {
            return None;
        }
        Some((days as f64 / 365.25).floor() as u32)
    }

    #[must_use]
    pub fn age(&self) -> Option<u32> {
        self.age_on(OffsetDateTime::now_utc().date())
    }

    #[must_use]
    pub fn avatar_url(&self) -> &str {
        self.avatar.as_deref().filter(|a| !a.is_empty()).unwrap_or(DEFAULT_AVATAR_URL)
    }
}

fn parse_ymd(raw: &str) -> Option<Date> {
    let mut parts = raw.get(..10).unwrap_or(raw).splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

/// Fields a caller may change. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub disability_type: Option<String>,
    pub address: Option<String>,
    pub contact_no: Option<String>,
    pub status: Option<MemberStatus>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `current` with every provided field replaced.
    #[must_use]
    pub fn apply_to(self, mut current: MemberProfile) -> MemberProfile {
        if let Some(v) = self.full_name {
            current.full_name = v;
        }
        if let Some(v) = self.date_of_birth {
            current.date_of_birth = v;
        }
        if let Some(v) = self.gender {
            current.gender = v;
        }
        if let Some(v) = self.disability_type {
            current.disability_type = v;
        }
        if let Some(v) = self.address {
            current.address = v;
        }
        if let Some(v) = self.contact_no {
            current.contact_no = v;
        }
        if let Some(v) = self.status {
            current.status = v;
        }
        if let Some(v) = self.email {
            current.email = Some(v);
        }
        if let Some(v) = self.avatar {
            current.avatar = Some(v);
        }
        current
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct PersonRecord {
    id: i64,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    date_of_birth: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    disability_type: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    contact_no: String,
    #[serde(default)]
    status: serde_json::Value,
    #[serde(default)]
    date_registered: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

impl From<PersonRecord> for MemberProfile {
    fn from(r: PersonRecord) -> Self {
        Self {
            id: r.id,
            full_name: r.full_name,
            date_of_birth: r.date_of_birth,
            gender: r.gender,
            disability_type: r.disability_type,
            address: r.address,
            contact_no: r.contact_no,
            status: MemberStatus::from_wire(&r.status),
            date_registered: r.date_registered,
            email: r.email,
            avatar: r.avatar,
        }
    }
}

#[derive(Debug, Serialize)]
struct PersonPayload<'a> {
    id: i64,
    full_name: &'a str,
    date_of_birth: &'a str,
    gender: &'a str,
    disability_type: &'a str,
    address: &'a str,
    contact_no: &'a str,
    status: i64,
    date_registered: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<&'a str>,
}

impl<'a> From<&'a MemberProfile> for PersonPayload<'a> {
    fn from(p: &'a MemberProfile) -> Self {
        Self {
            id: p.id,
            full_name: &p.full_name,
            date_of_birth: &p.date_of_birth,
            gender: &p.gender,
            disability_type: &p.disability_type,
            address: &p.address,
            contact_no: &p.contact_no,
            status: p.status.code(),
            date_registered: &p.date_registered,
            email: p.email.as_deref(),
            avatar: p.avatar.as_deref(),
        }
    }
}

fn parse_profile(value: serde_json::Value) -> Result<MemberProfile, ApiError> {
    serde_json::from_value::<PersonRecord>(unwrap_envelope(value))
        .map(MemberProfile::from)
        .map_err(|e| ApiError::Decode(e.to_string()))
}

// =============================================================================
// STORE
// =============================================================================

pub struct ProfileStore {
    api: Arc<ApiClient>,
    cell: StoreCell<Option<MemberProfile>>,
}

impl ProfileStore {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api, cell: StoreCell::new(None) }
    }

    #[must_use]
    pub fn state(&self) -> StoreState<Option<MemberProfile>> {
        self.cell.snapshot()
    }

    #[must_use]
    pub fn profile(&self) -> Option<MemberProfile> {
        self.cell.snapshot().data
    }

    /// Load the signed-in member's profile.
    pub async fn fetch(&self) {
        let _turn = self.cell.admit().await;
        self.cell.begin();
        let result = self.api.get_json::<serde_json::Value>(PROFILE_PATH).await.and_then(parse_profile);
        if let Ok(profile) = &result {
            tracing::debug!(id = profile.id, "profile loaded");
        }
        self.cell.settle(STORE_NAME, result.map(Some));
    }

    /// Merge `changes` into the loaded profile, send it, and adopt the
    /// server's copy. Fails locally if nothing has been fetched yet.
    pub async fn update(&self, changes: ProfileUpdate) {
        let _turn = self.cell.admit().await;
        let Some(current) = self.cell.snapshot().data else {
            self.cell.reject(NO_PROFILE_LOADED);
            return;
        };
        self.cell.begin();
        let merged = changes.apply_to(current);
        let result = self
            .api
            .put_json::<_, serde_json::Value>(PROFILE_PATH, &PersonPayload::from(&merged))
            .await
            .and_then(parse_profile);
        if let Ok(profile) = &result {
            tracing::info!(id = profile.id, "profile updated");
        }
        self.cell.settle(STORE_NAME, result.map(Some));
    }
}
