//! Payloads returned by the Bangumi `/v0` API.
//!
//! Only the fields the feed needs are modelled; everything else in the
//! responses is ignored by serde.

use serde::Deserialize;

/// Page envelope shared by every listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub total: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Subject type codes in the upstream catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectType {
    Book,
    Anime,
    Music,
    Game,
    Real,
    Other(u8),
}

impl SubjectType {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => SubjectType::Book,
            2 => SubjectType::Anime,
            3 => SubjectType::Music,
            4 => SubjectType::Game,
            6 => SubjectType::Real,
            other => SubjectType::Other(other),
        }
    }

    /// Whether subjects of this type have broadcast episodes worth a calendar entry.
    pub fn has_episodes(self) -> bool {
        matches!(self, SubjectType::Anime | SubjectType::Real)
    }
}

/// One row of a user's collection.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCollection {
    pub subject_id: u64,
    pub subject_type: u8,
    #[serde(rename = "type")]
    pub collection_type: u8,
}

impl UserCollection {
    pub fn subject_type(&self) -> SubjectType {
        SubjectType::from_code(self.subject_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_cn: String,
    #[serde(default)]
    pub total_episodes: u64,
}

/// A raw episode. `airdate` is free text upstream and is often empty.
#[derive(Debug, Clone, Deserialize)]
pub struct Episode {
    pub id: u64,
    #[serde(default)]
    pub sort: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_cn: String,
    #[serde(default)]
    pub airdate: String,
    #[serde(default)]
    pub duration: String,
}
