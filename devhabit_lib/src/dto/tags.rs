use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{new_tag_id, Tag};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

/// Wrapper for the tag list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagsCollectionDto {
    pub data: Vec<TagDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTagDto {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTagDto {
    pub name: String,
    pub description: Option<String>,
}

impl From<&Tag> for TagDto {
    fn from(tag: &Tag) -> Self {
        TagDto {
            id: tag.id.clone(),
            name: tag.name.clone(),
            description: tag.description.clone(),
            created_at_utc: tag.created_at_utc,
            updated_at_utc: tag.updated_at_utc,
        }
    }
}

impl CreateTagDto {
    pub fn to_entity(&self, now: DateTime<Utc>) -> Tag {
        Tag {
            id: new_tag_id(),
            name: self.name.clone(),
            description: self.description.clone(),
            created_at_utc: now,
            updated_at_utc: None,
        }
    }
}

impl Tag {
    pub fn update_from_dto(&mut self, dto: &UpdateTagDto, now: DateTime<Utc>) {
        self.name = dto.name.clone();
        self.description = dto.description.clone();
        self.updated_at_utc = Some(now);
    }

    /// Copies the patchable fields of a patched DTO back onto the entity.
    pub fn apply_patched(&mut self, dto: &TagDto, now: DateTime<Utc>) {
        self.name = dto.name.clone();
        self.description = dto.description.clone();
        self.updated_at_utc = Some(now);
    }
}
