//! Storage-side row shapes.
//!
//! These mirror the tables under `src/schema/` one to one. Request and response shapes live
//! in [`crate::api`] and are converted from these rows at the handler boundary.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub pdf_file: Option<String>,
    pub youtube_link: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub id: String,
    pub material_id: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub owner_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Association row between a material and a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialTag {
    pub material_id: String,
    pub tag_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub id: String,
    pub owner_id: String,
    pub folder_id: String,
    pub name: String,
    pub cron_expression: String,
    pub target_url: String,
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// UTC timestamp with a fixed-width fraction so that text ordering matches time ordering.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
