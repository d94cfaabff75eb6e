use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Level;

/// A stored document: partition identity, family fields, timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    pub id: String,
    pub model: String,
    pub level: Level,
    pub grade: String,

    #[serde(flatten)]
    pub fields: T,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devoir_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examen_link: Option<String>,
}

/// Course payload. On create `name` is required; on patch every field is
/// optional and an empty string clears an optional link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub course_link: Option<String>,
    pub exercise_link: Option<String>,
    pub devoir_link: Option<String>,
    pub examen_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devoir {
    pub title: String,
    pub content: String,
    pub semester: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevoirInput {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Number or numeric string.
    pub semester: Option<serde_json::Value>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub title: String,
    pub year: i32,
    pub pdf_url: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInput {
    pub title: Option<String>,
    pub year: Option<serde_json::Value>,
    pub pdf_url: Option<String>,
    pub content: Option<String>,
    pub solution_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamBlanc {
    pub title: String,
    pub pdf_url: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamBlancInput {
    pub title: Option<String>,
    pub pdf_url: Option<String>,
    pub content: Option<String>,
    pub solution_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub description: String,
    pub author: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescription {
    pub page_path: String,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptionInput {
    pub page_path: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub is_active: Option<bool>,
}

/// Equality predicates accepted by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub semester: Option<u8>,
    pub year: Option<i32>,
    pub is_active: Option<bool>,
}
