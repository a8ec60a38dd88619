//! Doctor roster models.

use serde::{Deserialize, Serialize};

use crate::utils::media_url;

/// Placeholder shown for doctors without an introduction.
const NO_INTRODUCTION: &str = "No introduction yet";

/// Doctor as embedded in department and schedule payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub title: String,
}

/// Full doctor record from `/doctors/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub introduction: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub department: Option<i64>,
}

impl Doctor {
    pub fn title_display(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn introduction_display(&self) -> &str {
        self.introduction
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NO_INTRODUCTION)
    }

    /// Avatar resolved against the media server, empty when unset.
    pub fn avatar_full_url(&self, media_base_url: &str) -> String {
        media_url(media_base_url, self.avatar_url.as_deref().unwrap_or(""))
    }
}

/// Fields accepted when creating or updating a doctor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorInput {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub introduction: String,
    pub avatar_url: Option<String>,
}

/// One page of `/doctors/?size=&index=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorPage {
    #[serde(default)]
    pub doctor_list: Vec<Doctor>,
    #[serde(default, alias = "count")]
    pub total: Option<u64>,
}

/// Result of an avatar upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    #[serde(default)]
    pub full_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctor_display_helpers() {
        let json = r#"{"id":3,"name":"Dr. Li","title":"Chief Physician","introduction":"","avatar_url":"/media/avatars/li.png"}"#;
        let doctor: Doctor = serde_json::from_str(json).unwrap();
        assert_eq!(doctor.title_display(), "Chief Physician");
        assert_eq!(doctor.introduction_display(), NO_INTRODUCTION);
        assert_eq!(
            doctor.avatar_full_url("http://media.example:8001"),
            "http://media.example:8001/media/avatars/li.png"
        );
    }

    #[test]
    fn test_doctor_without_avatar() {
        let doctor: Doctor = serde_json::from_str(r#"{"id":5,"name":"Dr. Liu"}"#).unwrap();
        assert_eq!(doctor.avatar_full_url("http://media.example:8001"), "");
        assert_eq!(doctor.title_display(), "");
    }

    #[test]
    fn test_doctor_page() {
        let json = r#"{"doctor_list":[{"id":1,"name":"Dr. Zhang"}],"count":31}"#;
        let page: DoctorPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.doctor_list.len(), 1);
        assert_eq!(page.total, Some(31));
    }
}
