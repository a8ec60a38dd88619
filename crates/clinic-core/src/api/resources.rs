//! Typed wrappers for the clinic's REST resources.
//!
//! Every call goes through `AuthClient::send`, so protected endpoints get the
//! bearer token and the single refresh-and-retry on 401. Payloads come back in
//! the `{code, message, data}` envelope; codes outside 200/201/204 surface as
//! `ApiError::Rejected`.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiError, AuthClient, PendingRequest};
use crate::models::{
    Article, ArticleInput, ArticleKind, ArticlePage, DefaultScheduleRule, Department,
    DepartmentInput, Doctor, DoctorInput, DoctorPage, DoctorSummary, DutySchedule, Envelope,
    Schedule, ScheduleUpdate, UploadedImage, SUCCESS_CODES,
};
use crate::utils::{media_url, weekday};

// ============================================================================
// Constants
// ============================================================================

/// Default page size for paginated lists.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Timeout for updates and deletes, which the backend handles slowly.
const MUTATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for image uploads.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Multipart field the avatar endpoint reads.
const AVATAR_FIELD: &str = "image";

/// Flat reply of the avatar upload endpoint.
#[derive(Deserialize)]
struct UploadReply {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct DefaultScheduleEntry {
    department: i64,
    dates: String,
}

#[derive(Serialize)]
struct DefaultScheduleUpdate {
    departments: Vec<i64>,
    schedules: BTreeMap<String, Vec<DefaultScheduleEntry>>,
}

impl DefaultScheduleUpdate {
    fn new(rules: &BTreeMap<i64, Vec<u8>>) -> Self {
        Self {
            departments: rules.keys().copied().collect(),
            schedules: rules
                .iter()
                .map(|(&department, days)| {
                    (
                        department.to_string(),
                        vec![DefaultScheduleEntry {
                            department,
                            dates: weekday::join_days(days),
                        }],
                    )
                })
                .collect(),
        }
    }
}

/// Resource API for departments, doctors, schedules and articles.
#[derive(Clone)]
pub struct ClinicApi {
    client: AuthClient,
    media_base_url: String,
}

impl ClinicApi {
    pub fn new(client: AuthClient, media_base_url: impl Into<String>) -> Self {
        Self {
            client,
            media_base_url: media_base_url.into(),
        }
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    pub fn media_base_url(&self) -> &str {
        &self.media_base_url
    }

    /// Send and unwrap the envelope's payload.
    async fn data<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.client.json(request).await?;
        envelope.into_data()
    }

    /// Send and check the envelope's code only.
    async fn status(&self, request: PendingRequest) -> Result<(), ApiError> {
        let path = request.path().to_string();
        let response = self.client.send(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(());
        }
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })?;
        envelope.into_status()
    }

    // ===== Departments =====

    /// Fetch all departments with their doctor summaries
    pub async fn departments(&self) -> Result<Vec<Department>, ApiError> {
        self.data(PendingRequest::get("/departments/")).await
    }

    pub async fn department(&self, id: i64) -> Result<Department, ApiError> {
        self.data(PendingRequest::get(format!("/departments/{}/", id)))
            .await
    }

    /// Doctors assigned to a department
    pub async fn department_doctors(&self, id: i64) -> Result<Vec<DoctorSummary>, ApiError> {
        Ok(self.department(id).await?.doctors)
    }

    pub async fn create_department(&self, input: &DepartmentInput) -> Result<Department, ApiError> {
        let request = PendingRequest::post("/departments/").json(input)?;
        self.data(request).await
    }

    pub async fn update_department(
        &self,
        id: i64,
        input: &DepartmentInput,
    ) -> Result<Department, ApiError> {
        let request = PendingRequest::put(format!("/departments/{}/", id))
            .json(input)?
            .timeout(MUTATION_TIMEOUT);
        self.data(request).await
    }

    pub async fn delete_department(&self, id: i64) -> Result<(), ApiError> {
        let request =
            PendingRequest::delete(format!("/departments/{}/", id)).timeout(MUTATION_TIMEOUT);
        self.status(request).await
    }

    /// Two-week duty roster of a department
    pub async fn department_duty(&self, id: i64) -> Result<Vec<DutySchedule>, ApiError> {
        self.data(PendingRequest::get(format!("/departments/{}/schedules/", id)))
            .await
    }

    /// Duty rosters of every department, fetched concurrently.
    /// A failing department does not hide the others.
    pub async fn all_department_duty(
        &self,
    ) -> Result<Vec<(Department, Result<Vec<DutySchedule>, ApiError>)>, ApiError> {
        let departments = self.departments().await?;
        let futures = departments.iter().map(|d| self.department_duty(d.id));
        let rosters = futures::future::join_all(futures).await;
        debug!(count = departments.len(), "Fetched department rosters");
        Ok(departments.into_iter().zip(rosters).collect())
    }

    // ===== Doctors =====

    /// Fetch one page of the doctor roster (`index` is 1-based)
    pub async fn doctors(&self, size: u32, index: u32) -> Result<DoctorPage, ApiError> {
        let request = PendingRequest::get("/doctors/")
            .query("size", size.max(1))
            .query("index", index.max(1));
        self.data(request).await
    }

    pub async fn doctor(&self, id: i64) -> Result<Doctor, ApiError> {
        self.data(PendingRequest::get(format!("/doctors/{}/", id))).await
    }

    pub async fn create_doctor(&self, input: &DoctorInput) -> Result<Doctor, ApiError> {
        let request = PendingRequest::post("/doctors/").json(input)?;
        self.data(request).await
    }

    pub async fn update_doctor(&self, id: i64, input: &DoctorInput) -> Result<Doctor, ApiError> {
        let request = PendingRequest::put(format!("/doctors/{}/", id))
            .json(input)?
            .timeout(MUTATION_TIMEOUT);
        self.data(request).await
    }

    pub async fn delete_doctor(&self, id: i64) -> Result<(), ApiError> {
        let request = PendingRequest::delete(format!("/doctors/{}/", id)).timeout(MUTATION_TIMEOUT);
        self.status(request).await
    }

    /// Upload a doctor's avatar image. The returned image carries the URL
    /// resolved against the media server.
    pub async fn upload_doctor_avatar(
        &self,
        doctor_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::InvalidRequest("Avatar image is empty".to_string()));
        }
        let request = PendingRequest::post(format!("/upload/doctor-avatar/{}/", doctor_id))
            .file(AVATAR_FIELD, file_name, image_mime(file_name), bytes)
            .timeout(UPLOAD_TIMEOUT);

        let reply: UploadReply = self.client.json(request).await?;
        if !SUCCESS_CODES.contains(&reply.code) {
            return Err(ApiError::Rejected {
                code: reply.code,
                message: reply.message,
            });
        }
        let url = reply
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("Upload reply carried no image URL".to_string()))?;
        Ok(UploadedImage {
            full_url: media_url(&self.media_base_url, &url),
            url,
        })
    }

    // ===== Schedules =====

    pub async fn schedule(&self, id: i64) -> Result<Schedule, ApiError> {
        self.data(PendingRequest::get(format!("/schedules/{}/", id))).await
    }

    pub async fn update_schedule(
        &self,
        id: i64,
        update: &ScheduleUpdate,
    ) -> Result<Schedule, ApiError> {
        let request = PendingRequest::put(format!("/schedules/{}/", id))
            .json(update)?
            .timeout(MUTATION_TIMEOUT);
        self.data(request).await
    }

    /// Weekly default rules of one department
    pub async fn default_schedules(
        &self,
        department: i64,
    ) -> Result<Vec<DefaultScheduleRule>, ApiError> {
        let rules: Vec<DefaultScheduleRule> =
            self.data(PendingRequest::get("/default-schedules/")).await?;
        Ok(rules
            .into_iter()
            .filter(|rule| rule.department == department)
            .collect())
    }

    /// Replace the weekly rules of several departments at once.
    /// `rules` maps department id to backend weekday numbers.
    pub async fn update_default_schedules(
        &self,
        rules: &BTreeMap<i64, Vec<u8>>,
    ) -> Result<(), ApiError> {
        if rules.is_empty() {
            return Err(ApiError::InvalidRequest("No departments to update".to_string()));
        }
        let request =
            PendingRequest::post("/default-schedules/").json(&DefaultScheduleUpdate::new(rules))?;
        self.status(request).await
    }

    /// Replace one department's weekly rule from a Sunday-first work-day mask.
    pub async fn update_department_work_days(
        &self,
        department: i64,
        mask: &[u8; 7],
    ) -> Result<(), ApiError> {
        let mut rules = BTreeMap::new();
        rules.insert(department, weekday::to_backend_days(mask));
        self.update_default_schedules(&rules).await
    }

    // ===== Articles =====

    /// Fetch one page of articles of a kind (`index` is 1-based)
    pub async fn articles(
        &self,
        kind: ArticleKind,
        size: u32,
        index: u32,
    ) -> Result<ArticlePage, ApiError> {
        let request = PendingRequest::get("/articles")
            .query("size", size.max(1))
            .query("index", index.max(1))
            .query("type", kind);
        self.data(request).await
    }

    pub async fn create_article(
        &self,
        kind: ArticleKind,
        input: &ArticleInput,
    ) -> Result<Article, ApiError> {
        let request = PendingRequest::post("/articles")
            .query("type", kind)
            .json(input)?;
        self.data(request).await
    }

    pub async fn update_article(
        &self,
        kind: ArticleKind,
        id: i64,
        input: &ArticleInput,
    ) -> Result<Article, ApiError> {
        let request = PendingRequest::put(format!("/articles/{}/", id))
            .query("type", kind)
            .json(input)?
            .timeout(MUTATION_TIMEOUT);
        self.data(request).await
    }

    pub async fn delete_article(&self, kind: ArticleKind, id: i64) -> Result<(), ApiError> {
        let request = PendingRequest::delete(format!("/articles/{}/", id))
            .query("type", kind)
            .timeout(MUTATION_TIMEOUT);
        self.status(request).await
    }
}

/// MIME type for an image file name, by extension.
fn image_mime(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_payload() {
        let mut rules = BTreeMap::new();
        rules.insert(2, vec![0, 4]);
        rules.insert(5, vec![6]);
        let payload = serde_json::to_value(DefaultScheduleUpdate::new(&rules)).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "departments": [2, 5],
                "schedules": {
                    "2": [{"department": 2, "dates": "0,4"}],
                    "5": [{"department": 5, "dates": "6"}]
                }
            })
        );
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime("avatar.PNG"), Some("image/png"));
        assert_eq!(image_mime("me.jpeg"), Some("image/jpeg"));
        assert_eq!(image_mime("notes.txt"), None);
        assert_eq!(image_mime("no_extension"), None);
    }
}
