//! Integration tests for the department, doctor, schedule and article calls

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use clinic_core::models::ArticleKind;
use clinic_core::{ApiError, AuthClient, ClinicApi, TokenStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MEDIA: &str = "http://media.test";

fn api_for(server: &MockServer) -> ClinicApi {
    let store = TokenStore::in_memory();
    store.set_access("a1");
    store.set_refresh("r1");
    let client = AuthClient::new(
        format!("{}/api", server.uri()),
        Duration::from_secs(5),
        Arc::new(store),
    )
    .unwrap();
    ClinicApi::new(client, MEDIA)
}

#[tokio::test]
async fn test_departments_unwraps_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/departments/"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "message": "success",
            "type": "department",
            "data": [
                {
                    "id": 1,
                    "name": "Internal Medicine",
                    "introduction": "General consultations",
                    "doctors": [{"id": 4, "name": "Dr. Li", "title": "Chief Physician"}]
                },
                {"id": 2, "name": "Dental"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let departments = api_for(&server).departments().await.unwrap();
    assert_eq!(departments.len(), 2);
    assert_eq!(departments[0].doctor_count(), 1);
    assert_eq!(departments[0].doctors[0].name, "Dr. Li");
    assert_eq!(departments[1].doctor_count(), 0);
}

#[tokio::test]
async fn test_envelope_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/departments/42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 404,
            "message": "Department does not exist",
            "data": null
        })))
        .mount(&server)
        .await;

    let result = api_for(&server).department(42).await;
    assert!(matches!(
        result,
        Err(ApiError::Rejected { code: 404, ref message }) if message == "Department does not exist"
    ));
}

#[tokio::test]
async fn test_doctor_page_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/doctors/"))
        .and(query_param("size", "10"))
        .and(query_param("index", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {
                "doctor_list": [
                    {"id": 11, "name": "Dr. Wang", "title": "Attending", "department": 1}
                ],
                "total": 11
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api_for(&server).doctors(10, 2).await.unwrap();
    assert_eq!(page.total, Some(11));
    assert_eq!(page.doctor_list[0].department, Some(1));
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/doctors/7/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/departments/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 400,
            "message": "Department still has doctors"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.delete_doctor(7).await.unwrap();
    assert!(matches!(
        api.delete_department(3).await,
        Err(ApiError::Rejected { code: 400, .. })
    ));
}

#[tokio::test]
async fn test_avatar_upload_is_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload/doctor-avatar/5/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 201,
            "message": "uploaded",
            "url": "/media/avatars/5.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let image = api
        .upload_doctor_avatar(5, "5.png", vec![0x89, b'P', b'N', b'G'])
        .await
        .unwrap();
    assert_eq!(image.url, "/media/avatars/5.png");
    assert_eq!(image.full_url, "http://media.test/media/avatars/5.png");

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"image\""));
    assert!(body.contains("filename=\"5.png\""));
}

#[tokio::test]
async fn test_avatar_upload_rejection_keeps_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload/doctor-avatar/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 400,
            "message": "Image too large"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = api_for(&server)
        .upload_doctor_avatar(3, "big.jpg", vec![0xff, 0xd8, 0xff])
        .await;
    assert!(matches!(
        result,
        Err(ApiError::Rejected { code: 400, ref message }) if message == "Image too large"
    ));
}

#[tokio::test]
async fn test_avatar_upload_rejects_empty_file() {
    let server = MockServer::start().await;
    let result = api_for(&server).upload_doctor_avatar(5, "empty.png", Vec::new()).await;
    assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_default_schedules_filtered_by_department() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/default-schedules/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": [
                {"id": 1, "department": 2, "dates": "0,1,2,3,4"},
                {"id": 2, "department": 3, "dates": "5,6"}
            ]
        })))
        .mount(&server)
        .await;

    let rules = api_for(&server).default_schedules(3).await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].days(), vec![5, 6]);
    // Saturday and Sunday in Sunday-first order
    assert_eq!(rules[0].work_day_mask(), [1, 0, 0, 0, 0, 0, 1]);
}

#[tokio::test]
async fn test_update_work_days_posts_backend_numbering() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/default-schedules/"))
        .and(body_json(json!({
            "departments": [4],
            "schedules": {"4": [{"department": 4, "dates": "6,0,2"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 201, "message": "saved"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    // Sunday, Monday, Wednesday
    api.update_department_work_days(4, &[1, 1, 0, 1, 0, 0, 0])
        .await
        .unwrap();

    assert!(matches!(
        api.update_default_schedules(&BTreeMap::new()).await,
        Err(ApiError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_articles_by_kind() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("type", "kepu"))
        .and(query_param("index", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {
                "articles": [{"id": 8, "title": "Flu season tips", "content": "Wash hands"}],
                "total": 1
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/articles/8/"))
        .and(query_param("type", "kepu"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let page = api.articles(ArticleKind::Science, 10, 0).await.unwrap();
    assert_eq!(page.articles[0].title, "Flu season tips");
    api.delete_article(ArticleKind::Science, 8).await.unwrap();
}

#[tokio::test]
async fn test_all_department_duty_keeps_partial_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/departments/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": [{"id": 1, "name": "Internal Medicine"}, {"id": 2, "name": "Dental"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/departments/1/schedules/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": [{
                "id": 30,
                "date": "2026-10-19",
                "start_time": "08:00:00",
                "end_time": "12:00:00",
                "doctors": []
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/departments/2/schedules/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let rosters = api_for(&server).all_department_duty().await.unwrap();
    assert_eq!(rosters.len(), 2);
    let first = rosters[0].1.as_ref().unwrap();
    assert_eq!(first[0].hours_display(), "08:00-12:00");
    assert!(matches!(rosters[1].1, Err(ApiError::ServerError(_))));
}
