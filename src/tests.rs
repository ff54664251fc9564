//! Integration tests for the farm visit backend.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::SessionRegistry;
use crate::config::{Config, LogFormat};
use crate::db::{init_database, Repository};
use crate::storage::ObjectStorage;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    repo: Arc<Repository>,
    temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_export_dir(None).await
    }

    async fn with_export_dir(export_dir: Option<PathBuf>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let upload_dir = temp_dir.path().join("uploads");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));
        repo.ensure_admin("admin", "admin123")
            .await
            .expect("Failed to create admin");

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Create config
        let config = Config {
            db_path,
            upload_dir: upload_dir.clone(),
            public_url: base_url.clone(),
            bind_addr: addr,
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            export_dir,
        };

        let state = AppState {
            repo: repo.clone(),
            storage: Arc::new(ObjectStorage::new(&upload_dir, &config.public_url)),
            sessions: Arc::new(SessionRegistry::new()),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            repo,
            temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/session"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Log in as the bootstrap admin and return the session token.
    async fn admin_token(&self) -> String {
        let body: Value = self.login("admin", "admin123").await.json().await.unwrap();
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn submit(&self, record: Value) -> Value {
        let resp = self
            .client
            .post(self.url("/api/visits"))
            .json(&record)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }
}

fn visit_json(farmer: &str, farm_id: &str, location: &str, officer: &str, kind: &str) -> Value {
    json!({
        "farmer_name": farmer,
        "farm_id": farm_id,
        "phone_number": "0700000000",
        "village_location": location,
        "farm_size_acres": 2.0,
        "farm_type": "Crop",
        "visit_date": "2025-01-05",
        "visit_type": kind,
        "officer_name": officer,
        "time_spent_hours": 1.5,
        "advice_given": "Keep records",
        "follow_up_needed": false,
        "routine_check": false,
        "training_needed": false
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_login_success_and_failures() {
    let fixture = TestFixture::new().await;

    let resp = fixture.login("admin", "admin123").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], "admin");
    assert!(body["data"]["token"].as_str().unwrap().len() >= 32);

    let wrong_secret = fixture.login("admin", "wrong").await;
    assert_eq!(wrong_secret.status(), 401);
    let wrong_secret: Value = wrong_secret.json().await.unwrap();

    let unknown_user = fixture.login("nobody", "x").await;
    assert_eq!(unknown_user.status(), 401);
    let unknown_user: Value = unknown_user.json().await.unwrap();

    assert_eq!(wrong_secret["error"]["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong_secret["error"], unknown_user["error"]);
    assert_eq!(
        wrong_secret["error"]["message"],
        "Invalid username or password"
    );
}

#[tokio::test]
async fn test_dashboard_requires_session() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/visits"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = fixture
        .client
        .get(fixture.url("/api/visits"))
        .bearer_auth("not-a-session")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin_token().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/visits"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .delete(fixture.url("/api/session"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/visits"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_mixed_submission_renders_crop_then_livestock() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin_token().await;

    let mut record = visit_json("Jane Kato", "F-001", "Mukono", "Peter", "Routine");
    record["farm_type"] = json!("Mixed");
    record["main_crops"] = json!("Maize");
    record["crop_issues"] = json!(["Pests"]);
    record["livestock_type"] = json!("Goats");
    record["number_of_animals"] = json!(5);
    record["livestock_issues"] = json!([]);

    let created = fixture.submit(record).await;
    assert_eq!(created["success"], true);
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/visits/{}/report", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    let sections = body["data"]["sections"].as_array().unwrap();
    let kinds: Vec<&str> = sections
        .iter()
        .map(|s| s["kind"].as_str().unwrap())
        .collect();
    let crop_at = kinds.iter().position(|k| *k == "crop-information").unwrap();
    let livestock_at = kinds
        .iter()
        .position(|k| *k == "livestock-information")
        .unwrap();
    assert!(crop_at < livestock_at);

    let field = |section: &Value, label: &str| -> Option<Value> {
        section["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["label"] == label)
            .map(|f| f["value"]["value"].clone())
    };

    let crop = &sections[crop_at];
    assert_eq!(field(crop, "Main Crops").unwrap(), "Maize");
    assert_eq!(field(crop, "Crop Issues").unwrap(), "Pests");

    let livestock = &sections[livestock_at];
    assert_eq!(field(livestock, "Livestock Type").unwrap(), "Goats");
    assert_eq!(field(livestock, "Number of Animals").unwrap(), "5");
    assert!(field(livestock, "Livestock Issues").is_none());

    // The expanded view uses the same sections
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/visits/{}/expanded", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    let crop_html = html.find(r#"data-section="crop-information""#).unwrap();
    let livestock_html = html.find(r#"data-section="livestock-information""#).unwrap();
    assert!(crop_html < livestock_html);
    assert!(!html.contains("Livestock Issues"));
}

#[tokio::test]
async fn test_filter_emergency_and_kato() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin_token().await;

    let records = [
        ("Jane Kato", "F-01", "Mukono", "Peter", "Emergency"),
        ("Jane Kato", "F-02", "Mukono", "Peter", "Routine"),
        ("Sam Okello", "KATO-9", "Gulu", "Ann", "Emergency"),
        ("Mary", "F-04", "Katosi", "Ann", "Emergency"),
        ("Mary", "F-05", "Katosi", "Ann", "Follow-up"),
        ("Paul", "F-06", "Jinja", "Joseph Kato", "Emergency"),
        ("Paul", "F-07", "Jinja", "Joseph", "Emergency"),
        ("Ruth", "F-08", "Mbale", "Kenneth", "Routine"),
        ("Ruth", "F-09", "Mbale", "Kenneth", "Emergency"),
        ("Akatoo", "F-10", "Lira", "Grace", "Follow-up"),
    ];
    for (farmer, farm_id, location, officer, kind) in records {
        fixture
            .submit(visit_json(farmer, farm_id, location, officer, kind))
            .await;
    }

    let resp = fixture
        .client
        .get(fixture.url("/api/visits"))
        .query(&[("q", "kato"), ("type", "Emergency")])
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["data"]["total"], 4);
    assert_eq!(body["data"]["filteredBy"], "Emergency");

    // Newest first, so insertion order reversed
    let ids: Vec<&str> = body["data"]["visits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["farm_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["F-06", "F-04", "KATO-9", "F-01"]);

    let resp = fixture
        .client
        .get(fixture.url("/api/visits"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 10);
    assert!(body["data"].get("filteredBy").is_none());
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin_token().await;

    let created = fixture
        .submit(visit_json("Jane", "F-1", "Mukono", "Peter", "Routine"))
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/visits/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(fixture.repo.get_visit(&id).await.unwrap().is_some());

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/visits/{}?confirm=true", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(fixture.repo.get_visit(&id).await.unwrap().is_none());

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/visits/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_export_document() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin_token().await;

    let created = fixture
        .submit(visit_json("Jane Kato", "F-1", "Mukono", "Peter", "Emergency"))
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/visits/{}/export", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(
        resp.headers()["content-disposition"],
        "inline; filename=\"farm-visit-report-jane-kato.html\""
    );

    let html = resp.text().await.unwrap();
    assert!(html.contains("<title>Farm Visit Report - Jane Kato</title>"));
    assert!(html.contains("badge-emergency"));
    assert!(html.contains(&format!("Report ID: {}", id)));
    assert!(html.contains("window.print()"));
}

#[tokio::test]
async fn test_export_blocked_when_archive_unwritable() {
    let blocker = TempDir::new().unwrap();
    let not_a_dir = blocker.path().join("file");
    std::fs::write(&not_a_dir, "x").unwrap();

    let fixture = TestFixture::with_export_dir(Some(not_a_dir)).await;
    let token = fixture.admin_token().await;

    let created = fixture
        .submit(visit_json("Jane", "F-1", "Mukono", "Peter", "Routine"))
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/visits/{}/export", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "PRESENTATION_BLOCKED");
    assert_eq!(
        body["error"]["message"],
        "Please allow popups to download the PDF"
    );
}

#[tokio::test]
async fn test_export_archived() {
    let archive = TempDir::new().unwrap();
    let fixture = TestFixture::with_export_dir(Some(archive.path().to_path_buf())).await;
    let token = fixture.admin_token().await;

    let mut exported = Vec::new();
    for advice in ["Prune early", "Mulch the rows"] {
        let mut record = visit_json("Sam Okello", "F-2", "Gulu", "Ann", "Follow-up");
        record["advice_given"] = json!(advice);
        let created = fixture.submit(record).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let resp = fixture
            .client
            .get(fixture.url(&format!("/api/visits/{}/export", id)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        exported.push((id, resp.text().await.unwrap()));
    }

    assert_eq!(std::fs::read_dir(archive.path()).unwrap().count(), 2);
    for (id, html) in exported {
        let name = format!("farm-visit-report-sam-okello-{}.html", id);
        let archived = std::fs::read_to_string(archive.path().join(name)).unwrap();
        assert_eq!(archived, html);
    }
}

#[tokio::test]
async fn test_photo_upload_and_serve() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/uploads?filename=field.jpg"))
        .body(b"jpeg-bytes".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let public_url = body["data"]["publicUrl"].as_str().unwrap().to_string();
    assert!(public_url.starts_with(&fixture.url("/uploads/farm-photos/")));
    assert!(fixture
        .temp_dir
        .path()
        .join("uploads")
        .join(body["data"]["path"].as_str().unwrap())
        .exists());

    let served = fixture.client.get(&public_url).send().await.unwrap();
    assert_eq!(served.status(), 200);
    assert_eq!(&served.bytes().await.unwrap()[..], b"jpeg-bytes");

    let resp = fixture
        .client
        .post(fixture.url("/api/uploads"))
        .body(b"jpeg-bytes".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .post(fixture.url("/api/uploads?filename=badge.svg"))
        .body(b"<svg onload=\"alert(1)\"/>".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_crop_stage_lookup() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/crop-stages/lookup?crop=maize"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let stages = body["data"].as_array().unwrap();
    assert!(stages.contains(&json!("Tasseling")));

    let resp = fixture
        .client
        .get(fixture.url("/api/crop-stages/lookup?crop=Quinoa"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], json!([]));

    let resp = fixture
        .client
        .get(fixture.url("/api/crop-stages"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(!body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_submission_validation() {
    let fixture = TestFixture::new().await;

    let mut blank = visit_json("  ", "F-1", "Mukono", "Peter", "Routine");
    blank["advice_given"] = json!("Water");
    let resp = fixture
        .client
        .post(fixture.url("/api/visits"))
        .json(&blank)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let mut bad_stage = visit_json("Jane", "F-1", "Mukono", "Peter", "Routine");
    bad_stage["main_crops"] = json!("Maize");
    bad_stage["crop_stage"] = json!("Ripening");
    let resp = fixture
        .client
        .post(fixture.url("/api/visits"))
        .json(&bad_stage)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    bad_stage["crop_stage"] = json!("Tasseling");
    let created = fixture.submit(bad_stage).await;
    assert_eq!(created["data"]["crop_stage"], "Tasseling");
}

#[tokio::test]
async fn test_revision_increments_on_writes() {
    let fixture = TestFixture::new().await;
    let token = fixture.admin_token().await;

    let revision = |body: &Value| body["revisionId"].as_i64().unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/api/revision"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let before = revision(&resp.json::<Value>().await.unwrap());

    let created = fixture
        .submit(visit_json("Jane", "F-1", "Mukono", "Peter", "Routine"))
        .await;
    let after_create = revision(&created);
    assert!(after_create > before);

    let id = created["data"]["id"].as_str().unwrap();
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/visits/{}?confirm=true", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let deleted: Value = resp.json().await.unwrap();
    assert!(revision(&deleted) > after_create);
}
