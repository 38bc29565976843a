#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{dev::ServiceResponse, test};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use taskdesk::auth::AuthResponse;
use taskdesk::config::Config;
use taskdesk::email::{EmailMessage, MailError, Mailer};
use taskdesk::store::MemoryStore;
use taskdesk::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}

impl RecordingMailer {
    pub async fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|message| message.subject.clone())
            .collect()
    }
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn context() -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(&Config::for_tests(TEST_SECRET), store.clone(), mailer.clone());
    TestContext {
        state,
        store,
        mailer,
    }
}

// Helper struct to hold auth details
pub struct TestUser {
    pub user: Value,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (String, String) {
        ("Authorization".to_string(), format!("Bearer {}", self.token))
    }
}

pub async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    name: &str,
    email: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(&json!({
            "name": name,
            "email": email,
            "password": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if status != actix_web::http::StatusCode::CREATED {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    into_test_user(&body)
}

pub async fn login_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/users/login")
        .set_json(&json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Failed to log in. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    into_test_user(&body)
}

const BOUNDARY: &str = "taskdesk-test-boundary";

/// Builds a one-file `multipart/form-data` body. Returns the content-type
/// header and the encoded body.
pub fn multipart_file(
    field: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> ((String, String), Vec<u8>) {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
        b = BOUNDARY,
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    (
        (
            "Content-Type".to_string(),
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ),
        body,
    )
}

fn into_test_user(body: &[u8]) -> Result<TestUser, String> {
    // Parse once as the typed response to make sure the contract holds, then
    // keep the raw user JSON for field-level assertions.
    let typed: AuthResponse =
        serde_json::from_slice(body).map_err(|e| format!("Bad auth response: {}", e))?;
    let raw: Value =
        serde_json::from_slice(body).map_err(|e| format!("Bad auth response: {}", e))?;
    Ok(TestUser {
        user: raw["user"].clone(),
        token: typed.token,
    })
}
