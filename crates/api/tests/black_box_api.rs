use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};
use workhub_api::config::ApiConfig;
use workhub_auth::{IdentityClaims, PrincipalId};
use workhub_core::UserId;

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let config = ApiConfig::for_tests(SECRET);
        let app = workhub_api::app::build_app(&config);
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        read(res).await
    }

    async fn delete(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let res = self.client.delete(self.url(path)).bearer_auth(token).send().await.unwrap();
        read(res).await
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(res).await
    }

    async fn put(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(res).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn mint_jwt(secret: &str, user: &str) -> String {
    let now = Utc::now();
    let claims = IdentityClaims {
        sub: PrincipalId::new(UserId::new(user).unwrap()),
        name: Some(user.to_uppercase()),
        email: Some(format!("{user}@example.com")),
        picture: None,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn id(body: &Value) -> String {
    body["id"].as_str().expect("response has an id").to_string()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("other-secret", "user_a");
    let (status, _) = srv.get(&forged, "/workspaces").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn principal_is_derived_from_token_and_mirrored() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(SECRET, "user_a");

    let (status, body) = srv.get(&token, "/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principal_id"], "user_a");
    assert_eq!(body["display_name"], "USER_A");
    assert_eq!(body["email"], "user_a@example.com");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn launch_scenario_over_http() {
    let srv = TestServer::spawn().await;
    let a = mint_jwt(SECRET, "user_a");
    let b = mint_jwt(SECRET, "user_b");
    let c = mint_jwt(SECRET, "user_c");
    // Mirror b and c.
    srv.get(&b, "/whoami").await;
    srv.get(&c, "/whoami").await;

    let (status, ws) = srv.post(&a, "/workspaces", json!({ "name": "Alpha" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let ws_id = id(&ws);

    let (status, project) = srv
        .post(&a, &format!("/workspaces/{ws_id}/projects"), json!({ "name": "Launch" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = id(&project);

    let (status, membership) = srv
        .post(
            &a,
            &format!("/projects/{project_id}/members"),
            json!({ "user_id": "user_b", "role": "member" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(membership["scope"], "project");

    let (status, task) = srv
        .post(&b, &format!("/projects/{project_id}/tasks"), json!({ "title": "Write spec" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = id(&task);

    let (status, body) = srv
        .put(&a, &format!("/tasks/{task_id}/assignee"), json!({ "assignee_id": "user_c" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_assignee");

    let (_, task) = srv.get(&a, &format!("/tasks/{task_id}")).await;
    assert_eq!(task["assignee"], Value::Null);

    let (status, task) = srv
        .put(&a, &format!("/tasks/{task_id}/assignee"), json!({ "assignee_id": "user_b" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["assignee_id"], "user_b");

    // The nested view: workspace -> projects -> tasks -> assignee.
    let (status, list) = srv.get(&b, "/workspaces").await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    let tasks = &list[0]["projects"][0]["tasks"];
    assert_eq!(tasks[0]["assignee"]["display_name"], "USER_B");

    let (_, list) = srv.get(&c, "/workspaces").await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn outsiders_get_identical_not_found_responses() {
    let srv = TestServer::spawn().await;
    let a = mint_jwt(SECRET, "user_a");
    let x = mint_jwt(SECRET, "user_x");

    let (_, ws) = srv.post(&a, "/workspaces", json!({ "name": "Alpha" })).await;
    let ws_id = id(&ws);

    let (forbidden_status, forbidden_body) = srv.get(&x, &format!("/workspaces/{ws_id}")).await;
    let missing = "0190f0b8-0000-7000-8000-000000000000";
    let (missing_status, missing_body) = srv.get(&x, &format!("/workspaces/{missing}")).await;
    let (garbage_status, garbage_body) = srv.get(&x, "/workspaces/not-a-uuid").await;

    assert_eq!(forbidden_status, StatusCode::NOT_FOUND);
    assert_eq!(forbidden_status, missing_status);
    assert_eq!(missing_status, garbage_status);
    assert_eq!(forbidden_body, missing_body);
    assert_eq!(missing_body, garbage_body);
    assert_eq!(forbidden_body["error"], "not_found");

    let (status, _) = srv
        .post(&x, &format!("/workspaces/{ws_id}/projects"), json!({ "name": "Sneaky" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn workspace_deletion_is_owner_only_and_cascades() {
    let srv = TestServer::spawn().await;
    let a = mint_jwt(SECRET, "user_a");
    let m = mint_jwt(SECRET, "user_m");
    srv.get(&m, "/whoami").await;

    let (_, ws) = srv.post(&a, "/workspaces", json!({ "name": "Alpha" })).await;
    let ws_id = id(&ws);
    let (status, _) = srv
        .post(&a, &format!("/workspaces/{ws_id}/members"), json!({ "user_id": "user_m" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, project) = srv
        .post(&a, &format!("/workspaces/{ws_id}/projects"), json!({ "name": "Launch" }))
        .await;
    let project_id = id(&project);
    let (_, task) = srv
        .post(&m, &format!("/projects/{project_id}/tasks"), json!({ "title": "Triage" }))
        .await;
    let task_id = id(&task);

    let (status, body) = srv.delete(&m, &format!("/workspaces/{ws_id}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "role_insufficient");

    let (status, body) = srv.delete(&a, &format!("/workspaces/{ws_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"]["projects"], 1);
    assert_eq!(body["deleted"]["tasks"], 1);

    let (status, _) = srv.get(&a, &format!("/projects/{project_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = srv.get(&m, &format!("/tasks/{task_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let a = mint_jwt(SECRET, "user_a");

    let (status, body) = srv.post(&a, "/workspaces", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}
