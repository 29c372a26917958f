use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use staff_portal::auth::session::SESSION_COOKIE;
use staff_portal::clock::ManualClock;
use staff_portal::config::Config;
use staff_portal::crypto::SigningKeys;
use staff_portal::db;

pub const TEST_SECRET: &str = "test-secret-key-that-is-long-enough";
pub const ADMIN_EMAIL: &str = "admin@test.com";
pub const ADMIN_PASSWORD: &str = "password123";

/// A running test server over a private in-memory database and a clock the
/// test controls.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: SqlitePool,
    pub client: Client,
    pub clock: ManualClock,
    pub keys: SigningKeys,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register the bootstrap administrator.
    pub async fn register(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({
                "email": email,
                "password": password,
                "first_name": "Ada",
                "last_name": "Admin",
            }))
            .send()
            .await
            .expect("register request failed");
        read(resp).await
    }

    /// Login, returning the body, status and the session cookie value if one was set.
    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode, Option<String>) {
        self.login_from(email, password, None).await
    }

    pub async fn login_from(
        &self,
        email: &str,
        password: &str,
        forwarded_for: Option<&str>,
    ) -> (Value, StatusCode, Option<String>) {
        let mut req = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        if let Some(xff) = forwarded_for {
            req = req.header("x-forwarded-for", xff);
        }
        let resp = req.send().await.expect("login request failed");
        let cookie = session_cookie(&resp);
        let (body, status) = read(resp).await;
        (body, status, cookie)
    }

    /// Register the bootstrap administrator and log in, returning its session cookie.
    pub async fn bootstrap(&self) -> String {
        let (body, status) = self.register(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::CREATED, "bootstrap register failed: {body}");
        let (body, status, cookie) = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "bootstrap login failed: {body}");
        cookie.expect("login sets a session cookie")
    }

    /// GET with the session cookie, returning the raw response.
    pub async fn get_with_session(&self, path: &str, session: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("cookie", format!("{SESSION_COOKIE}={session}"))
            .send()
            .await
            .expect("get request failed")
    }

    pub async fn get_auth(&self, path: &str, session: &str) -> (Value, StatusCode) {
        read(self.get_with_session(path, session).await).await
    }

    pub async fn post_auth(&self, path: &str, session: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .header("cookie", format!("{SESSION_COOKIE}={session}"))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        read(resp).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        read(resp).await
    }

    pub async fn password_hash(&self, user_id: i64) -> Option<String> {
        db::users::find_by_id(&self.pool, user_id)
            .await
            .expect("user lookup failed")
            .expect("user exists")
            .password_hash
    }
}

pub async fn read(resp: Response) -> (Value, StatusCode) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    (body, status)
}

/// The value of the `portal_session` cookie set by a response, if any.
pub fn session_cookie(resp: &Response) -> Option<String> {
    let prefix = format!("{SESSION_COOKIE}=");
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix(&prefix))
        .map(|v| v.split(';').next().unwrap_or("").to_string())
        .next()
}

/// Spawn a test app with a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");
    db::migrate(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        secret_key: TEST_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        max_body_size: 1_048_576,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        smtp: None,
    };

    let clock = ManualClock::new(Utc::now());
    let app = staff_portal::build_app(pool.clone(), config, Arc::new(clock.clone()));

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        clock,
        keys: SigningKeys::derive(TEST_SECRET),
    }
}
