//! HTTP integration tests: the full router driven in-process with
//! `tower::ServiceExt::oneshot`, a manual clock and counting stores.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use todo_service::accounts::{Account, AccountStore, InMemoryAccountStore, SaveOutcome, TierTransition};
use todo_service::config::AppConfig;
use todo_service::identity::{ManualClock, Tier};
use todo_service::server::build_app;
use todo_service::todos::{InMemoryTodoStore, Todo, TodoStore};

#[derive(Default)]
struct CountingAccounts {
    inner: InMemoryAccountStore,
    calls: AtomicUsize,
}

impl CountingAccounts {
    fn tick(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }
}

impl AccountStore for CountingAccounts {
    fn find_by_id(&self, id: &str) -> Result<Option<Account>> { self.tick(); self.inner.find_by_id(id) }
    fn find_by_contact(&self, c: &str) -> Result<Option<Account>> { self.tick(); self.inner.find_by_contact(c) }
    fn exists_by_contact(&self, c: &str) -> Result<bool> { self.tick(); self.inner.exists_by_contact(c) }
    fn save(&self, a: Account) -> Result<SaveOutcome> { self.tick(); self.inner.save(a) }
    fn transition_tier(&self, id: &str, from: Tier, to: Tier) -> Result<TierTransition> {
        self.tick();
        self.inner.transition_tier(id, from, to)
    }
}

#[derive(Default)]
struct CountingTodos {
    inner: InMemoryTodoStore,
    calls: AtomicUsize,
}

impl CountingTodos {
    fn tick(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }
}

impl TodoStore for CountingTodos {
    fn insert_capped(&self, t: Todo, cap: Option<usize>) -> Result<bool> { self.tick(); self.inner.insert_capped(t, cap) }
    fn list_by_owner(&self, o: &str) -> Result<Vec<Todo>> { self.tick(); self.inner.list_by_owner(o) }
    fn find(&self, id: &str) -> Result<Option<Todo>> { self.tick(); self.inner.find(id) }
    fn update(&self, t: Todo) -> Result<bool> { self.tick(); self.inner.update(t) }
    fn delete(&self, id: &str) -> Result<bool> { self.tick(); self.inner.delete(id) }
}

struct Harness {
    app: Router,
    clock: Arc<ManualClock>,
    accounts: Arc<CountingAccounts>,
    todos: Arc<CountingTodos>,
}

impl Harness {
    fn new() -> Result<Self> {
        let vars = [
            ("TODO_JWT_SECRET", "integration-access-secret-0123456789abcdef"),
            ("TODO_JWT_REFRESH_SECRET", "integration-refresh-secret-0123456789abcde"),
        ];
        let config = AppConfig::from_lookup(|k| vars.iter().find(|(name, _)| *name == k).map(|(_, v)| v.to_string()))?;
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let accounts = Arc::new(CountingAccounts::default());
        let todos = Arc::new(CountingTodos::default());
        let app = build_app(&config, accounts.clone(), todos.clone(), clock.clone())?;
        Ok(Self { app, clock, accounts, todos })
    }

    fn store_calls(&self) -> usize {
        self.accounts.calls.load(Ordering::SeqCst) + self.todos.calls.load(Ordering::SeqCst)
    }

    async fn send(&self, method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = bearer {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(v) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(v.to_string()))?,
            None => req.body(Body::empty())?,
        };
        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = resp.into_body().collect().await?.to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        Ok((status, value))
    }

    async fn sign_up(&self, email: &str) -> Result<Value> {
        let (status, body) = self
            .send(Method::POST, "/api/auth/signup", None, Some(json!({"email": email, "userName": "kim", "password": "password123"})))
            .await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        Ok(body)
    }

    async fn sign_in(&self, email: &str) -> Result<Value> {
        let (status, body) =
            self.send(Method::POST, "/api/auth/signin", None, Some(json!({"email": email, "password": "password123"}))).await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        Ok(body)
    }
}

fn access(login: &Value) -> String {
    login["token"]["accessToken"].as_str().unwrap_or_default().to_string()
}

fn refresh(login: &Value) -> String {
    login["token"]["refreshToken"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn public_routes_answer_without_a_token() -> Result<()> {
    let h = Harness::new()?;
    let (status, body) = h.send(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    let (status, _) = h.send(Method::GET, "/", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn sign_up_sign_in_and_manage_todos() -> Result<()> {
    let h = Harness::new()?;
    let created = h.sign_up("kim@example.com").await?;
    assert_eq!(created["userName"], "kim");
    assert_eq!(created["joinDate"], "2023-11-14");

    let login = h.sign_in("kim@example.com").await?;
    assert_eq!(login["id"], created["id"]);
    assert_eq!(login["role"], "COMMON");
    let token = access(&login);

    let (status, body) = h.send(Method::GET, "/api/todos", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"todos": []}));

    let (status, body) = h.send(Method::POST, "/api/todos", Some(&token), Some(json!({"title": "buy milk"}))).await?;
    assert_eq!(status, StatusCode::OK);
    let id = body["todos"][0]["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(body["todos"][0]["title"], "buy milk");
    assert_eq!(body["todos"][0]["done"], false);

    let uri = format!("/api/todos/{id}");
    let (status, body) = h.send(Method::PATCH, &uri, Some(&token), Some(json!({"done": true}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["todos"][0]["done"], true);

    let (status, body) = h.send(Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"todos": []}));

    let (status, body) = h.send(Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "todo_not_found");
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_and_broken_tokens() -> Result<()> {
    let h = Harness::new()?;
    let (status, body) = h.send(Method::GET, "/api/todos", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "unauthorized");

    let (status, body) = h.send(Method::GET, "/api/todos", Some("not-a-token"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_malformed");
    Ok(())
}

#[tokio::test]
async fn rejected_requests_never_reach_the_stores() -> Result<()> {
    let h = Harness::new()?;
    h.sign_up("kim@example.com").await?;
    let login = h.sign_in("kim@example.com").await?;
    let token = access(&login);
    let stale_refresh = refresh(&login);
    h.clock.advance(31);
    let before = h.store_calls();

    for (method, uri, bearer) in [
        (Method::GET, "/api/todos", None),
        (Method::POST, "/api/todos", Some("a.b.c")),
        (Method::PUT, "/api/users/promote", Some(token.as_str())),
        (Method::DELETE, "/api/todos/whatever", Some(stale_refresh.as_str())),
    ] {
        let (status, _) = h.send(method, uri, bearer, Some(json!({"title": "x"}))).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(h.store_calls(), before);
    Ok(())
}

#[tokio::test]
async fn access_tokens_live_thirty_seconds_and_refresh_mints_a_new_one() -> Result<()> {
    let h = Harness::new()?;
    h.sign_up("kim@example.com").await?;
    let login = h.sign_in("kim@example.com").await?;
    let token = access(&login);

    h.clock.advance(10);
    let (status, _) = h.send(Method::GET, "/api/todos", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    h.clock.advance(21);
    let (status, body) = h.send(Method::GET, "/api/todos", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_expired");

    let (status, body) =
        h.send(Method::POST, "/api/auth/refresh", None, Some(json!({"refreshToken": refresh(&login)}))).await?;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["accessToken"].as_str().unwrap_or_default().to_string();
    assert_ne!(fresh, token);
    let (status, _) = h.send(Method::GET, "/api/todos", Some(&fresh), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        h.send(Method::POST, "/api/auth/refresh", None, Some(json!({"refreshToken": fresh}))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_invalid_signature");
    Ok(())
}

#[tokio::test]
async fn refresh_token_is_not_a_bearer_credential() -> Result<()> {
    let h = Harness::new()?;
    h.sign_up("kim@example.com").await?;
    let login = h.sign_in("kim@example.com").await?;
    let (status, body) = h.send(Method::GET, "/api/todos", Some(&refresh(&login)), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_invalid_signature");
    Ok(())
}

#[tokio::test]
async fn standard_quota_and_one_time_promotion() -> Result<()> {
    let h = Harness::new()?;
    h.sign_up("kim@example.com").await?;
    let login = h.sign_in("kim@example.com").await?;
    let standard = access(&login);

    for i in 0..5 {
        let (status, _) = h.send(Method::POST, "/api/todos", Some(&standard), Some(json!({"title": format!("t{i}")}))).await?;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = h.send(Method::POST, "/api/todos", Some(&standard), Some(json!({"title": "t5"}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "quota_exceeded");

    let (status, promoted) = h.send(Method::PUT, "/api/users/promote", Some(&standard), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"], "PREMIUM");
    let premium = access(&promoted);

    let (status, body) = h.send(Method::POST, "/api/todos", Some(&premium), Some(json!({"title": "t5"}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["todos"].as_array().map(Vec::len), Some(6));

    // the pre-promotion token still carries COMMON until it expires
    let (status, _) = h.send(Method::POST, "/api/todos", Some(&standard), Some(json!({"title": "t6"}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for token in [&standard, &premium] {
        let (status, body) = h.send(Method::PUT, "/api/users/promote", Some(token), None).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "ineligible_for_promotion");
    }
    Ok(())
}

#[tokio::test]
async fn sign_in_failures_look_the_same() -> Result<()> {
    let h = Harness::new()?;
    h.sign_up("kim@example.com").await?;
    let unknown =
        h.send(Method::POST, "/api/auth/signin", None, Some(json!({"email": "lee@example.com", "password": "password123"}))).await?;
    let wrong =
        h.send(Method::POST, "/api/auth/signin", None, Some(json!({"email": "kim@example.com", "password": "password999"}))).await?;
    assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong);
    Ok(())
}

#[tokio::test]
async fn sign_up_rules_and_contact_check() -> Result<()> {
    let h = Harness::new()?;
    let (_, taken) = h.send(Method::GET, "/api/auth/check?email=kim@example.com", None, None).await?;
    assert_eq!(taken, json!(false));

    h.sign_up("kim@example.com").await?;
    let (_, taken) = h.send(Method::GET, "/api/auth/check?email=KIM@example.com", None, None).await?;
    assert_eq!(taken, json!(true));

    let (status, body) = h
        .send(Method::POST, "/api/auth/signup", None, Some(json!({"email": "kim@example.com", "userName": "kim", "password": "password123"})))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_email");

    let (status, body) = h
        .send(Method::POST, "/api/auth/signup", None, Some(json!({"email": "lee@example.com", "userName": "l", "password": "password123"})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");

    let (status, body) = h.send(Method::POST, "/api/auth/signup", None, Some(json!({"email": "lee@example.com"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");

    let (status, _) = h.send(Method::GET, "/api/auth/check", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn anonymous_routes_ignore_any_bearer_token() -> Result<()> {
    let h = Harness::new()?;
    h.sign_up("kim@example.com").await?;
    let (status, _) = h
        .send(Method::POST, "/api/auth/signin", Some("garbage"), Some(json!({"email": "kim@example.com", "password": "password123"})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn todos_are_private_to_their_owner() -> Result<()> {
    let h = Harness::new()?;
    h.sign_up("kim@example.com").await?;
    h.sign_up("lee@example.com").await?;
    let kim = access(&h.sign_in("kim@example.com").await?);
    let lee = access(&h.sign_in("lee@example.com").await?);

    let (_, body) = h.send(Method::POST, "/api/todos", Some(&kim), Some(json!({"title": "secret"}))).await?;
    let id = body["todos"][0]["id"].as_str().unwrap_or_default().to_string();

    let (_, body) = h.send(Method::GET, "/api/todos", Some(&lee), None).await?;
    assert_eq!(body, json!({"todos": []}));
    let (status, _) = h.send(Method::PATCH, &format!("/api/todos/{id}"), Some(&lee), Some(json!({"done": true}))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn request_id_is_echoed() -> Result<()> {
    let h = Harness::new()?;
    let req = Request::builder().uri("/health").header("x-request-id", "trace-42").body(Body::empty())?;
    let resp = h.app.clone().oneshot(req).await?;
    assert_eq!(resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()), Some("trace-42"));
    Ok(())
}
