use backend_k8_rs::{
    app::App,
    controller::{Controller, CONTINUATION_TOKEN_HEADER},
    modules::{
        department::{self, repository::Department},
        user::{self, repository::User},
    },
    repository::MemoryRepository,
    types::Context,
    utils::{
        config::{AppConfig, LogFormat},
        database::DatabaseConnection,
        logging::Logger,
    },
};
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::StatusCode;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::oneshot};

struct TestServer {
    base_url: String,
    ctx: Arc<Context>,
    departments: Arc<Controller<MemoryRepository<Department>>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(departments: Vec<Department>, users: Vec<User>) -> Self {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://backend@127.0.0.1:1/backend")
            .unwrap();
        let ctx = Arc::new(Context::new(
            AppConfig {
                host: String::from("127.0.0.1"),
                port: 0,
                service_name: String::from("listing-test"),
                log_format: LogFormat::Pretty,
            },
            Logger::new("listing-test"),
            DatabaseConnection { pool },
            vec![],
        ));

        let department_controller = Arc::new(Controller::new(
            MemoryRepository::new(departments),
            ctx.logger().scoped("department"),
        ));
        let user_controller = Arc::new(Controller::new(
            MemoryRepository::new(users),
            ctx.logger().scoped("user"),
        ));

        let mut endpoints = department::endpoints(department_controller.clone());
        endpoints.extend(user::endpoints(user_controller));

        let app = App::with_endpoints(ctx.clone(), endpoints);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            app.serve_with(listener, async {
                let _ = signal.await;
            })
            .await;
        });

        Self {
            base_url,
            ctx,
            departments: department_controller,
            shutdown: Some(shutdown),
            handle,
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::get(format!("{}{}", self.base_url, path)).await.unwrap()
    }

    async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.handle.await.unwrap();
    }
}

fn timestamp(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, day)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap()
}

fn departments(count: usize) -> Vec<Department> {
    (0..count)
        .rev()
        .map(|i| Department {
            id: format!("dep-{:02}", i),
            name: format!("Department {:02}", i),
            created_at: timestamp(1 + (i % 28) as u32),
            updated_at: None,
        })
        .collect()
}

fn users(count: usize) -> Vec<User> {
    (0..count)
        .map(|i| User {
            id: format!("user-{:02}", i),
            first_name: format!("First {:02}", i),
            last_name: format!("Last {:02}", count - i),
            email: format!("user{:02}@example.com", i),
            department_id: Some(String::from("dep-00")),
            created_at: timestamp(1),
            updated_at: None,
        })
        .collect()
}

fn item_names(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn department_pages_in_name_order() {
    let server = TestServer::spawn(departments(25), vec![]).await;

    let response = server
        .get("/departments?limit=10&offset=0&orderby=name&sort=asc")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    let expected: Vec<String> = (0..10).map(|i| format!("Department {:02}", i)).collect();
    assert_eq!(item_names(&body), expected);
    assert!(!body["meta"]["continuation_token"]
        .as_str()
        .unwrap()
        .is_empty());

    let body: Value = server
        .get("/departments?limit=10&offset=20&orderby=name&sort=asc")
        .await
        .json()
        .await
        .unwrap();

    let expected: Vec<String> = (20..25).map(|i| format!("Department {:02}", i)).collect();
    assert_eq!(item_names(&body), expected);
    assert_eq!(body["meta"]["continuation_token"], "");

    server.stop().await;
}

#[tokio::test]
async fn zero_limit_is_rejected_before_storage() {
    let server = TestServer::spawn(departments(25), vec![]).await;

    let response = server
        .get("/departments?limit=0&offset=0&orderby=name&sort=asc")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_argument");

    let response = server.get("/departments?orderby=budget").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(server.departments.repository().calls(), 0);

    server.stop().await;
}

#[tokio::test]
async fn continuation_tokens_walk_every_record_once() {
    let server = TestServer::spawn(departments(25), vec![]).await;

    let mut seen: Vec<String> = vec![];
    let mut path = String::from("/departments?limit=7&orderby=created_at&sort=desc");

    loop {
        let body: Value = server.get(&path).await.json().await.unwrap();
        seen.extend(
            body["items"]
                .as_array()
                .unwrap()
                .iter()
                .map(|item| item["id"].as_str().unwrap().to_string()),
        );

        let token = body["meta"]["continuation_token"].as_str().unwrap();
        if token.is_empty() {
            break;
        }
        path = format!("/departments?limit=7&token={}", token);
    }

    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(seen.len(), 25);
    assert_eq!(unique.len(), 25);
    assert_eq!(server.departments.repository().calls(), 4);

    server.stop().await;
}

#[tokio::test]
async fn both_user_listings_share_one_operation() {
    let server = TestServer::spawn(vec![], users(12)).await;

    let paginated: Value = server
        .get("/users?limit=5&orderby=last_name")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(paginated["items"][0]["last_name"], "Last 01");
    assert_eq!(paginated["meta"]["count"], 5);

    let response = server.get("/v2/users?limit=5&orderby=last_name").await;
    let token = response
        .headers()
        .get(CONTINUATION_TOKEN_HEADER.as_str())
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let records: Value = response.json().await.unwrap();

    assert_eq!(records, paginated["items"]);
    assert_eq!(token, paginated["meta"]["continuation_token"].as_str().unwrap());

    server.stop().await;
}

#[tokio::test]
async fn stopping_the_server_releases_resources() {
    let server = TestServer::spawn(departments(1), vec![]).await;
    let ctx = server.ctx.clone();

    assert_eq!(server.get("/departments").await.status(), StatusCode::OK);

    server.stop().await;
    assert!(ctx.database().pool.is_closed());
}
