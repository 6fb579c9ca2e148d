#![allow(dead_code)]

use bookshelf_app::{fixtures, App};
use bookshelf_authz::Role;
use bookshelf_kernel::{Services, Settings};
use serde_json::Value;

/// A bookshelf instance on an OS-assigned port with its own in-memory store.
pub struct TestServer {
    pub base: String,
    pub services: Services,
    pub client: reqwest::Client,
    pub admin_token: String,
    pub user_token: String,
}

/// Spin up a server with an empty store.
pub async fn spawn_empty() -> TestServer {
    let app = App::bootstrap(Settings::in_memory()).await.unwrap();
    let router = app.router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let services = app.services.clone();
    let admin_token = services
        .auth
        .issue(fixtures::ADMIN_EMAIL, &[Role::User, Role::Admin])
        .unwrap();
    let user_token = services.auth.issue(fixtures::USER_EMAIL, &[Role::User]).unwrap();

    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        services,
        client: reqwest::Client::new(),
        admin_token,
        user_token,
    }
}

/// Spin up a server loaded with the demo fixtures: authors 1-10, books 1-20.
pub async fn spawn_seeded() -> TestServer {
    let server = spawn_empty().await;
    fixtures::load(&server.services).await.unwrap();
    server
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn get_json(&self, path: &str) -> Value {
        let resp = self.get(path).await;
        assert_eq!(resp.status(), 200, "GET {path}");
        resp.json().await.unwrap()
    }

    pub async fn post_as(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn put_as(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete_as(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// Create an author through the API and return its id.
    pub async fn create_author(&self, first_name: &str, last_name: &str) -> i64 {
        let resp = self
            .post_as(
                &self.admin_token,
                "/api/authors",
                serde_json::json!({ "firstName": first_name, "lastName": last_name }),
            )
            .await;
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }
}

/// Ids of a JSON array of books, in response order.
pub fn ids(books: &Value) -> Vec<i64> {
    books
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_i64().unwrap())
        .collect()
}
