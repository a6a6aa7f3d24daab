#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use wine_cellar::auth::{AuthService, MemorySessionStore, SessionHandle};
use wine_cellar::client::ApiClient;
use wine_cellar::config::ClientConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-access-token";

/// Mock backend plus a client wired to it with an in-memory session store.
pub struct TestBackend {
    pub server: MockServer,
    pub store: Arc<MemorySessionStore>,
    pub session: SessionHandle,
    pub client: ApiClient,
    pub auth: AuthService,
}

impl TestBackend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let config = ClientConfig::with_base_url(format!("{}/api", server.uri()));
        let store = Arc::new(MemorySessionStore::new());
        let session = SessionHandle::new(store.clone());
        let client = ApiClient::new(&config, session.clone()).expect("client builds");
        let auth = AuthService::new(client.clone());
        Self {
            server,
            store,
            session,
            client,
            auth,
        }
    }

    /// Starts a backend and logs in as a user with the given role.
    pub async fn logged_in(role: &str) -> Self {
        let backend = Self::start().await;
        backend.mount_login(role).await;
        backend
            .auth
            .login("clerk@cellar.test", "correct-horse", false)
            .await
            .expect("login succeeds");
        backend.server.reset().await;
        backend
    }

    pub async fn mount_login(&self, role: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_json(role)))
            .mount(&self.server)
            .await;
    }
}

pub fn user_json(role: &str) -> Value {
    json!({
        "id": 2,
        "email": "clerk@cellar.test",
        "name": "Cellar Clerk",
        "role": role,
        "is_active": true,
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-01-01T00:00:00"
    })
}

pub fn token_json(role: &str) -> Value {
    json!({
        "access_token": TOKEN,
        "token_type": "bearer",
        "user": user_json(role)
    })
}

pub fn wine_json(id: i64, name: &str, stock: i32, threshold: i32) -> Value {
    json!({
        "id": id,
        "name": name,
        "vintage_year": 2018,
        "region": "Bordeaux",
        "grape_variety": "Merlot",
        "price": 120.0,
        "supplier": null,
        "storage_location": "B-02",
        "current_stock": stock,
        "low_stock_threshold": threshold,
        "notes": null,
        "image_url": null,
        "created_by": 1,
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-01-01T00:00:00"
    })
}

pub fn transaction_json(id: i64, wine_id: i64, kind: &str, quantity: i32) -> Value {
    json!({
        "id": id,
        "wine_id": wine_id,
        "transaction_type": kind,
        "quantity": quantity,
        "reason": "test",
        "performed_by": 2,
        "created_at": "2024-03-01T12:00:00.481233",
        "wine_name": "Test Wine",
        "performer_name": "Cellar Clerk"
    })
}

pub fn page_json(items: Vec<Value>, page: u32, total_pages: u32, total: u64) -> Value {
    let page_size = items.len().max(1);
    json!({
        "items": items,
        "total": total,
        "page": page,
        "page_size": page_size,
        "total_pages": total_pages
    })
}
