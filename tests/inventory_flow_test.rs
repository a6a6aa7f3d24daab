mod common;

use assert_matches::assert_matches;
use common::{page_json, transaction_json, wine_json, TestBackend};
use serde_json::json;
use wine_cellar::models::{TransactionDraft, TransactionType, WineDraft, WinePatch};
use wine_cellar::services::alerts::AlertLevel;
use wine_cellar::services::validation::TransactionPolicy;
use wine_cellar::services::{InventoryService, WineService};
use wine_cellar::ServiceError;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn mount_wine_sequence(backend: &TestBackend, before: i32, after: i32) {
    Mock::given(method("GET"))
        .and(path("/api/wines/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wine_json(7, "Barolo", before, 10)))
        .up_to_n_times(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wines/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wine_json(7, "Barolo", after, 10)))
        .mount(&backend.server)
        .await;
}

fn posts_to(requests: &[wiremock::Request], route: &str) -> usize {
    requests
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == route)
        .count()
}

#[tokio::test]
async fn stock_out_records_and_refetches_wine() {
    let backend = TestBackend::logged_in("user").await;
    mount_wine_sequence(&backend, 12, 8).await;
    Mock::given(method("POST"))
        .and(path("/api/inventory/out"))
        .and(body_json(json!({"wine_id": 7, "quantity": 4, "reason": "dinner service"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(transaction_json(30, 7, "out", 4)))
        .expect(1)
        .mount(&backend.server)
        .await;

    let service = InventoryService::new(backend.client.clone(), TransactionPolicy::default());
    let draft = TransactionDraft::new(7, TransactionType::Out, 4).with_reason(" dinner service ");
    let movement = service.record(&draft).await.unwrap();

    assert_eq!(movement.transaction.id, 30);
    assert_eq!(movement.projection.projected_stock, 8);
    assert!(movement.projection.will_be_below_threshold);
    assert_eq!(movement.wine.current_stock, 8);
    assert!(!movement.diverged());
}

#[tokio::test]
async fn concurrent_change_shows_as_divergence() {
    let backend = TestBackend::logged_in("user").await;
    mount_wine_sequence(&backend, 12, 3).await;
    Mock::given(method("POST"))
        .and(path("/api/inventory/out"))
        .respond_with(ResponseTemplate::new(201).set_body_json(transaction_json(31, 7, "out", 4)))
        .mount(&backend.server)
        .await;

    let service = InventoryService::new(backend.client.clone(), TransactionPolicy::default());
    let draft = TransactionDraft::new(7, TransactionType::Out, 4).with_reason("sale");
    let movement = service.record(&draft).await.unwrap();

    assert_eq!(movement.wine.current_stock, 3);
    assert!(movement.diverged());
}

#[tokio::test]
async fn overdrawn_stock_out_is_rejected_before_submit() {
    let backend = TestBackend::logged_in("user").await;
    mount_wine_sequence(&backend, 3, 3).await;

    let service = InventoryService::new(backend.client.clone(), TransactionPolicy::default());
    let draft = TransactionDraft::new(7, TransactionType::Out, 5).with_reason("sale");
    let err = service.record(&draft).await.unwrap_err();

    assert_matches!(
        err,
        ServiceError::Validation(ref errors)
            if errors.get("quantity") == Some("Stock-out quantity cannot exceed current stock (3)")
    );
    let requests = backend.server.received_requests().await.unwrap();
    assert_eq!(posts_to(&requests, "/api/inventory/out"), 0);
}

#[tokio::test]
async fn reason_requirement_follows_policy() {
    let backend = TestBackend::logged_in("user").await;
    mount_wine_sequence(&backend, 5, 11).await;
    Mock::given(method("POST"))
        .and(path("/api/inventory/in"))
        .and(body_json(json!({"wine_id": 7, "quantity": 6})))
        .respond_with(ResponseTemplate::new(201).set_body_json(transaction_json(32, 7, "in", 6)))
        .expect(1)
        .mount(&backend.server)
        .await;

    let draft = TransactionDraft::new(7, TransactionType::In, 6);

    let strict = InventoryService::new(backend.client.clone(), TransactionPolicy::default());
    let err = strict.record(&draft).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::Validation(ref errors) if errors.get("reason") == Some("Reason is required")
    );

    let lenient = InventoryService::new(
        backend.client.clone(),
        TransactionPolicy {
            require_reason: false,
        },
    );
    let movement = lenient.record(&draft).await.unwrap();
    assert_eq!(movement.transaction.transaction_type, TransactionType::In);
    assert_eq!(movement.wine.current_stock, 11);
}

#[tokio::test]
async fn preview_projects_without_submitting() {
    let backend = TestBackend::logged_in("user").await;
    mount_wine_sequence(&backend, 6, 6).await;

    let service = InventoryService::new(backend.client.clone(), TransactionPolicy::default());
    let (wine, projection) = service
        .preview(&TransactionDraft::new(7, TransactionType::Out, 6))
        .await
        .unwrap();

    assert_eq!(wine.name, "Barolo");
    assert!(projection.is_valid);
    assert!(projection.will_be_out_of_stock);
    assert!(!projection.will_be_below_threshold);
    assert_eq!(projection.projected_level(), AlertLevel::OutOfStock);

    let requests = backend.server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn history_lists_wine_transactions() {
    let backend = TestBackend::logged_in("user").await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/wine/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            transaction_json(2, 7, "out", 1),
            transaction_json(1, 7, "in", 12)
        ])))
        .mount(&backend.server)
        .await;

    let service = InventoryService::new(backend.client.clone(), TransactionPolicy::default());
    let history = service.history(7).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].quantity, 12);
}

#[tokio::test]
async fn invalid_wine_never_reaches_the_backend() {
    let backend = TestBackend::logged_in("user").await;
    Mock::given(method("POST"))
        .and(path("/api/wines"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&backend.server)
        .await;

    let service = WineService::new(backend.client.clone(), 20);
    let mut draft = WineDraft::new("   ", "Piedmont", 2019);
    draft.current_stock = Some(-1);
    let err = service.create(draft).await.unwrap_err();

    assert_matches!(err, ServiceError::Validation(ref errors) => {
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert!(errors.contains("current_stock"));
    });
}

#[tokio::test]
async fn valid_wine_is_created_with_trimmed_fields() {
    let backend = TestBackend::logged_in("admin").await;
    Mock::given(method("POST"))
        .and(path("/api/wines"))
        .respond_with(ResponseTemplate::new(201).set_body_json(wine_json(40, "Barolo", 0, 10)))
        .expect(1)
        .mount(&backend.server)
        .await;

    let service = WineService::new(backend.client.clone(), 20);
    let mut draft = WineDraft::new(" Barolo ", "Piedmont", 2019);
    draft.notes = Some("   ".into());
    let wine = service.create(draft).await.unwrap();
    assert_eq!(wine.id, 40);

    let requests = backend.server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["name"], "Barolo");
    assert!(body.get("notes").map_or(true, |v| v.is_null()));
}

#[tokio::test]
async fn empty_update_is_refused() {
    let backend = TestBackend::logged_in("admin").await;
    let service = WineService::new(backend.client.clone(), 20);
    let err = service.update(7, WinePatch::default()).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn low_stock_report_scans_every_page() {
    let backend = TestBackend::logged_in("user").await;
    Mock::given(method("GET"))
        .and(path("/api/wines"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![
                wine_json(1, "Chianti", 50, 10),
                wine_json(2, "Rioja", 0, 10),
            ],
            1,
            2,
            4,
        )))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wines"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![
                wine_json(3, "Barolo", 4, 10),
                wine_json(4, "Amarone", 8, 10),
            ],
            2,
            2,
            4,
        )))
        .expect(1)
        .mount(&backend.server)
        .await;

    let service = WineService::new(backend.client.clone(), 2);
    let (summary, alerts) = service.low_stock_report().await.unwrap();

    assert_eq!(summary.out_of_stock_count, 1);
    assert_eq!(summary.critical_count, 1);
    assert_eq!(summary.low_stock_count, 1);
    assert_eq!(summary.total(), 3);

    let order: Vec<_> = alerts.iter().map(|a| (a.wine_id, a.level)).collect();
    assert_eq!(
        order,
        vec![
            (2, AlertLevel::OutOfStock),
            (3, AlertLevel::Critical),
            (4, AlertLevel::Low),
        ]
    );
}
