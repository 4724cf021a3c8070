#![allow(clippy::unwrap_used)]
// End-to-end tests for `Inventory` over HTTP using wiremock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inventrack_core::{
    ClientConfig, CoreError, EntityId, ErrorKind, ErrorReporter, GatewayError, ImageFile, Inventory,
    LoadOutcome, MemoryStorage, Product, ProductDraft, SessionState, SnapshotStorage,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    inventory: Inventory,
    storage: Arc<MemoryStorage>,
    reported: Arc<Mutex<Vec<String>>>,
}

async fn setup() -> Harness {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let reported = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&reported);
    let reporter: ErrorReporter = Arc::new(move |err: &GatewayError| {
        sink.lock().unwrap().push(err.message.clone());
    });

    let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
    let dyn_storage: Arc<dyn SnapshotStorage> = storage.clone();
    let inventory = Inventory::with_storage(config, dyn_storage, Some(reporter)).unwrap();

    Harness {
        server,
        inventory,
        storage,
        reported,
    }
}

async fn mount_login(server: &MockServer, user_id: u64) {
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": user_id, "email": "ada@example.com", "fullName": "Ada" }
        })))
        .mount(server)
        .await;
}

/// A second inventory over existing storage, as after a restart.
fn reopen(server: &MockServer, storage: &Arc<MemoryStorage>) -> Inventory {
    let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
    let storage: Arc<dyn SnapshotStorage> = storage.clone();
    Inventory::with_storage(config, storage, None).unwrap()
}

async fn sign_in(inventory: &Inventory) {
    inventory
        .login("ada@example.com", &SecretString::from("hunter2".to_owned()))
        .await
        .unwrap();
}

async fn login(h: &Harness) {
    sign_in(&h.inventory).await;
}

fn widget(id: i64, store_quantity: u32) -> Product {
    serde_json::from_value(json!({
        "id": id, "name": "Widget", "store_quantity": store_quantity
    }))
    .unwrap()
}

async fn mount_collections(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "Widget" }])),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/suppliers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [{ "id": 3, "name": "Acme" }] })),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profiles/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": 7, "full_name": "Ada", "email": "ada@example.com"
        })))
        .expect(1)
        .mount(server)
        .await;
}

// ── Session lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn test_login_starts_one_load_per_store() {
    let h = setup().await;
    mount_login(&h.server, 7).await;
    mount_collections(&h.server).await;

    h.inventory.start().await;
    login(&h).await;

    let mut products = h.inventory.products().subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        while !products.latest().has_loaded_once {
            products.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    let mut profile = h.inventory.profile().subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        while profile.latest().data.is_none() {
            profile.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    let snap = h.inventory.products().snapshot();
    assert_eq!(snap.len(), 1);
    assert!(!snap.loading);
    assert_eq!(snap.error, None);
    assert_eq!(
        h.inventory.products().get(&EntityId::from(1)).unwrap().name,
        "Widget"
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    h.inventory.shutdown().await;
    // Mock expectations (one GET per resource) are verified on drop.
}

#[tokio::test]
async fn test_logout_clears_stores_and_storage() {
    let h = setup().await;
    mount_login(&h.server, 7).await;
    mount_collections(&h.server).await;
    Mock::given(method("POST"))
        .and(path("/user/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    login(&h).await;
    let outcomes = h.inventory.load_all().await.unwrap();
    assert_eq!(outcomes[0], LoadOutcome::Loaded(1));
    assert!(!h.storage.keys().is_empty());

    h.inventory.logout().await.unwrap();

    assert_eq!(h.inventory.session(), SessionState::Anonymous);
    assert!(h.inventory.products().snapshot().is_empty());
    assert!(h.inventory.profile().profile().is_none());
    assert!(h.storage.keys().is_empty());
}

#[tokio::test]
async fn test_restore_session_with_valid_cookie() {
    let h = setup().await;
    Mock::given(method("GET"))
        .and(path("/user/validate-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "user": { "id": 7, "email": "ada@example.com" }
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let user = h.inventory.restore_session().await.unwrap().unwrap();

    assert_eq!(user.id, "7");
    assert_eq!(h.inventory.session(), SessionState::Authenticated(user));
}

#[tokio::test]
async fn test_restore_session_after_expiry_stays_anonymous() {
    let h = setup().await;
    Mock::given(method("GET"))
        .and(path("/user/validate-token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    assert!(h.inventory.restore_session().await.unwrap().is_none());
    assert_eq!(h.inventory.session(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_signup_establishes_session() {
    let h = setup().await;
    Mock::given(method("POST"))
        .and(path("/user/signup"))
        .and(body_json(json!({
            "email": "grace@example.com",
            "password": "hunter2",
            "fullName": "Grace"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user": { "id": 9, "email": "grace@example.com", "fullName": "Grace" }
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let user = h
        .inventory
        .signup(
            "grace@example.com",
            &SecretString::from("hunter2".to_owned()),
            Some("Grace"),
        )
        .await
        .unwrap();

    assert_eq!(user.full_name.as_deref(), Some("Grace"));
    assert_eq!(
        h.inventory.session().user().map(|u| u.id.as_str()),
        Some("9")
    );
}

#[tokio::test]
async fn test_same_user_keeps_cache_with_quoted_profile_id() {
    let h = setup().await;
    mount_login(&h.server, 5).await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "Widget" }])),
        )
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profiles/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "5", "full_name": "Ada"
        })))
        .mount(&h.server)
        .await;

    login(&h).await;
    h.inventory.load_all().await.unwrap();
    assert_eq!(
        h.inventory.profile().profile().unwrap().user_id,
        EntityId::from(5)
    );

    // Snapshots written before the owner key existed are matched against
    // the cached profile instead.
    h.storage.remove("owner").unwrap();
    let restarted = reopen(&h.server, &h.storage);
    assert_eq!(restarted.products().snapshot().len(), 1);

    sign_in(&restarted).await;
    assert_eq!(restarted.products().snapshot().len(), 1);
    assert!(restarted.profile().profile().is_some());
}

#[tokio::test]
async fn test_other_user_login_drops_cached_collections() {
    let h = setup().await;
    mount_login(&h.server, 7).await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "Widget" }])),
        )
        .mount(&h.server)
        .await;

    login(&h).await;
    h.inventory.products().load().await.unwrap();
    assert!(h.inventory.profile().profile().is_none());

    let other_server = MockServer::start().await;
    mount_login(&other_server, 8).await;
    let restarted = reopen(&other_server, &h.storage);
    assert_eq!(restarted.products().snapshot().len(), 1);

    sign_in(&restarted).await;
    assert!(restarted.products().snapshot().is_empty());
}

#[tokio::test]
async fn test_start_twice_spawns_loaders_once() {
    let h = setup().await;
    assert!(h.inventory.start().await);
    assert!(!h.inventory.start().await);
    h.inventory.shutdown().await;
}

#[tokio::test]
async fn test_store_stream_yields_current_then_changes() {
    let h = setup().await;
    let mut stream = h.inventory.products().subscribe().into_stream();

    let first = stream.next().await.unwrap();
    assert!(first.is_empty());

    h.inventory.products().add(widget(4, 2)).unwrap();
    let next = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.len(), 1);
    assert!(!next.loading);
}

#[tokio::test]
async fn test_load_all_requires_session() {
    let h = setup().await;
    let err = h.inventory.load_all().await.unwrap_err();
    assert!(matches!(err, CoreError::NotAuthenticated));
}

#[tokio::test]
async fn test_failed_list_lands_on_snapshot() {
    let h = setup().await;
    mount_login(&h.server, 7).await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .mount(&h.server)
        .await;

    login(&h).await;
    let outcome = h.inventory.products().load().await.unwrap();

    assert!(matches!(outcome, LoadOutcome::Failed(ref e) if e.kind == ErrorKind::Server));
    let snap = h.inventory.products().snapshot();
    assert_eq!(
        snap.error.as_deref(),
        Some("The server reported an error: db down")
    );
    assert_eq!(*h.reported.lock().unwrap(), vec!["db down".to_owned()]);
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejected_create_is_reported_and_not_added() {
    let h = setup().await;
    Mock::given(method("POST"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "name is required",
            "errors": { "name": "must not be empty" }
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h
        .inventory
        .create_product(&ProductDraft::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Validation));
    assert!(h.inventory.products().snapshot().is_empty());
    assert_eq!(*h.reported.lock().unwrap(), vec!["name is required".to_owned()]);
}

#[tokio::test]
async fn test_create_then_edit_then_delete() {
    let h = setup().await;
    Mock::given(method("POST"))
        .and(path("/products"))
        .and(body_json(json!({
            "name": "Widget",
            "unit_cost": 1.0,
            "unit_price": 2.0,
            "store_quantity": 0,
            "warehouse_quantity": 0,
            "reorder_level": 0
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 11, "name": "Widget", "unit_cost": 1.0, "unit_price": 2.0
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/products/11"))
        .and(body_json(json!({ "unit_price": 2.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 11, "name": "Widget", "unit_cost": 1.0, "unit_price": 2.5
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/products/11"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    let draft = ProductDraft {
        name: "Widget".into(),
        unit_cost: 1.0,
        unit_price: 2.0,
        ..ProductDraft::default()
    };
    let created = h.inventory.create_product(&draft).await.unwrap();
    assert_eq!(created.id, EntityId::from(11));

    let submitted = json!({ "name": "Widget", "unit_price": 2.5 });
    let outcome = h
        .inventory
        .edit_product(&created, submitted.as_object().unwrap())
        .await
        .unwrap();
    assert!(!outcome.is_no_changes());
    let edited = h.inventory.products().get(&EntityId::from(11)).unwrap();
    assert!((edited.unit_price - 2.5).abs() < f64::EPSILON);

    // Same values again: nothing to send (the PUT mock expects exactly one call).
    let again = h
        .inventory
        .edit_product(&edited, submitted.as_object().unwrap())
        .await
        .unwrap();
    assert!(again.is_no_changes());

    h.inventory.delete_product(&EntityId::from(11)).await.unwrap();
    assert!(h.inventory.products().snapshot().is_empty());
}

#[tokio::test]
async fn test_unmergeable_edit_is_rejected_before_sending() {
    let h = setup().await;
    Mock::given(method("PUT"))
        .and(path("/products/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 11, "name": "Widget", "store_quantity": 7
        })))
        .expect(0)
        .mount(&h.server)
        .await;

    let original = widget(11, 3);
    h.inventory.products().add(original.clone()).unwrap();

    let submitted = json!({ "store_quantity": 7.0 });
    let err = h
        .inventory
        .edit_product(&original, submitted.as_object().unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::InvalidPatch { .. }), "got {err:?}");
    let cached = h.inventory.products().get(&EntityId::from(11)).unwrap();
    assert_eq!(cached.store_quantity, 3);
}

#[tokio::test]
async fn test_upload_avatar_updates_profile() {
    let h = setup().await;
    mount_login(&h.server, 7).await;
    mount_collections(&h.server).await;
    Mock::given(method("POST"))
        .and(path("/storage/7/profile-image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "imageUrl": "https://cdn.example.com/7.png"
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/profiles/7"))
        .and(body_json(json!({ "avatar_url": "https://cdn.example.com/7.png" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": 7, "avatar_url": "https://cdn.example.com/7.png"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    login(&h).await;
    h.inventory.load_all().await.unwrap();

    let url = h
        .inventory
        .upload_avatar(ImageFile {
            file_name: "me.png".into(),
            content_type: "image/png".into(),
            bytes: Bytes::from_static(b"\x89PNG"),
        })
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.example.com/7.png");
    let profile = h.inventory.profile().profile().unwrap();
    assert_eq!(profile.avatar_url.as_deref(), Some(url.as_str()));
    assert_eq!(profile.full_name.as_deref(), Some("Ada"));
}
