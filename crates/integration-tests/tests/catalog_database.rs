//! Import into `PostgreSQL`, then read back through the storefront.
//!
//! These tests require a `PostgreSQL` database at `DATABASE_URL`; migrations
//! are applied on connect.
//!
//! Run with: `cargo test -p carsi-integration-tests -- --ignored`

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use uuid::Uuid;

use carsi_admin::db::{PgCatalog, ProductRepository as AdminProducts, ProductUpdate};
use carsi_admin::import::{DEFAULT_MAX_IMPORT_ROWS, Importer, sheet};
use carsi_integration_tests::{database_url, workbook};
use carsi_storefront::config::StorefrontConfig;
use carsi_storefront::db::{ProductRepository, listing_cache};
use carsi_storefront::state::AppState;

async fn pool() -> PgPool {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    sqlx::migrate!("../admin/migrations").run(&pool).await.unwrap();
    pool
}

/// Unique suffix so reruns against the same database don't collide on slugs.
fn run_tag() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

async fn import(pool: &PgPool, rows: &[&[&str]]) -> carsi_admin::import::ImportReport {
    let catalog = PgCatalog::new(pool.clone());
    let rows = sheet::read_workbook(workbook(rows).unwrap()).unwrap();
    Importer::new(&catalog, DEFAULT_MAX_IMPORT_ROWS)
        .run(rows)
        .await
}

fn storefront(pool: PgPool) -> Router {
    let config = StorefrontConfig {
        database_url: SecretString::from(database_url()),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: url::Url::parse("http://localhost:3000").unwrap(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    };
    carsi_storefront::app(
        AppState::new(config, pool),
        SessionManagerLayer::new(MemoryStore::default()),
    )
}

async fn json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_imported_products_are_listed_and_searchable() {
    let pool = pool().await;
    let tag = run_tag();
    let vazo = format!("Seramik Vazo {tag}");
    let tabak = format!("Seramik Tabak {tag}");
    let gizli = format!("Seramik Kase {tag}");

    let report = import(
        &pool,
        &[
            &["Ürün Adı", "Fiyat", "Stok", "Aktif", "Kategori", "Görsel", "Kısa Açıklama"],
            &[vazo.as_str(), "220", "3", "evet", "Dekorasyon", "https://cdn.example.com/vazo.jpg", ""],
            &[tabak.as_str(), "150", "0", "evet", "Dekorasyon", "", "100%_el yapımı"],
            &[gizli.as_str(), "90", "5", "hayır", "", "", ""],
        ],
    )
    .await;
    assert_eq!(report.success_count, 3);

    let cache = listing_cache();
    let repo = ProductRepository::new(&pool, &cache);

    let listed = repo.list_active().await.unwrap();
    assert!(listed.iter().any(|p| p.product.name == vazo));
    assert!(!listed.iter().any(|p| p.product.name == gizli));

    let detail = repo
        .get_active_by_slug(&carsi_core::slug::slugify(&vazo))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.images.len(), 1);
    assert_eq!(detail.images[0].position, 0);
    assert_eq!(detail.summary.category.unwrap().name, "Dekorasyon");

    let found = repo.search(&tag.to_uppercase()).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].product.name, tabak);

    // Wildcards in the query match literally.
    let literal = repo.search("100%_el").await.unwrap();
    assert!(literal.iter().any(|p| p.product.name == tabak));
    assert!(repo.search("%").await.unwrap().iter().all(|p| {
        p.product.name.contains('%') || p.product.short_description.contains('%')
    }));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_cart_persists_across_requests() {
    let pool = pool().await;
    let name = format!("Bakır Cezve {}", run_tag());
    import(&pool, &[&["Ürün Adı", "Fiyat", "Stok"], &[name.as_str(), "349.90", "2"]]).await;
    let product = ProductRepository::new(&pool, &listing_cache())
        .get_active_by_slug(&carsi_core::slug::slugify(&name))
        .await
        .unwrap()
        .unwrap();
    let id = product.summary.product.id;

    let app = storefront(pool);
    let add = |quantity: u32, cookie: Option<String>| {
        let mut request = Request::post("/api/cart/items")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        request
            .body(Body::from(format!(
                r#"{{"product_id":"{id}","quantity":{quantity}}}"#
            )))
            .unwrap()
    };

    let response = app.clone().oneshot(add(2, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let body = json(response).await;
    assert_eq!(body["notice"]["title"], "Sepete Eklendi");
    assert_eq!(body["summary"]["subtotal"], "699.80");
    assert_eq!(body["summary"]["shipping"], "0");

    // Stock ceiling is 2: the third unit is refused and nothing changes.
    let response = app.clone().oneshot(add(1, Some(cookie.clone()))).await.unwrap();
    let body = json(response).await;
    assert_eq!(body["notice"]["destructive"], true);
    assert_eq!(body["summary"]["item_count"], 2);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/cart/count")
                .header(header::COOKIE, cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json(response).await["count"], 2);

    let response = app
        .oneshot(
            Request::post("/api/checkout")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["valid"], true);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_admin_update_regenerates_slug_and_image() {
    let pool = pool().await;
    let tag = run_tag();
    let name = format!("Keten Örtü {tag}");
    import(&pool, &[&["Ürün Adı", "Fiyat"], &[name.as_str(), "260"]]).await;

    let cache = listing_cache();
    let created = ProductRepository::new(&pool, &cache)
        .get_active_by_slug(&carsi_core::slug::slugify(&name))
        .await
        .unwrap()
        .unwrap();
    let id = created.summary.product.id;

    let renamed = format!("Keten Masa Örtüsü {tag}");
    let update: ProductUpdate = serde_json::from_value(serde_json::json!({
        "name": renamed,
        "price": "240.00",
        "compare_price": "260.00",
        "stock_quantity": 6,
        "is_active": true,
        "weight": null,
        "dimensions": "140x180",
        "tags": ["keten"],
        "category_id": null,
        "image_url": "https://cdn.example.com/ortu.jpg"
    }))
    .unwrap();

    let admin = AdminProducts::new(&pool);
    let updated = admin.update(id, &update).await.unwrap();
    assert_eq!(updated.slug, carsi_core::slug::slugify(&renamed));
    assert_eq!(updated.price, Decimal::new(24000, 2));

    // Second update replaces the primary image instead of adding one.
    let mut again = update.clone();
    again.image_url = Some("https://cdn.example.com/ortu-2.jpg".to_string());
    admin.update(id, &again).await.unwrap();

    let images = admin.images(id).await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].image_url, "https://cdn.example.com/ortu-2.jpg");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_stale_snapshot_merges_at_current_price_and_stock() {
    let pool = pool().await;
    let name = format!("Pirinç Tepsi {}", run_tag());
    import(&pool, &[&["Ürün Adı", "Fiyat", "Stok"], &[name.as_str(), "180", "3"]]).await;
    let id = ProductRepository::new(&pool, &listing_cache())
        .get_active_by_slug(&carsi_core::slug::slugify(&name))
        .await
        .unwrap()
        .unwrap()
        .summary
        .product
        .id;
    let gone = Uuid::new_v4();

    let app = storefront(pool);
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/cart/items")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"product_id":"{id}","quantity":2}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    // Saved long ago: a lower price, a deleted product, more than is in stock.
    let stale = format!(
        r#"{{"state":{{"items":[
            {{"id":"{id}","name":"eski","price":"1.00","quantity":5,"stock":99,"slug":"eski"}},
            {{"id":"{gone}","name":"silinmiş","price":"5","quantity":1,"stock":9,"slug":"silinmis"}}
        ]}},"version":0}}"#
    );
    let response = app
        .oneshot(
            Request::post("/api/cart/merge")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(stale))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json(response).await;
    let items = body["cart"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(items[0]["price"], "180.00");
    assert_eq!(items[0]["name"], name.as_str());
}
