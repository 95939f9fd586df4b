use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sitedex_core::{shard_id, SiteIndexer, SitePaths};
use std::fs;
use tempfile::{tempdir, TempDir};
use sitedex_server::ServeConfig;
use tower::ServiceExt;

fn build_tiny_site() -> (TempDir, SitePaths) {
    let dir = tempdir().unwrap();
    let paths = SitePaths::new(dir.path().join("data"), dir.path().join("assets"), dir.path().join("cache"));
    fs::create_dir_all(paths.data_root.join("guide")).unwrap();
    fs::write(paths.data_root.join("rust.md"), "---\ntags: [lang]\n---\nrust systems programming\n").unwrap();
    fs::write(paths.data_root.join("guide/wiki.md"), "---\ntags: [lang, docs]\n---\nwiki pages\n").unwrap();
    SiteIndexer::open(paths.clone()).unwrap().build().unwrap();
    (dir, paths)
}

fn app(paths: &SitePaths) -> Router {
    sitedex_server::build_app(&ServeConfig::new(&paths.assets_root)).unwrap()
}

async fn call(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

#[tokio::test]
async fn search_unions_terms() {
    let (_dir, paths) = build_tiny_site();

    let (status, body) = call(app(&paths), "/search?q=rust").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["results"], serde_json::json!(["rust.md"]));

    // Multi-term queries return the union of matches, not the intersection.
    let (_, body) = call(app(&paths), "/search?q=rust+wiki").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["results"], serde_json::json!(["guide/wiki.md", "rust.md"]));

    let (_, body) = call(app(&paths), "/search?q=absent").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 0);
}

#[tokio::test]
async fn property_endpoints() {
    let (_dir, paths) = build_tiny_site();

    let (status, body) = call(app(&paths), "/properties?name=tags").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({"docs": 1, "lang": 2}));

    let (_, body) = call(app(&paths), "/references?name=tags&value=lang").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!(["guide/wiki.md", "rust.md"]));
}

#[tokio::test]
async fn serves_partition_files() {
    let (_dir, paths) = build_tiny_site();

    let shard = shard_id("rust");
    let (status, body) = call(app(&paths), &format!("/assets/fullText/{shard}.json")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["rust"]["rust.md"], 1);

    let (status, _) = call(app(&paths), "/assets/fullText/zz.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(app(&paths), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn corrupt_partition_is_a_server_error() {
    let (_dir, paths) = build_tiny_site();
    let shard = shard_id("rust");
    fs::write(paths.asset_path("fullText", &format!("{shard}.json")), "{oops").unwrap();

    let (status, _) = call(app(&paths), "/search?q=rust").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

async fn allowed_origin(app: Router, origin: &str) -> Option<String> {
    let req = Request::get("/health").header("origin", origin).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    resp.headers()
        .get("access-control-allow-origin")
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn any_origin_may_read_by_default() {
    let (_dir, paths) = build_tiny_site();
    assert_eq!(allowed_origin(app(&paths), "https://docs.example").await.as_deref(), Some("*"));
}

#[tokio::test]
async fn configured_origins_restrict_cross_origin_reads() {
    let (_dir, paths) = build_tiny_site();
    let config = ServeConfig {
        assets_root: paths.assets_root.clone(),
        allow_origins: Some("https://docs.example, https://mirror.example".into()),
    };
    let app = sitedex_server::build_app(&config).unwrap();

    assert_eq!(
        allowed_origin(app.clone(), "https://mirror.example").await.as_deref(),
        Some("https://mirror.example")
    );
    assert_eq!(allowed_origin(app, "https://evil.example").await, None);
}
