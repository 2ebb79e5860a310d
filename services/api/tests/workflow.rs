//! End-to-end flow against live PostgreSQL and Redis
//!
//! Run with `DATABASE_URL` and `REDIS_URL` pointing at disposable instances:
//! `cargo test -p api --test workflow -- --ignored`

use api::{AppState, config::ServerConfig, routes::create_router};
use auth::{
    AuthState,
    jwt::{JwtConfig, JwtKeys, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, init_pool, run_migrations},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "workflow-test-secret";
const BOUNDARY: &str = "asset-boundary";
const MAX_UPLOAD: usize = 1024 * 1024;

async fn live_router() -> Router {
    let pool = init_pool(&DatabaseConfig::from_env().unwrap())
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();

    let redis_pool = RedisPool::new(&RedisConfig::from_env().unwrap())
        .await
        .unwrap();

    let auth = AuthState {
        user_repository: UserRepository::new(pool.clone()),
        jwt_service: jwt_service(),
        redis_pool,
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
    };

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        upload_dir: std::env::temp_dir()
            .join(format!("asset-workflow-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned(),
        max_upload_bytes: MAX_UPLOAD,
        cors_origin: "http://localhost:3000".to_string(),
    };

    create_router(AppState::new(pool, auth, config))
}

fn jwt_service() -> JwtService {
    JwtService::new(JwtConfig {
        keys: JwtKeys::Secret(SECRET.to_string()),
        access_token_expiry: 600,
    })
    .unwrap()
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn multipart_body(asset_menu_id: &str, file_name: &str, mime: &str, content: &str) -> String {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"assetMenuId\"\r\n\r\n{id}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
         Content-Type: {mime}\r\n\r\n{content}\r\n--{b}--\r\n",
        b = BOUNDARY,
        id = asset_menu_id,
        name = file_name,
        mime = mime,
        content = content,
    )
}

async fn upload(router: &Router, token: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/assets/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
#[ignore = "requires PostgreSQL and Redis"]
async fn test_full_workflow() {
    let router = live_router().await;
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let username = format!("maker_{}", suffix);
    let email = format!("maker_{}@studio.io", suffix);

    // Signup, then a duplicate username is rejected.
    let signup = json!({ "username": username, "email": email, "password": "pixel-perfect-1" });
    let (status, body) = send(&router, Method::POST, "/api/auth/signup", None, Some(signup)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let duplicate = json!({
        "username": username,
        "email": format!("other_{}@studio.io", suffix),
        "password": "pixel-perfect-1"
    });
    let (status, body) =
        send(&router, Method::POST, "/api/auth/signup", None, Some(duplicate)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already exists");

    // Login returns a token for this user.
    let login = json!({ "email": email, "password": "pixel-perfect-1" });
    let (status, body) = send(&router, Method::POST, "/api/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let bearer = body["token"].as_str().unwrap().to_string();
    let claims = jwt_service().validate_token(&bearer).unwrap();
    assert_eq!(claims.sub.to_string(), body["user"]["id"].as_str().unwrap());
    let token = Some(bearer.as_str());

    // Game
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/games",
        token,
        Some(json!({ "gameName": "Space Miner", "gameDescription": "Asteroids" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let game_id = body["game"]["id"].as_str().unwrap().to_string();

    // Asset menus
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/assetMenus",
        token,
        Some(json!({ "title": "Sprites" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "gameId is required");

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/assetMenus",
        token,
        Some(json!({ "gameId": game_id, "title": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["assetMenu"]["title"], "Untitled");
    let first_menu = body["assetMenu"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(
        &router,
        Method::POST,
        "/api/assetMenus",
        token,
        Some(json!({ "gameId": game_id, "title": "Tiles" })),
    )
    .await;
    let second_menu = body["assetMenu"]["id"].as_str().unwrap().to_string();

    let position_uri = format!("/api/assetMenus/{}/position", first_menu);
    let (status, _) = send(
        &router,
        Method::PUT,
        &position_uri,
        token,
        Some(json!({ "left": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        Method::PUT,
        &position_uri,
        token,
        Some(json!({ "top": -5, "left": 10.6 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["assetMenu"]["position"], json!({ "top": 0.0, "left": 11.0 }));

    // Bulk ordering puts the second menu first.
    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/assetMenus/order",
        token,
        Some(json!({ "orderedData": [
            { "id": second_menu, "order": 0 },
            { "id": first_menu, "order": 1 }
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = send(
        &router,
        Method::GET,
        &format!("/api/assetMenus?gameId={}", game_id),
        token,
        None,
    )
    .await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![second_menu.as_str(), first_menu.as_str()]);

    // Grid with snapping
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/grids",
        token,
        Some(json!({ "gameId": game_id, "rows": 4, "columns": 4, "cellSize": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let grid_id = body["grid"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        Method::PUT,
        &position_uri,
        token,
        Some(json!({ "top": 74, "left": 130, "gridId": grid_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["assetMenu"]["position"], json!({ "top": 50.0, "left": 150.0 }));
    assert_eq!(body["cell"], json!({ "row": 1, "column": 3 }));

    // Upload
    let (status, _) = upload(
        &router,
        &bearer,
        multipart_body(&first_menu, "tool.exe", "application/x-msdownload", "MZ"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let no_menu = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nabc\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let (status, body) = upload(&router, &bearer, no_menu).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "AssetMenu ID is required");

    let no_file = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"assetMenuId\"\r\n\r\n{id}\r\n--{b}--\r\n",
        b = BOUNDARY,
        id = first_menu
    );
    let (status, body) = upload(&router, &bearer, no_file).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");

    let (status, body) = upload(
        &router,
        &bearer,
        multipart_body(&first_menu, "big.txt", "text/plain", &"a".repeat(MAX_UPLOAD + 1)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File size exceeds the limit of 1MB");

    let (status, body) = upload(
        &router,
        &bearer,
        multipart_body(
            &first_menu,
            "huge.txt",
            "text/plain",
            &"a".repeat(MAX_UPLOAD + 128 * 1024),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);

    let (status, _) = upload(
        &router,
        &bearer,
        multipart_body(
            &Uuid::new_v4().to_string(),
            "notes.txt",
            "text/plain",
            "level one",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = upload(
        &router,
        &bearer,
        multipart_body(&first_menu, "notes.txt", "text/plain", "level one"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let asset_id = body["asset"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["asset"]["type"], "text/plain");

    // Place the asset on the grid; a second placement conflicts.
    let link_uri = format!("/api/grids/{}/assets", grid_id);
    let link = json!({ "assetId": asset_id });
    let (status, body) = send(&router, Method::POST, &link_uri, token, Some(link.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["grid"]["assets"], json!([asset_id]));
    let (status, _) = send(&router, Method::POST, &link_uri, token, Some(link)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Whole game view
    let (status, body) = send(
        &router,
        Method::GET,
        &format!("/api/games/{}", game_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assetMenus"].as_array().unwrap().len(), 2);
    assert_eq!(body["grids"].as_array().unwrap().len(), 1);

    // Deleting the game removes everything below it.
    let (status, _) = send(
        &router,
        Method::DELETE,
        &format!("/api/games/{}", game_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &router,
        Method::GET,
        &format!("/api/assets?assetMenuId={}", first_menu),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Logout revokes the token.
    let (status, _) = send(&router, Method::POST, "/api/auth/logout", token, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&router, Method::GET, "/api/games", token, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has been revoked");
}
