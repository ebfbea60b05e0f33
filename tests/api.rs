use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use inkwell::{
    AppState,
    config::Config,
    database::Repositories,
    infrastructure::testing::{FakeMediaHost, RecordingMailer},
    routes::create_router,
    services::users::promote_admins,
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
    mailer: Arc<RecordingMailer>,
    media: Arc<FakeMediaHost>,
}

fn app() -> TestApp {
    let mailer = Arc::new(RecordingMailer::new());
    let media = Arc::new(FakeMediaHost::new());
    let state = AppState::new(
        Config::for_tests(),
        Repositories::in_memory(),
        mailer.clone(),
        media.clone(),
    );
    TestApp {
        router: create_router(state.clone()),
        state,
        mailer,
        media,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// 注册、通过邮件中的令牌验证、登录，返回 (用户ID, 会话令牌)
    async fn member(&self, username: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"username": username, "email": email, "password": "secret1!"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let user_id = body["user"]["id"].as_str().unwrap().to_string();

        let token = self.mailer.last_token().unwrap();
        let (status, _) = self
            .json(
                Method::GET,
                &format!("/api/auth/{user_id}/verify/{token}"),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .json(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": "secret1!"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (user_id, body["user"]["token"].as_str().unwrap().to_string())
    }

    async fn admin(&self) -> (String, String) {
        let (id, token) = self.member("admin", "admin@blog.io").await;
        promote_admins(&self.state, &["admin@blog.io".to_string()])
            .await
            .unwrap();
        (id, token)
    }
}

const BOUNDARY: &str = "inkwell-boundary";

fn multipart(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"cover\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn multipart_request(method: Method, uri: &str, token: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

const POST_FIELDS: &[(&str, &str)] = &[
    ("title", "Rust ownership"),
    ("description", "Borrowing without tears, explained"),
    ("category", "Tech"),
];

#[tokio::test]
async fn registration_requires_verification_before_login() {
    let app = app();
    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "writer", "email": "writer@blog.io", "password": "secret1!"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "writer@blog.io", "password": "secret1!"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "again", "email": " Writer@Blog.io ", "password": "secret1!"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validation_errors_are_reported_per_field() {
    let app = app();
    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "w", "email": "nope", "password": "simplepass"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["username"].is_string());
    assert!(body["errors"]["email"].is_string());
    assert!(body["errors"]["password"].is_string());
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app();
    let (status, body) = app.json(Method::GET, "/api/comments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, body) = app
        .json(Method::GET, "/api/comments", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn invalid_ids_are_field_errors() {
    let app = app();
    let (status, body) = app
        .json(Method::GET, "/api/posts/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["id"], "Invalid ID");
}

#[tokio::test]
async fn categories_are_admin_managed_and_unique() {
    let app = app();
    let (_, member) = app.member("reader", "reader@blog.io").await;
    let (_, admin) = app.admin().await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/categories",
            Some(&member),
            Some(json!({"title": "Tech"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/categories",
            Some(&admin),
            Some(json!({"title": "Tech"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["category"]["title"], "Tech");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/categories",
            Some(&admin),
            Some(json!({"title": "Tech"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.json(Method::GET, "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn post_lifecycle_over_http() {
    let app = app();
    let (_, author) = app.member("author", "author@blog.io").await;
    let (_, reader) = app.member("reader", "reader@blog.io").await;

    // 缺少图片
    let (status, body) = app
        .send(multipart_request(
            Method::POST,
            "/api/posts",
            &author,
            multipart(POST_FIELDS, None),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");

    let (status, _) = app
        .send(multipart_request(
            Method::POST,
            "/api/posts",
            &author,
            multipart(POST_FIELDS, Some(("text/plain", b"hello".as_slice()))),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(multipart_request(
            Method::POST,
            "/api/posts",
            &author,
            multipart(POST_FIELDS, Some(("image/png", [137u8, 80, 78, 71].as_slice()))),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let post_id = body["post"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["post"]["image"]["publicId"], "image-1");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/comments",
            Some(&reader),
            Some(json!({"post": post_id, "text": "Great read"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = app
        .json(Method::PUT, &format!("/api/posts/like/{post_id}"), Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["likes"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .json(Method::GET, "/api/posts?category=tech", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["page"], 1);

    let (status, body) = app
        .json(Method::GET, &format!("/api/posts/{post_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["comments"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .json(Method::DELETE, &format!("/api/posts/{post_id}"), Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(Method::DELETE, &format!("/api/posts/{post_id}"), Some(&author), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.media.deleted(), vec!["image-1".to_string()]);

    let (_, body) = app.json(Method::GET, "/api/posts/count", None, None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn blocked_users_lose_access() {
    let app = app();
    let (member_id, member) = app.member("reader", "reader@blog.io").await;
    let (_, admin) = app.admin().await;

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/api/users/block/{member_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isBlocked"], true);

    // 已签发的令牌立即失去写权限
    let (status, body) = app.json(Method::GET, "/api/comments", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User is blocked");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "reader@blog.io", "password": "secret1!"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_reset_flow() {
    let app = app();
    let (user_id, _) = app.member("reader", "reader@blog.io").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/password/link",
            None,
            Some(json!({"email": "reader@blog.io"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = app.mailer.last_token().unwrap();

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/api/password/check/{user_id}/{token}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .json(
            Method::POST,
            &format!("/api/password/reset/{user_id}/{token}"),
            None,
            Some(json!({"password": "fresh9!pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // 令牌只能使用一次
    let (status, _) = app
        .json(
            Method::POST,
            &format!("/api/password/reset/{user_id}/{token}"),
            None,
            Some(json!({"password": "other9!pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "reader@blog.io", "password": "fresh9!pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
