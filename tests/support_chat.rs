mod common;

use axum::http::StatusCode;
use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use serde_json::{Value, json};
use storefront_api::{
    dto::support::PostMessageRequest,
    error::AppError,
    routes::{
        create_app,
        params::{ChatListQuery, Pagination},
    },
    services::support_service,
};

async fn login(server: &TestServer, email: &str) -> String {
    let body: Value = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": common::TEST_PASSWORD }))
        .await
        .json();
    body["data"]["token"].as_str().unwrap().to_string()
}

fn message(body: &str) -> PostMessageRequest {
    PostMessageRequest {
        body: body.to_string(),
    }
}

#[tokio::test]
async fn chat_lifecycle() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "help@example.com", false).await?;
    let admin = common::create_user(&state, "agent@example.com", true).await?;
    let other = common::create_user(&state, "nosy@example.com", false).await?;

    let chat = support_service::open_chat(&state.pool, &user)
        .await?
        .data
        .expect("chat");
    assert_eq!(chat.status, "open");

    // opening again returns the same open chat
    let same = support_service::open_chat(&state.pool, &user)
        .await?
        .data
        .expect("chat");
    assert_eq!(same.id, chat.id);

    let blank = support_service::post_message(&state.pool, &user, chat.id, message("   ")).await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));

    support_service::post_message(&state.pool, &user, chat.id, message("My order is late"))
        .await?;
    support_service::admin_reply(&state.pool, &admin, chat.id, message("Looking into it"))
        .await?;

    let not_admin =
        support_service::admin_reply(&state.pool, &user, chat.id, message("I am support")).await;
    assert!(matches!(not_admin, Err(AppError::Forbidden)));

    let thread = support_service::list_messages(&state.pool, &user, chat.id)
        .await?
        .data
        .expect("messages");
    let senders: Vec<_> = thread.items.iter().map(|m| m.sender.as_str()).collect();
    assert_eq!(senders, vec!["user", "support"]);
    assert_eq!(thread.items[0].body, "My order is late");

    // admins may read any chat, other users may not
    support_service::list_messages(&state.pool, &admin, chat.id).await?;
    let hidden = support_service::list_messages(&state.pool, &other, chat.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    let inbox = support_service::admin_list_chats(
        &state.pool,
        &admin,
        ChatListQuery {
            status: Some("open".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(inbox.meta.and_then(|m| m.total), Some(1));

    let closed = support_service::close_chat(&state.pool, &user, chat.id)
        .await?
        .data
        .expect("chat");
    assert_eq!(closed.status, "closed");
    assert!(closed.closed_at.is_some());

    let late = support_service::post_message(&state.pool, &user, chat.id, message("hello?")).await;
    assert!(matches!(late, Err(AppError::BadRequest(_))));

    // a new chat is opened once the old one is closed
    let fresh = support_service::open_chat(&state.pool, &user)
        .await?
        .data
        .expect("chat");
    assert_ne!(fresh.id, chat.id);

    let mine = support_service::list_chats(&state.pool, &user, Pagination::default()).await?;
    assert_eq!(mine.meta.and_then(|m| m.total), Some(2));

    let still_open = support_service::admin_list_chats(
        &state.pool,
        &admin,
        ChatListQuery {
            status: Some("closed".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(still_open.data.expect("chats").items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn support_routes_over_http() {
    let state = common::test_state().await.unwrap();
    common::create_user(&state, "chatty@example.com", false).await.unwrap();
    let server = TestServer::new(create_app(state, 1024 * 1024)).unwrap();

    let token = login(&server, "chatty@example.com").await;

    let opened: Value = server
        .post("/api/support/chats")
        .authorization_bearer(&token)
        .await
        .json();
    let chat_id = opened["data"]["id"].as_str().unwrap().to_string();

    server
        .post(&format!("/api/support/chats/{chat_id}/messages"))
        .authorization_bearer(&token)
        .json(&json!({ "body": "hi there" }))
        .await
        .assert_status_ok();

    let thread: Value = server
        .get(&format!("/api/support/chats/{chat_id}/messages"))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(thread["data"]["items"][0]["body"], "hi there");
    assert_eq!(thread["data"]["chat"]["status"], "open");

    server
        .post(&format!("/api/support/chats/{chat_id}/close"))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    server
        .post(&format!("/api/support/chats/{chat_id}/messages"))
        .authorization_bearer(&token)
        .json(&json!({ "body": "anyone?" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn admin_uploads_images_only() {
    let state = common::test_state().await.unwrap();
    common::create_user(&state, "uploader@example.com", true).await.unwrap();
    common::create_user(&state, "visitor@example.com", false).await.unwrap();
    let upload_dir = state.upload_dir.clone();
    let server = TestServer::new(create_app(state, 1024)).unwrap();

    let admin_token = login(&server, "uploader@example.com").await;
    let visitor_token = login(&server, "visitor@example.com").await;

    let image = || {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(vec![0x89, b'P', b'N', b'G'])
                .file_name("logo.png")
                .mime_type("image/png"),
        )
    };

    let uploaded = server
        .post("/api/upload")
        .authorization_bearer(&admin_token)
        .multipart(image())
        .await;
    uploaded.assert_status_ok();
    let body: Value = uploaded.json();
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/") && url.ends_with(".png"));

    let name = url.trim_start_matches("/uploads/");
    assert!(upload_dir.join(name).exists());

    let served = server.get(&url).await;
    served.assert_status_ok();
    assert_eq!(served.as_bytes().as_ref(), &[0x89, b'P', b'N', b'G']);

    server
        .post("/api/upload")
        .authorization_bearer(&visitor_token)
        .multipart(image())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let text = MultipartForm::new().add_part(
        "file",
        Part::text("not an image").file_name("notes.txt").mime_type("text/plain"),
    );
    server
        .post("/api/upload")
        .authorization_bearer(&admin_token)
        .multipart(text)
        .await
        .assert_status_bad_request();

    let too_big = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 4096])
            .file_name("huge.png")
            .mime_type("image/png"),
    );
    let response = server
        .post("/api/upload")
        .authorization_bearer(&admin_token)
        .multipart(too_big)
        .await;
    assert!(response.status_code().is_client_error());

    let _ = std::fs::remove_dir_all(upload_dir);
}
