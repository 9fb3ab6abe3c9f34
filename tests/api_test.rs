//! REST API integration tests
//!
//! Exercises the HTTP surface over the in-memory store: the same
//! store instance is shared with the test, so writes made through the
//! delivery core are immediately visible to the REST reads.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use uuid::Uuid;

use culturebook::backend::auth::tokens::create_token;
use culturebook::backend::messaging::{MemoryMessagingStore, MessagingStore};
use culturebook::backend::server::create_app_with_store;

fn create_test_server() -> (TestServer, Arc<MemoryMessagingStore>) {
    let store = Arc::new(MemoryMessagingStore::new());
    let app = create_app_with_store(store.clone());
    (TestServer::new(app).unwrap(), store)
}

fn bearer(user_id: Uuid) -> String {
    let token = create_token(user_id, format!("{}@example.com", user_id)).unwrap();
    format!("Bearer {}", token)
}

#[tokio::test]
async fn test_conversations_require_auth() {
    let (server, _store) = create_test_server();

    let response = server.get("/api/conversations").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_conversations_empty_for_new_user() {
    let (server, _store) = create_test_server();
    let user = Uuid::new_v4();

    let response = server
        .get("/api/conversations")
        .add_header("authorization", bearer(user))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["conversations"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_fetch_or_create_conversation_is_idempotent() {
    let (server, _store) = create_test_server();
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();

    let first = server
        .post("/api/conversations")
        .add_header("authorization", bearer(user))
        .json(&serde_json::json!({ "participant_id": other }))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let first_body: serde_json::Value = first.json();
    assert_eq!(first_body["success"], true);
    let first_id = first_body["conversation"]["id"].as_str().unwrap().to_string();

    // The other side asks for the same pair and gets the same conversation
    let second = server
        .post("/api/conversations")
        .add_header("authorization", bearer(other))
        .json(&serde_json::json!({ "participant_id": user }))
        .await;
    let second_body: serde_json::Value = second.json();
    assert_eq!(second_body["conversation"]["id"].as_str().unwrap(), first_id);
}

#[tokio::test]
async fn test_conversation_with_self_is_refused() {
    let (server, _store) = create_test_server();
    let user = Uuid::new_v4();

    let response = server
        .post("/api/conversations")
        .add_header("authorization", bearer(user))
        .json(&serde_json::json!({ "participant_id": user }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("yourself"));
}

#[tokio::test]
async fn test_messages_reflect_core_writes() {
    let (server, store) = create_test_server();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    // Writes happen through the store the core uses
    let conversation = store.create_conversation(&[alice, bob]).await.unwrap();
    store
        .append_message(conversation.id, alice, "Bonjour")
        .await
        .unwrap();
    store
        .append_message(conversation.id, bob, "Ça va?")
        .await
        .unwrap();

    let response = server
        .get(&format!("/api/conversations/{}/messages", conversation.id))
        .add_header("authorization", bearer(alice))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "Bonjour");
    assert_eq!(messages[1]["content"], "Ça va?");
}

#[tokio::test]
async fn test_messages_forbidden_for_non_participant() {
    let (server, store) = create_test_server();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let conversation = store.create_conversation(&[alice, bob]).await.unwrap();

    let response = server
        .get(&format!("/api/conversations/{}/messages", conversation.id))
        .add_header("authorization", bearer(Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_messages_unknown_conversation_is_404() {
    let (server, _store) = create_test_server();

    let response = server
        .get(&format!("/api/conversations/{}/messages", Uuid::new_v4()))
        .add_header("authorization", bearer(Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_read_receipt_round_trip() {
    let (server, store) = create_test_server();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let conversation = store.create_conversation(&[alice, bob]).await.unwrap();
    let message = store
        .append_message(conversation.id, alice, "Bonjour")
        .await
        .unwrap();

    let marked = server
        .post(&format!("/api/messages/{}/read", message.id))
        .add_header("authorization", bearer(bob))
        .await;
    assert_eq!(marked.status_code(), StatusCode::OK);

    let response = server
        .get(&format!("/api/conversations/{}/messages", conversation.id))
        .add_header("authorization", bearer(bob))
        .await;
    let body: serde_json::Value = response.json();
    let read_by = body["messages"][0]["read_by"].as_array().unwrap();
    assert_eq!(read_by.len(), 1);
    assert_eq!(read_by[0]["user_id"], bob.to_string());
}

#[tokio::test]
async fn test_notification_create_and_list() {
    let (server, _store) = create_test_server();
    let (sender, recipient) = (Uuid::new_v4(), Uuid::new_v4());
    let post_id = Uuid::new_v4();

    let created = server
        .post("/api/notifications")
        .add_header("authorization", bearer(sender))
        .json(&serde_json::json!({
            "recipient_id": recipient,
            "kind": "like",
            "post_id": post_id,
        }))
        .await;
    assert_eq!(created.status_code(), StatusCode::OK);
    let created_body: serde_json::Value = created.json();
    assert_eq!(created_body["read"], false);
    let notification_id = created_body["id"].as_str().unwrap().to_string();

    // Listed for the recipient, not the sender
    let theirs = server
        .get("/api/notifications")
        .add_header("authorization", bearer(recipient))
        .await;
    let theirs_body: serde_json::Value = theirs.json();
    assert_eq!(theirs_body["notifications"].as_array().unwrap().len(), 1);
    assert_eq!(theirs_body["notifications"][0]["kind"], "like");

    let others = server
        .get("/api/notifications")
        .add_header("authorization", bearer(sender))
        .await;
    let others_body: serde_json::Value = others.json();
    assert_eq!(others_body["notifications"].as_array().unwrap().len(), 0);

    // Mark read
    let marked = server
        .post(&format!("/api/notifications/{}/read", notification_id))
        .add_header("authorization", bearer(recipient))
        .await;
    assert_eq!(marked.status_code(), StatusCode::OK);

    let reloaded = server
        .get("/api/notifications")
        .add_header("authorization", bearer(recipient))
        .await;
    let reloaded_body: serde_json::Value = reloaded.json();
    assert_eq!(reloaded_body["notifications"][0]["read"], true);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (server, _store) = create_test_server();

    let response = server.get("/api/unknown").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
