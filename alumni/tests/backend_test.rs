mod common;

use alumni::api::backend::{ApiError, BackendApi, GENERIC_ERROR_MESSAGE, error_message};
use alumni::models::*;
use chatstore::DeliveryStatus;
use common::{Outcome, PRIMARY, SECONDARY, client, secondary_only};
use serde_json::json;

#[tokio::test]
async fn test_login_reads_token_and_user() {
    let (client, calls) = client(|url, request| {
        assert!(url.ends_with("/api/auth/login"));
        assert_eq!(request.body.as_ref().unwrap()["email"], "asha@example.com");
        Outcome::Respond(
            200,
            json!({
                "data": {
                    "token": "jwt-123",
                    "user": { "_id": 17, "firstName": "Asha", "lastName": "Menon", "email": "asha@example.com" }
                }
            }),
        )
    });

    let login = client
        .login(&LoginRequest {
            email: "asha@example.com".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(login.token, "jwt-123");
    let user = login.user.unwrap();
    assert_eq!(user.id, "17");
    assert_eq!(user.name, "Asha Menon");
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_login_without_token_is_decode_error() {
    let (client, _) = client(|_, _| Outcome::Respond(200, json!({ "message": "ok" })));

    let err = client
        .login(&LoginRequest {
            email: "a@b.co".to_string(),
            password: "x".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_bearer_token_is_sent_when_set() {
    let (client, calls) = client(|_, _| Outcome::Respond(200, json!({ "alumni": { "id": "5" } })));
    let client = client.with_token(Some("tok".to_string()));

    client.get_alumni("5").await.unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].url, format!("{PRIMARY}/api/alumni/5"));
    assert!(calls[0]
        .headers
        .contains(&("authorization".to_string(), "Bearer tok".to_string())));
}

#[tokio::test]
async fn test_non_success_status_carries_backend_message() {
    let (client, _) = client(|_, _| {
        Outcome::Respond(401, json!({ "error": { "message": "Invalid credentials" } }))
    });

    let err = client
        .login(&LoginRequest {
            email: "a@b.co".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_non_success_without_message_uses_generic_text() {
    let (client, _) = client(|_, _| Outcome::Respond(500, json!(null)));

    let err = client.states().await.unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, GENERIC_ERROR_MESSAGE);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_unavailable() {
    let (client, _) = client(|_, _| Outcome::Refuse);
    let err = client.states().await.unwrap_err();
    assert!(matches!(err, ApiError::Unavailable(_)));
}

#[tokio::test]
async fn test_update_alumni_sends_only_changed_fields() {
    let (client, calls) = client(secondary_only(
        200,
        json!({ "alumni": { "id": "5", "fullName": "Asha Menon", "currentCompany": "Acme" } }),
    ));

    let profile = client
        .update_alumni("5", &ProfileChangeset::new().with_company("Acme".to_string()))
        .await
        .unwrap();

    assert_eq!(profile.company.as_deref(), Some("Acme"));
    let calls = calls.lock().unwrap();
    assert_eq!(calls[1].url, format!("{SECONDARY}/api/alumni/5"));
    assert_eq!(calls[1].method, "PUT");
    assert_eq!(calls[1].body, Some(json!({ "company": "Acme" })));
}

#[tokio::test]
async fn test_states_and_schools_accept_wrapped_lists() {
    let (client, calls) = client(|url, _| {
        if url.ends_with("/api/states") {
            Outcome::Respond(200, json!([{ "_id": 1, "stateName": "Kerala" }]))
        } else {
            Outcome::Respond(
                200,
                json!({ "data": { "schools": [{ "schoolId": "s-1", "schoolName": "Govt. HSS", "district": "Kochi" }] } }),
            )
        }
    });

    let states = client.states().await.unwrap();
    assert_eq!(
        states,
        vec![State {
            id: "1".to_string(),
            name: "Kerala".to_string()
        }]
    );

    let schools = client.schools("1").await.unwrap();
    assert_eq!(schools[0].name, "Govt. HSS");
    assert_eq!(schools[0].city.as_deref(), Some("Kochi"));
    assert!(urls_contain(&calls, "/api/states/1/schools"));
}

fn urls_contain(
    calls: &std::sync::Arc<std::sync::Mutex<Vec<common::RecordedCall>>>,
    suffix: &str,
) -> bool {
    calls.lock().unwrap().iter().any(|c| c.url.ends_with(suffix))
}

#[tokio::test]
async fn test_chat_history_is_sorted_by_time() {
    let (client, calls) = client(|_, _| {
        Outcome::Respond(
            200,
            json!({ "messages": [
                { "_id": "b", "message": "second", "from": "u-2", "createdAt": "2024-03-01T10:05:00Z", "status": "read" },
                { "_id": "a", "text": "first", "senderId": "me", "createdAt": "2024-03-01T10:00:00Z" }
            ]}),
        )
    });

    let messages = client.chat_history("u-2").await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "first");
    assert_eq!(messages[1].content, "second");
    assert_eq!(messages[1].status, DeliveryStatus::Read);
    assert!(urls_contain(&calls, "/api/chat/history?userId=u-2"));
}

#[tokio::test]
async fn test_send_chat_returns_echoed_message() {
    let (client, calls) = client(|_, _| {
        Outcome::Respond(
            201,
            json!({ "message": { "id": "m-9", "content": "hi", "senderId": "me", "timestamp": 1709287200000_i64 } }),
        )
    });

    let sent = client.send_chat("u-2", "hi").await.unwrap().unwrap();
    assert_eq!(sent.id, "m-9");
    assert_eq!(
        calls.lock().unwrap()[0].body,
        Some(json!({ "receiverId": "u-2", "content": "hi" }))
    );

    let (client, _) = client_with_plain_ack();
    assert!(client.send_chat("u-2", "hi").await.unwrap().is_none());
}

#[tokio::test]
async fn test_send_chat_reads_message_under_data_next_to_status_text() {
    let (client, _) = client(|_, _| {
        Outcome::Respond(
            201,
            json!({
                "success": true,
                "message": "Message sent",
                "data": { "id": "m-9", "content": "hi", "senderId": "me" }
            }),
        )
    });

    let sent = client.send_chat("u-2", "hi").await.unwrap().unwrap();

    assert_eq!(sent.id, "m-9");
    assert_eq!(sent.content, "hi");
    assert_eq!(sent.sender_id, "me");
}

fn client_with_plain_ack() -> (
    alumni::api::backend::BackendClient<common::FakeTransport>,
    std::sync::Arc<std::sync::Mutex<Vec<common::RecordedCall>>>,
) {
    client(|_, _| Outcome::Respond(200, json!({ "message": "Message sent" })))
}

#[tokio::test]
async fn test_save_record_posts_new_and_puts_existing() {
    let (client, calls) = client(|url, request| {
        let mut saved = request.body.clone().unwrap();
        saved["_id"] = json!(31);
        if url.ends_with("/api/educations") {
            Outcome::Respond(201, json!({ "education": saved }))
        } else {
            Outcome::Respond(200, saved)
        }
    });

    let new_entry = Education {
        institution: "NIT Calicut".to_string(),
        degree: "B.Tech".to_string(),
        start_year: Some(2011),
        end_year: Some(2015),
        ..Education::default()
    };
    let created = client.save_education(&new_entry).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("31"));
    assert_eq!(created.institution, "NIT Calicut");

    let existing = Experience {
        id: Some("e-4".to_string()),
        company: "Acme".to_string(),
        title: "Engineer".to_string(),
        current: true,
        ..Experience::default()
    };
    client.save_experience(&existing).await.unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].method, "POST");
    assert!(calls[0].url.ends_with("/api/educations"));
    assert_eq!(calls[1].method, "PUT");
    assert!(calls[1].url.ends_with("/api/experiences/e-4"));
}

#[tokio::test]
async fn test_list_and_delete_records() {
    let (client, calls) = client(|url, _| {
        if url.ends_with("/api/experiences") {
            Outcome::Respond(
                200,
                json!({ "experiences": [{ "_id": "x1", "company": "Acme", "title": "Lead", "current": true }] }),
            )
        } else {
            Outcome::Respond(204, json!(null))
        }
    });

    let experiences = client.list_experiences().await.unwrap();
    assert_eq!(experiences.len(), 1);
    assert_eq!(experiences[0].id.as_deref(), Some("x1"));
    assert!(experiences[0].current);

    client.delete_experience("x1").await.unwrap();
    let calls = calls.lock().unwrap();
    assert_eq!(calls[1].method, "DELETE");
    assert!(calls[1].url.ends_with("/api/experiences/x1"));
}

#[test]
fn test_error_message_priority() {
    assert_eq!(
        error_message(&json!({ "message": "m", "error": "e" })).as_deref(),
        Some("m")
    );
    assert_eq!(error_message(&json!({ "error": "e", "msg": "x" })).as_deref(), Some("e"));
    assert_eq!(error_message(&json!({ "msg": "x" })).as_deref(), Some("x"));
    assert_eq!(error_message(&json!("Bad Gateway")).as_deref(), Some("Bad Gateway"));
    assert_eq!(error_message(&json!({})), None);
}
