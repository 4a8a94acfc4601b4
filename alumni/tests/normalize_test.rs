use alumni::models::{Education, Experience};
use alumni::normalize::*;
use chatstore::{ContentType, DeliveryStatus};
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn test_alumni_field_priority() {
    let profile = normalize_alumni(&json!({
        "_id": "x",
        "id": "a-1",
        "name": "Short",
        "fullName": "Asha Menon",
        "mobile": "9876543210",
        "graduationYear": 2014,
        "school": { "name": "Govt. HSS Kochi" },
        "organization": "Acme",
        "jobTitle": "Engineer",
        "address": { "city": "Kochi" },
        "about": "Hello",
        "avatar": "/a.png",
        "linkedinUrl": "https://linkedin.com/in/asha"
    }));

    assert_eq!(profile.id, "a-1");
    assert_eq!(profile.name, "Asha Menon");
    assert_eq!(profile.phone.as_deref(), Some("9876543210"));
    assert_eq!(profile.batch, Some(2014));
    assert_eq!(profile.school.as_deref(), Some("Govt. HSS Kochi"));
    assert_eq!(profile.company.as_deref(), Some("Acme"));
    assert_eq!(profile.designation.as_deref(), Some("Engineer"));
    assert_eq!(profile.city.as_deref(), Some("Kochi"));
    assert_eq!(profile.bio.as_deref(), Some("Hello"));
    assert_eq!(profile.avatar_url.as_deref(), Some("/a.png"));
    assert_eq!(profile.linkedin.as_deref(), Some("https://linkedin.com/in/asha"));
}

#[test]
fn test_alumni_blank_values_fall_through() {
    let profile = normalize_alumni(&json!({
        "id": 42,
        "fullName": "  ",
        "firstName": "Ravi",
        "lastName": "Kumar",
        "email": "",
        "emailId": "ravi@example.com",
        "batch": "not a year"
    }));

    assert_eq!(profile.id, "42");
    assert_eq!(profile.name, "Ravi Kumar");
    assert_eq!(profile.email, "ravi@example.com");
    assert_eq!(profile.batch, None);
}

#[test]
fn test_alumni_first_name_only() {
    let profile = normalize_alumni(&json!({ "user": { "firstName": "Ravi" } }));
    assert_eq!(profile.name, "Ravi");
    assert_eq!(profile.id, "");
}

#[test]
fn test_alumni_envelopes() {
    let expected = "Asha";
    for payload in [
        json!({ "name": expected }),
        json!({ "alumni": { "name": expected } }),
        json!({ "user": { "name": expected } }),
        json!({ "data": { "name": expected } }),
        json!({ "data": { "alumni": { "name": expected } } }),
        json!({ "data": { "user": { "name": expected } } }),
    ] {
        assert_eq!(normalize_alumni(&payload).name, expected, "payload {payload}");
    }
}

#[test]
fn test_alumni_keeps_own_fields_over_embedded_user() {
    let user = json!({ "id": "u-1", "email": "p@x.com", "fullName": "Priya" });

    let enveloped = normalize_alumni(&json!({
        "alumni": { "id": "a-1", "company": "Acme", "batch": 2015, "user": user }
    }));
    assert_eq!(enveloped.id, "a-1");
    assert_eq!(enveloped.company.as_deref(), Some("Acme"));
    assert_eq!(enveloped.batch, Some(2015));

    let bare = normalize_alumni(&json!({ "_id": "a-2", "city": "Pune", "user": user }));
    assert_eq!(bare.id, "a-2");
    assert_eq!(bare.city.as_deref(), Some("Pune"));
}

#[test]
fn test_unwrap_envelope_skips_scalar_under_key() {
    let reply = json!({ "message": "Message sent", "data": { "id": "m-1" } });
    assert_eq!(unwrap_envelope(&reply, "message"), &json!({ "id": "m-1" }));

    let nested = json!({ "data": { "message": "ok", "id": "m-2" } });
    assert_eq!(unwrap_envelope(&nested, "message")["id"], "m-2");

    let bare = json!({ "message": "Message sent" });
    assert_eq!(unwrap_envelope(&bare, "message"), &bare);
}

#[test]
fn test_unwrap_list_variants() {
    let bare = json!([1, 2]);
    let keyed = json!({ "states": [1, 2] });
    let nested = json!({ "data": { "states": [1, 2] } });
    let data_list = json!({ "data": [1, 2] });
    let wrong = json!({ "states": "none" });

    for value in [&bare, &keyed, &nested, &data_list] {
        assert_eq!(unwrap_list(value, "states").len(), 2);
    }
    assert!(unwrap_list(&wrong, "states").is_empty());
    assert!(unwrap_list(&json!(null), "states").is_empty());
}

#[test]
fn test_chat_message_variants() {
    let message = normalize_chat_message(&json!({
        "_id": "m-1",
        "text": "hi",
        "sender": { "id": "u-2", "name": "Rahul" },
        "sentAt": 1_700_000_000_000_i64,
        "status": "SEEN",
        "type": "image"
    }));

    assert_eq!(message.id, "m-1");
    assert_eq!(message.content, "hi");
    assert_eq!(message.sender_id, "u-2");
    assert_eq!(message.sender_name.as_deref(), Some("Rahul"));
    assert_eq!(
        message.timestamp,
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    );
    assert_eq!(message.status, DeliveryStatus::Read);
    assert_eq!(message.content_type, ContentType::Image);
}

#[test]
fn test_chat_message_defaults() {
    let message = normalize_chat_message(&json!({ "content": "x", "status": "pending" }));
    assert_eq!(message.status, DeliveryStatus::Sent);
    assert_eq!(message.content_type, ContentType::Text);
    assert_eq!(message.sender_name, None);
}

#[test]
fn test_chat_history_sorted() {
    let messages = normalize_chat_history(&json!({ "data": [
        { "id": "3", "content": "c", "createdAt": "2024-01-01T10:02:00+05:30" },
        { "id": "1", "content": "a", "createdAt": "2024-01-01T04:00:00Z" },
        { "id": "2", "content": "b", "createdAt": "2024-01-01T04:01:00Z" }
    ]}));

    let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn test_state_and_school() {
    let state = normalize_state(&json!({ "stateId": 7, "stateName": "Goa" }));
    assert_eq!(state.id, "7");
    assert_eq!(state.name, "Goa");

    let school = normalize_school(&json!({ "_id": "s", "name": "St. Mary's" }));
    assert_eq!(school.id, "s");
    assert_eq!(school.city, None);
}

#[test]
fn test_record_id_folding() {
    let education: Education = normalize_record(
        &json!({ "data": { "education": { "_id": 12, "institution": "IIT", "startYear": 2010 } } }),
        "education",
    )
    .unwrap();
    assert_eq!(education.id.as_deref(), Some("12"));
    assert_eq!(education.start_year, Some(2010));
    assert_eq!(education.degree, "");

    let experience: Experience = normalize_record(
        &json!({ "id": null, "company": "Acme", "title": "Lead" }),
        "experience",
    )
    .unwrap();
    assert_eq!(experience.id, None);
}

#[test]
fn test_record_missing_required_field_fails() {
    let result: Result<Experience, _> = normalize_record(&json!({ "company": "Acme" }), "experience");
    assert!(result.is_err());
}
