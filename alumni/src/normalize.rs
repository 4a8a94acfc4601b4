//! Maps the loosely shaped backend payloads onto canonical records.
//!
//! The backend is not consistent about envelopes or field names, so each
//! canonical field has a fixed list of source keys. The first key holding a
//! non-empty value wins.
//!
//! | canonical        | source keys, in priority order                          |
//! |------------------|---------------------------------------------------------|
//! | id               | `id`, `_id`, `alumniId`, `userId`                       |
//! | name             | `fullName`, `full_name`, `name`, then `firstName` + `lastName` |
//! | email            | `email`, `emailId`, `mail`                              |
//! | phone            | `phone`, `phoneNumber`, `mobile`, `contactNumber`       |
//! | batch            | `batch`, `passingYear`, `graduationYear`, `yearOfPassing` |
//! | school           | `schoolName`, `school.name`, `school`                   |
//! | company          | `currentCompany`, `company`, `organization`             |
//! | designation      | `designation`, `jobTitle`, `title`                      |
//! | city             | `city`, `location`, `address.city`                      |
//! | bio              | `bio`, `about`, `description`                           |
//! | avatarUrl        | `profileImage`, `avatarUrl`, `avatar`, `photo`          |
//! | linkedin         | `linkedin`, `linkedinUrl`, `linkedIn`                   |
//!
//! Chat messages use `id`/`_id`, `content`/`message`/`text`,
//! `senderId`/`sender_id`/`sender.id`/`from`, `senderName`/`sender.name`,
//! `createdAt`/`timestamp`/`sentAt` and `status`.

use chatstore::{ContentType, DeliveryStatus, Message};
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{AlumniProfile, School, State};

const ID_KEYS: &[&str] = &["id", "_id", "alumniId", "userId"];
const NAME_KEYS: &[&str] = &["fullName", "full_name", "name"];
const EMAIL_KEYS: &[&str] = &["email", "emailId", "mail"];
const PHONE_KEYS: &[&str] = &["phone", "phoneNumber", "mobile", "contactNumber"];
const BATCH_KEYS: &[&str] = &["batch", "passingYear", "graduationYear", "yearOfPassing"];
const SCHOOL_KEYS: &[&str] = &["schoolName", "school.name", "school"];
const COMPANY_KEYS: &[&str] = &["currentCompany", "company", "organization"];
const DESIGNATION_KEYS: &[&str] = &["designation", "jobTitle", "title"];
const CITY_KEYS: &[&str] = &["city", "location", "address.city"];
const BIO_KEYS: &[&str] = &["bio", "about", "description"];
const AVATAR_KEYS: &[&str] = &["profileImage", "avatarUrl", "avatar", "photo"];
const LINKEDIN_KEYS: &[&str] = &["linkedin", "linkedinUrl", "linkedIn"];

const MESSAGE_ID_KEYS: &[&str] = &["id", "_id"];
const CONTENT_KEYS: &[&str] = &["content", "message", "text"];
const SENDER_ID_KEYS: &[&str] = &["senderId", "sender_id", "sender.id", "from"];
const SENDER_NAME_KEYS: &[&str] = &["senderName", "sender.name"];
const TIMESTAMP_KEYS: &[&str] = &["createdAt", "timestamp", "sentAt"];

/// Resolves a dotted path such as `school.name`.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

/// Scalar as text; strings are trimmed and empty strings count as missing.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(value, key))
        .find_map(as_text)
}

fn first_year(value: &Value, keys: &[&str]) -> Option<u16> {
    first_text(value, keys).and_then(|text| text.parse().ok())
}

/// Objects and arrays can be payloads; scalars under the same key are status
/// text such as `"message": "Message sent"`.
fn is_payload(value: &&Value) -> bool {
    value.is_object() || value.is_array()
}

/// Strips the response envelope: `value[key]`, then `value.data[key]`, then
/// `value.data`, then `value` itself. Only objects and arrays are taken from
/// `key`.
pub fn unwrap_envelope<'a>(value: &'a Value, key: &str) -> &'a Value {
    if let Some(inner) = value.get(key).filter(is_payload) {
        return inner;
    }
    match value.get("data").filter(|v| !v.is_null()) {
        Some(data) => data.get(key).filter(is_payload).unwrap_or(data),
        None => value,
    }
}

/// List payloads come bare or wrapped; anything that is not an array after
/// unwrapping yields an empty list.
pub fn unwrap_list<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    unwrap_envelope(value, key)
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn normalize_alumni(value: &Value) -> AlumniProfile {
    // `user` is an envelope only around a record; inside one it is a
    // populated reference.
    let record = if first_text(value, ID_KEYS).is_some() {
        value
    } else {
        ["alumni", "user", "data.alumni", "data.user", "data"]
            .iter()
            .filter_map(|path| lookup(value, path))
            .find(|v| v.is_object())
            .unwrap_or(value)
    };

    let name = first_text(record, NAME_KEYS).unwrap_or_else(|| {
        [
            lookup(record, "firstName").and_then(as_text),
            lookup(record, "lastName").and_then(as_text),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    });

    AlumniProfile {
        id: first_text(record, ID_KEYS).unwrap_or_default(),
        name,
        email: first_text(record, EMAIL_KEYS).unwrap_or_default(),
        phone: first_text(record, PHONE_KEYS),
        batch: first_year(record, BATCH_KEYS),
        school: first_text(record, SCHOOL_KEYS),
        company: first_text(record, COMPANY_KEYS),
        designation: first_text(record, DESIGNATION_KEYS),
        city: first_text(record, CITY_KEYS),
        bio: first_text(record, BIO_KEYS),
        avatar_url: first_text(record, AVATAR_KEYS),
        linkedin: first_text(record, LINKEDIN_KEYS),
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

fn parse_status(value: &Value) -> DeliveryStatus {
    match value.as_str().map(str::to_lowercase).as_deref() {
        Some("read") | Some("seen") => DeliveryStatus::Read,
        Some("delivered") => DeliveryStatus::Delivered,
        _ => DeliveryStatus::Sent,
    }
}

fn parse_content_type(value: &Value) -> ContentType {
    match value.as_str() {
        Some("image") => ContentType::Image,
        Some("file") => ContentType::File,
        _ => ContentType::Text,
    }
}

pub fn normalize_chat_message(value: &Value) -> Message {
    let timestamp = TIMESTAMP_KEYS
        .iter()
        .filter_map(|key| lookup(value, key))
        .find_map(parse_timestamp)
        .unwrap_or_else(Utc::now);

    Message {
        id: first_text(value, MESSAGE_ID_KEYS).unwrap_or_default(),
        content: first_text(value, CONTENT_KEYS).unwrap_or_default(),
        sender_id: first_text(value, SENDER_ID_KEYS).unwrap_or_default(),
        sender_name: first_text(value, SENDER_NAME_KEYS),
        timestamp,
        status: value.get("status").map(parse_status).unwrap_or(DeliveryStatus::Sent),
        content_type: value
            .get("type")
            .map(parse_content_type)
            .unwrap_or_default(),
    }
}

pub fn normalize_chat_history(value: &Value) -> Vec<Message> {
    let mut messages: Vec<Message> = unwrap_list(value, "messages")
        .iter()
        .map(normalize_chat_message)
        .collect();
    messages.sort_by_key(|m| m.timestamp);
    messages
}

pub fn normalize_state(value: &Value) -> State {
    State {
        id: first_text(value, &["id", "_id", "stateId"]).unwrap_or_default(),
        name: first_text(value, &["name", "stateName"]).unwrap_or_default(),
    }
}

pub fn normalize_school(value: &Value) -> School {
    School {
        id: first_text(value, &["id", "_id", "schoolId"]).unwrap_or_default(),
        name: first_text(value, &["name", "schoolName"]).unwrap_or_default(),
        city: first_text(value, &["city", "district", "location"]),
    }
}

/// Deserializes an education or experience record after folding `_id` and
/// numeric ids into a string `id`.
pub fn normalize_record<T: DeserializeOwned>(value: &Value, key: &str) -> Result<T, serde_json::Error> {
    let mut record = unwrap_envelope(value, key).clone();
    if let Value::Object(fields) = &mut record {
        let id = fields
            .get("id")
            .and_then(as_text)
            .or_else(|| fields.get("_id").and_then(as_text));
        fields.remove("_id");
        match id {
            Some(id) => fields.insert("id".to_string(), Value::String(id)),
            None => fields.remove("id"),
        };
    }
    serde_json::from_value(record)
}
