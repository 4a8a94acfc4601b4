//! Static data set behind the messaging view until chat history is served by
//! the backend.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeSet;

use crate::models::{
    ContentType, Conversation, DeliveryStatus, GroupInfo, Message, PresenceStatus, User,
};
use crate::store::ConversationStore;

pub const LOCAL_USER_ID: &str = "me";

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 12, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

fn message(id: &str, sender: &User, content: &str, minutes: i64, status: DeliveryStatus) -> Message {
    Message {
        id: id.to_string(),
        content: content.to_string(),
        sender_id: sender.id.clone(),
        sender_name: Some(sender.name.clone()),
        timestamp: base_time() + Duration::minutes(minutes),
        status,
        content_type: ContentType::Text,
    }
}

pub fn local_user() -> User {
    User::new(LOCAL_USER_ID, "You").with_status(PresenceStatus::Online)
}

pub fn users() -> Vec<User> {
    vec![
        User::new("u-1", "Priya Sharma")
            .with_status(PresenceStatus::Online)
            .with_about("Batch of 2015, product manager"),
        User::new("u-2", "Rahul Verma")
            .with_status(PresenceStatus::Offline)
            .with_last_seen("2 hours ago")
            .with_about("Former systems engineer"),
        User::new("u-3", "Ananya Iyer")
            .with_status(PresenceStatus::Online)
            .with_about("Alumni relations"),
        User::new("u-4", "Vikram Rao")
            .with_status(PresenceStatus::Offline)
            .with_last_seen("yesterday"),
    ]
}

pub fn conversations() -> Vec<Conversation> {
    let me = local_user();
    let people = users();
    let (priya, rahul, ananya, vikram) = (&people[0], &people[1], &people[2], &people[3]);

    let mut first = Conversation::direct("conv-1", priya.clone());
    first.push_message(message("m-1", priya, "Are you coming to the reunion?", 0, DeliveryStatus::Read));
    first.push_message(message("m-2", &me, "Yes, booked my tickets!", 3, DeliveryStatus::Read));
    first.pinned = true;

    let mut second = Conversation::direct("conv-2", rahul.clone());
    second.push_message(message("m-3", rahul, "Hey, long time!", 20, DeliveryStatus::Read));
    second.push_message(message("m-4", &me, "Indeed. How is the new role?", 22, DeliveryStatus::Delivered));
    second.push_message(message("m-5", rahul, "Busy but fun. Let's catch up.", 40, DeliveryStatus::Delivered));
    second.unread_count = 1;

    let mut third = Conversation::direct("conv-3", ananya.clone());
    third.push_message(message("m-6", ananya, "Could you update your profile photo?", 60, DeliveryStatus::Delivered));
    third.unread_count = 1;
    third.muted = true;

    let mut group = Conversation::group(
        "conv-4",
        GroupInfo {
            name: "Class of 2015".to_string(),
            avatar: None,
            description: "Batch-mates keeping in touch".to_string(),
            members: vec![me.clone(), priya.clone(), rahul.clone(), vikram.clone()],
            admins: BTreeSet::from([priya.id.clone()]),
            created_at: base_time() - Duration::days(30),
        },
    );
    group.push_message(message("m-7", priya, "Welcome everyone!", 90, DeliveryStatus::Read));
    group.push_message(message("m-8", vikram, "Great to be here.", 95, DeliveryStatus::Delivered));
    group.unread_count = 2;

    vec![first, second, third, group]
}

pub fn seeded_store() -> ConversationStore {
    ConversationStore::new(local_user(), conversations())
}
