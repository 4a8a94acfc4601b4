use crate::api::backend::{BackendApi, BackendClient};
use crate::api::proxy::BackendProxy;
use crate::cli::{Args, ChatAction, Commands, ProfileAction, RecordAction};
use crate::models::*;
use crate::routes::{self, RouteResponse};
use crate::session::{FileStore, KeyValueStore, Session};
use crate::settings::{self, Settings};

use anyhow::{Context, Result, bail};
use chatstore::{Conversation, ConversationStore, DeliveryStatus, Message, User, mock};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, CustomType, Password, Select, Text};
use owo_colors::OwoColorize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;

pub async fn run(args: Args) -> Result<()> {
    if let Commands::Config {
        api_url,
        network_api_url,
    } = &args.command
    {
        return save_config(api_url.clone(), network_api_url.clone());
    }

    let args = settings::load_merged_args(&args)?;
    let endpoints = settings::endpoints(&args);

    let session_path = settings::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine config directory"))?
        .join("session.json");
    let mut session = Session::new(FileStore::new(session_path));

    let proxy = BackendProxy::new(endpoints).context("Failed to build HTTP client")?;
    let client = BackendClient::new(proxy).with_token(session.token()?);

    match args.command {
        Commands::Login { email } => login(&client, &mut session, email).await,
        Commands::Logout => {
            session.clear()?;
            println!("{} Signed out", "✓".bright_green());
            Ok(())
        }
        Commands::Register { kind } => register(&client, kind).await,
        Commands::ForgotPassword { email } => forgot_password(&client, email).await,
        Commands::Profile { action } => profile(&client, &session, action).await,
        Commands::States => {
            let states: Vec<State> = fetch_list(routes::states(&client), "states").await?;
            states.iter().for_each(|state| println!("{state}"));
            Ok(())
        }
        Commands::Schools { state_id } => {
            let schools: Vec<School> =
                fetch_list(routes::schools(&client, &state_id), "schools").await?;
            schools.iter().for_each(|school| println!("{school}"));
            Ok(())
        }
        Commands::Education { action } => records(&client, RecordKind::Education, action).await,
        Commands::Experience { action } => records(&client, RecordKind::Experience, action).await,
        Commands::Chat { action } => chat(&client, action).await,
        Commands::Config { .. } => Ok(()),
    }
}

fn save_config(api_url: Option<String>, network_api_url: Option<String>) -> Result<()> {
    let mut current = settings::load_settings()?;
    if api_url.is_none() && network_api_url.is_none() {
        println!("{}", toml::to_string_pretty(&current)?);
        return Ok(());
    }

    current = Settings {
        api_url: api_url.or(current.api_url),
        network_api_url: network_api_url.or(current.network_api_url),
    };
    settings::write_settings(&current)?;
    println!("{} Configuration saved", "✓".bright_green());
    Ok(())
}

async fn with_spinner<F: Future>(message: &str, future: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = future.await;

    spinner.finish_and_clear();
    output
}

/// Turns a failed route response into the banner the page would show.
fn expect_success(response: RouteResponse) -> Result<Value> {
    if response.is_success() {
        return Ok(response.body);
    }

    for (field, message) in response.field_errors() {
        eprintln!("  {} {}: {}", "•".yellow(), field.bright_white(), message);
    }

    let message = response
        .message()
        .unwrap_or(crate::api::backend::GENERIC_ERROR_MESSAGE)
        .to_string();
    bail!("{} (HTTP {})", message, response.status)
}

async fn fetch_list<T, F>(route: F, key: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: Future<Output = RouteResponse>,
{
    let mut body = expect_success(with_spinner("Loading...", route).await)?;
    let items = body.get_mut(key).map(Value::take).unwrap_or(Value::Null);
    if items.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(items).with_context(|| format!("Unexpected {key} payload"))
}

async fn login<S: KeyValueStore>(
    client: &impl BackendApi,
    session: &mut Session<S>,
    email: Option<String>,
) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => Text::new("Email:").prompt()?,
    };
    let password = Password::new("Password:").without_confirmation().prompt()?;

    let request = LoginRequest { email, password };
    let body = expect_success(with_spinner("Signing in...", routes::login(client, &request)).await)?;

    let token = body
        .get("token")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("Login succeeded but no token was returned"))?;
    let user: Option<AlumniProfile> = body
        .get("user")
        .filter(|u| !u.is_null())
        .map(|u| serde_json::from_value(u.clone()))
        .transpose()?;

    session.save_login(token, user.as_ref().map(|u| u.id.as_str()))?;

    let name = user
        .as_ref()
        .map(|u| u.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or(request.email);
    println!("{} Signed in as {}", "✓".bright_green(), name.bright_cyan());
    Ok(())
}

async fn register(client: &impl BackendApi, kind: RegistrationKind) -> Result<()> {
    let full_name = Text::new("Full name:").prompt()?;
    let email = Text::new("Email:").prompt()?;
    let password = Password::new("Password:").prompt()?;
    let phone = Text::new("Phone (optional):")
        .prompt_skippable()?
        .filter(|p| !p.trim().is_empty());

    let states: Vec<State> = fetch_list(routes::states(client), "states").await?;
    if states.is_empty() {
        bail!("No states available, cannot pick a school");
    }
    let state = Select::new("State:", states).prompt()?;

    let schools: Vec<School> = fetch_list(routes::schools(client, &state.id), "schools").await?;
    if schools.is_empty() {
        bail!("No schools registered in {}", state.name);
    }
    let school = Select::new("School:", schools).prompt()?;

    let mut request = RegisterRequest {
        kind,
        full_name,
        email,
        password,
        phone,
        state_id: Some(state.id),
        school_id: Some(school.id),
        ..RegisterRequest::default()
    };

    match kind {
        RegistrationKind::Alumni => {
            request.batch = Some(CustomType::<u16>::new("Passing year:").prompt()?);
        }
        RegistrationKind::ExEmployee => {
            request.designation = Some(Text::new("Designation held:").prompt()?);
        }
    }

    let body =
        expect_success(with_spinner("Registering...", routes::register(client, &request)).await)?;
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Registration successful");
    println!("{} {}", "✓".bright_green(), message);
    Ok(())
}

async fn forgot_password(client: &impl BackendApi, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => Text::new("Email:").prompt()?,
    };
    let request = ForgotPasswordRequest { email };
    let body = expect_success(
        with_spinner("Requesting reset link...", routes::forgot_password(client, &request)).await,
    )?;
    if let Some(message) = body.get("message").and_then(Value::as_str) {
        println!("{} {}", "✓".bright_green(), message);
    }
    Ok(())
}

fn signed_in_user<S: KeyValueStore>(session: &Session<S>) -> Result<String> {
    match session.user_id()? {
        Some(id) => Ok(id),
        None => bail!("Not signed in, run `alumni login` first"),
    }
}

fn print_profile(profile: &AlumniProfile) {
    println!("{}", profile.name.bright_cyan().bold());
    let fields = [
        ("Email", Some(profile.email.clone())),
        ("Phone", profile.phone.clone()),
        ("Batch", profile.batch.map(|b| b.to_string())),
        ("School", profile.school.clone()),
        ("Company", profile.company.clone()),
        ("Designation", profile.designation.clone()),
        ("City", profile.city.clone()),
        ("LinkedIn", profile.linkedin.clone()),
        ("About", profile.bio.clone()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            println!("{:>12} {}", label.bright_black(), value);
        }
    }
}

async fn profile<S: KeyValueStore>(
    client: &impl BackendApi,
    session: &Session<S>,
    action: ProfileAction,
) -> Result<()> {
    let response = match action {
        ProfileAction::Show { id } => {
            let id = match id {
                Some(id) => id,
                None => signed_in_user(session)?,
            };
            with_spinner("Loading profile...", routes::get_profile(client, &id)).await
        }
        ProfileAction::Update {
            name,
            phone,
            company,
            designation,
            city,
            bio,
            linkedin,
        } => {
            let id = signed_in_user(session)?;
            let changeset = ProfileChangeset {
                full_name: name,
                phone,
                company,
                designation,
                city,
                bio,
                linkedin,
            };
            with_spinner(
                "Saving profile...",
                routes::update_profile(client, &id, &changeset),
            )
            .await
        }
    };

    let profile: AlumniProfile = serde_json::from_value(expect_success(response)?)?;
    print_profile(&profile);
    Ok(())
}

fn prompt_education() -> Result<Education> {
    Ok(Education {
        id: None,
        institution: Text::new("Institution:").prompt()?,
        degree: Text::new("Degree:").prompt()?,
        field_of_study: Text::new("Field of study (optional):")
            .prompt_skippable()?
            .filter(|f| !f.trim().is_empty()),
        start_year: CustomType::<u16>::new("Start year (optional):").prompt_skippable()?,
        end_year: CustomType::<u16>::new("End year (optional):").prompt_skippable()?,
    })
}

fn prompt_experience() -> Result<Experience> {
    let company = Text::new("Company:").prompt()?;
    let title = Text::new("Title:").prompt()?;
    let location = Text::new("Location (optional):")
        .prompt_skippable()?
        .filter(|l| !l.trim().is_empty());
    let start_date = Text::new("Start date (optional):")
        .prompt_skippable()?
        .filter(|d| !d.trim().is_empty());
    let current = Confirm::new("Do you currently work here?")
        .with_default(false)
        .prompt()?;
    let end_date = if current {
        None
    } else {
        Text::new("End date (optional):")
            .prompt_skippable()?
            .filter(|d| !d.trim().is_empty())
    };
    let description = Text::new("Description (optional):")
        .prompt_skippable()?
        .filter(|d| !d.trim().is_empty());

    Ok(Experience {
        id: None,
        company,
        title,
        location,
        start_date,
        end_date,
        current,
        description,
    })
}

fn print_records<T: DeserializeOwned + fmt::Display + ProfileRecord>(body: Value, key: &str) -> Result<()> {
    let records: Vec<T> = match body.get(key) {
        Some(items) if !items.is_null() => serde_json::from_value(items.clone())
            .with_context(|| format!("Unexpected {key} payload"))?,
        _ => Vec::new(),
    };
    if records.is_empty() {
        println!("{} No entries yet", "ℹ".blue());
    }
    for record in records {
        println!("{} {}", record.record_id().unwrap_or("-").bright_black(), record);
    }
    Ok(())
}

async fn records(client: &impl BackendApi, kind: RecordKind, action: RecordAction) -> Result<()> {
    match action {
        RecordAction::List => {
            let body =
                expect_success(with_spinner("Loading...", routes::list_records(client, kind)).await)?;
            match kind {
                RecordKind::Education => print_records::<Education>(body, kind.envelope_key()),
                RecordKind::Experience => print_records::<Experience>(body, kind.envelope_key()),
            }
        }
        RecordAction::Add => {
            let response = match kind {
                RecordKind::Education => {
                    let education = prompt_education()?;
                    with_spinner("Saving...", routes::save_education(client, &education)).await
                }
                RecordKind::Experience => {
                    let experience = prompt_experience()?;
                    with_spinner("Saving...", routes::save_experience(client, &experience)).await
                }
            };
            expect_success(response)?;
            println!("{} {} added", "✓".bright_green(), kind);
            Ok(())
        }
        RecordAction::Remove { id } => {
            let body = expect_success(
                with_spinner("Removing...", routes::delete_record(client, kind, &id)).await,
            )?;
            if let Some(message) = body.get("message").and_then(Value::as_str) {
                println!("{} {}", "✓".bright_green(), message);
            }
            Ok(())
        }
    }
}

fn status_marker(status: DeliveryStatus) -> String {
    match status {
        DeliveryStatus::Sent => "✓".bright_black().to_string(),
        DeliveryStatus::Delivered => "✓✓".bright_black().to_string(),
        DeliveryStatus::Read => "✓✓".bright_blue().to_string(),
    }
}

fn print_message(message: &Message, is_mine: bool) {
    let time = message.timestamp.format("%Y-%m-%d %H:%M");
    if is_mine {
        println!(
            "{} {} {} {}",
            time.to_string().bright_black(),
            "you".bright_green(),
            message.content,
            status_marker(message.status)
        );
    } else {
        let sender = message
            .sender_name
            .clone()
            .unwrap_or_else(|| message.sender_id.clone());
        println!(
            "{} {} {}",
            time.to_string().bright_black(),
            sender.bright_cyan(),
            message.content
        );
    }
}

async fn chat(client: &impl BackendApi, action: ChatAction) -> Result<()> {
    match action {
        ChatAction::History { user_id } => {
            let messages: Vec<Message> =
                fetch_list(routes::chat_history(client, &user_id), "messages").await?;
            if messages.is_empty() {
                println!("{} No messages with {}", "ℹ".blue(), user_id);
            }
            for message in &messages {
                print_message(message, message.sender_id != user_id);
            }
            Ok(())
        }
        ChatAction::Send { user_id, text } => {
            expect_success(
                with_spinner("Sending...", routes::send_chat(client, &user_id, &text)).await,
            )?;
            println!("{} Sent to {}", "✓".bright_green(), user_id.bright_cyan());
            Ok(())
        }
        ChatAction::Demo => chat_demo(mock::seeded_store()).await,
    }
}

enum ChatMenuItem {
    Open(Conversation),
    NewChat,
    Quit,
}

impl fmt::Display for ChatMenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatMenuItem::Open(conversation) => {
                let pin = if conversation.pinned { "📌 " } else { "" };
                let mute = if conversation.muted { " 🔇" } else { "" };
                write!(f, "{pin}{}{mute}", conversation.display_name())?;
                if conversation.unread_count > 0 {
                    write!(f, " ({})", conversation.unread_count)?;
                }
                if let Some(last) = &conversation.last_message {
                    let preview: String = last.content.chars().take(40).collect();
                    write!(f, " - {preview}")?;
                }
                Ok(())
            }
            ChatMenuItem::NewChat => write!(f, "+ New chat"),
            ChatMenuItem::Quit => write!(f, "Quit"),
        }
    }
}

struct ContactLabel(User);

impl fmt::Display for ContactLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)?;
        if let Some(about) = &self.0.about {
            write!(f, " - {about}")?;
        }
        Ok(())
    }
}

async fn chat_demo(store: ConversationStore) -> Result<()> {
    loop {
        let mut items: Vec<ChatMenuItem> = store
            .conversations()
            .into_iter()
            .map(ChatMenuItem::Open)
            .collect();
        items.push(ChatMenuItem::NewChat);
        items.push(ChatMenuItem::Quit);

        let prompt = format!("Chats ({} unread):", store.total_unread());
        match Select::new(&prompt, items).with_page_size(12).prompt()? {
            ChatMenuItem::Open(conversation) => {
                store.select_conversation(&conversation.id);
                conversation_view(&store).await?;
            }
            ChatMenuItem::NewChat => {
                let contacts = mock::users().into_iter().map(ContactLabel).collect();
                let ContactLabel(user) = Select::new("Start a chat with:", contacts).prompt()?;
                store.start_conversation(user);
                conversation_view(&store).await?;
            }
            ChatMenuItem::Quit => return Ok(()),
        }
    }
}

async fn conversation_view(store: &ConversationStore) -> Result<()> {
    let local_user = store.local_user();

    while let Some(conversation) = store.active_conversation() {
        println!("\n{}", "━".repeat(50));
        println!("{}", conversation.display_name().bright_cyan().bold());
        if let Some(group) = &conversation.group {
            let members = group
                .members
                .iter()
                .map(|m| m.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!("{}", members.bright_black());
        } else if let Some(last_seen) = &conversation.participant.last_seen {
            println!("{}", format!("last seen {last_seen}").bright_black());
        }
        for message in &conversation.messages {
            print_message(message, message.sender_id == local_user.id);
        }

        let text = Text::new("Message (empty to go back):").prompt()?;
        if text.trim().is_empty() {
            store.go_back();
            break;
        }
        store.send_message(&conversation.id, text.trim())?;
    }

    Ok(())
}
