use std::fmt;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::models::RegistrationKind;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Primary backend URL (usually localhost)
    #[arg(long, env = "API_BASE_URL", global = true)]
    pub api_url: Option<String>,

    /// Fallback backend URL (usually the LAN address)
    #[arg(long, env = "API_BASE_URL_NETWORK", global = true)]
    pub network_api_url: Option<String>,

    /// Log verbosity
    #[arg(short, long, value_name = "LEVEL", default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in and remember the session token
    Login {
        /// Account email, prompted when omitted
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Create an account
    Register {
        /// Registration tab
        #[arg(long, value_enum, default_value_t = RegistrationKind::Alumni)]
        kind: RegistrationKind,
    },

    /// Request a password reset link
    ForgotPassword {
        /// Account email, prompted when omitted
        #[arg(long)]
        email: Option<String>,
    },

    /// View or edit an alumni profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// List states
    States,

    /// List schools of a state
    Schools {
        /// State id
        state_id: String,
    },

    /// Manage education entries of the signed-in profile
    Education {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Manage work experience entries of the signed-in profile
    Experience {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Messaging
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },

    /// Save backend URLs to the config file
    Config {
        /// Primary backend URL to store
        #[arg(long)]
        api_url: Option<String>,

        /// Fallback backend URL to store
        #[arg(long)]
        network_api_url: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileAction {
    /// Show a profile, defaults to the signed-in user
    Show { id: Option<String> },

    /// Update fields of the signed-in profile
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        designation: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        linkedin: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecordAction {
    /// List entries
    List,
    /// Add an entry interactively
    Add,
    /// Remove an entry
    Remove { id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ChatAction {
    /// Show the message history with a user
    History {
        /// Other participant's id
        user_id: String,
    },

    /// Send a message to a user
    Send {
        /// Recipient id
        user_id: String,
        /// Message text
        text: String,
    },

    /// Browse the sample conversations interactively
    Demo,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}
