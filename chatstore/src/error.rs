use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("conversation {0} not found")]
    ConversationNotFound(String),
}
