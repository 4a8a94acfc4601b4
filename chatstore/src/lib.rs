pub mod error;
pub mod mock;
pub mod models;
pub mod store;

pub use error::ChatError;
pub use models::*;
pub use store::{ChatState, ConversationStore, DEFAULT_DELIVERY_DELAY};
