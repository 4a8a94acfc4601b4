pub mod auth;
pub mod profile;
pub mod records;

pub use auth::*;
pub use profile::*;
pub use records::*;
