pub mod backend;
pub mod proxy;
