pub mod api;
pub mod cli;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod services;
pub mod session;
pub mod settings;
