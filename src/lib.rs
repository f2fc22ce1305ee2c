pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod response;
pub mod session;
pub mod slug;
pub mod store;
pub mod tenancy;
pub mod types;
