pub mod auth;
pub mod onboard;
pub mod server;
