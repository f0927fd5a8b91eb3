//! Authentication for the bot-to-backend endpoints.

pub mod middleware;

pub use middleware::BotAuth;
