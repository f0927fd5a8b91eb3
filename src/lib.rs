pub mod auth;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod domain;
pub mod handlers;
pub mod response;
pub mod session;
pub mod srs;
pub mod state;
pub mod validation;

#[cfg(test)]
mod testing;
