//! GOPAX exchange protocol: request signing and wire schemas

pub mod auth;
pub mod types;

pub use auth::Credentials;
