//! Core types for the client registry.

pub mod client;
pub mod code;
pub mod token;

pub use client::{Client, ClientRegistration, ClientSummary};
pub use code::AuthorizationCode;
pub use token::AccessToken;
