#![doc = include_str!("../README.md")]

pub mod client;
pub mod config;
pub mod creds;
pub mod endpoints;
pub mod error;
pub mod markup;
pub mod otp;
pub mod presence;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use client::ErpClient;
pub use config::{Config, OtpPolicy};
pub use creds::ErpCreds;
pub use endpoints::Endpoints;
pub use error::Error;
pub use otp::{OtpInput, OtpSource};
pub use presence::{NetworkPresence, TcpProbe};
pub use store::{CachedTokens, FileTokenStore, TokenStore};
pub use types::{LoginTokens, SessionToken, SsoToken};
