//! Gmail REST API mailbox provider.

mod client;
pub mod mime;
mod oauth;

pub use client::GmailProvider;
pub use oauth::OAuthRefresher;
