//! Discord integration: REST payloads, errors and the HTTP client.
//!
//! The rest of the crate talks to Discord through two narrow traits:
//! [`ChatClient`] for posting announcements and searching members, and
//! [`GuildSession`] for resolving a user's OAuth token to a guild member.
//! [`DiscordClient`] implements both over reqwest.

pub mod client;
pub mod errors;
pub mod models;

pub use client::{ChatClient, DISCORD_API_URL, DiscordClient, DiscordConfig, GuildSession};
pub use errors::{DiscordError, DiscordResult};
pub use models::{DiscordUser, Embed, EmbedField, Member, Message, OAuthToken, mention};
