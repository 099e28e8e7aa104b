//! Discord REST client and the capability traits the rest of the crate uses.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{
    errors::{DiscordError, DiscordResult},
    models::{Member, Message, OAuthToken},
};

/// Discord REST API root
pub const DISCORD_API_URL: &str = "https://discord.com/api/v10";

/// Outbound chat operations needed by the notification pipeline
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Post a message to a channel
    async fn send_message(&self, channel_id: &str, message: &Message) -> DiscordResult<()>;

    /// Search guild members whose username or nickname starts with `query`
    async fn search_members(&self, query: &str, limit: u32) -> DiscordResult<Vec<Member>>;
}

/// User-token operations needed by the HTTP authentication layer
#[async_trait]
pub trait GuildSession: Send + Sync {
    /// Exchange an OAuth2 authorization code for an access token
    async fn exchange_code(&self, code: &str) -> DiscordResult<OAuthToken>;

    /// Guild membership of the user owning `access_token`
    async fn current_member(&self, access_token: &str) -> DiscordResult<Member>;
}

/// Discord application credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordConfig {
    pub bot_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Guild (server) the community lives in
    pub guild_id: String,
    pub api_url: String,
    /// Transport timeout for every request
    pub timeout: Duration,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            guild_id: String::new(),
            api_url: DISCORD_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Discord API client
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    config: DiscordConfig,
}

impl DiscordClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns `DiscordError::InvalidConfig` if the HTTP client cannot be built
    pub fn new(config: DiscordConfig) -> DiscordResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DiscordError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn with_bot_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Accept", "application/json")
            .header("Authorization", format!("Bot {}", self.config.bot_token))
    }

    async fn send(request: RequestBuilder) -> DiscordResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| DiscordError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response)
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> DiscordResult<T> {
        let response = Self::send(request).await?;

        if response.status() != StatusCode::OK {
            return Err(api_error(response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DiscordError::ResponseParseFailed(e.to_string()))
    }
}

async fn api_error(response: Response) -> DiscordError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("failed to read error body: {e}"));
    DiscordError::Api { status, body }
}

#[async_trait]
impl ChatClient for DiscordClient {
    async fn send_message(&self, channel_id: &str, message: &Message) -> DiscordResult<()> {
        let channel_id = channel_id.trim();
        if channel_id.is_empty() {
            return Err(DiscordError::EmptyChannel);
        }

        let request = self
            .client
            .post(self.url(&format!("channels/{channel_id}/messages")))
            .json(message);
        Self::send(self.with_bot_auth(request)).await?;

        Ok(())
    }

    async fn search_members(&self, query: &str, limit: u32) -> DiscordResult<Vec<Member>> {
        let request = self
            .client
            .get(self.url(&format!("guilds/{}/members/search", self.config.guild_id)))
            .query(&[("query", query.to_string()), ("limit", limit.to_string())]);

        Self::json(self.with_bot_auth(request)).await
    }
}

#[async_trait]
impl GuildSession for DiscordClient {
    async fn exchange_code(&self, code: &str) -> DiscordResult<OAuthToken> {
        let form = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let request = self
            .client
            .post(self.url("oauth2/token"))
            .header("Accept", "application/json")
            .form(&form);

        Self::json(request).await
    }

    async fn current_member(&self, access_token: &str) -> DiscordResult<Member> {
        let request = self
            .client
            .get(self.url(&format!("users/@me/guilds/{}/member", self.config.guild_id)))
            .header("Accept", "application/json")
            .bearer_auth(access_token);

        Self::json(request).await
    }
}
