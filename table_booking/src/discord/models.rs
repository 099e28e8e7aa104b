//! Discord REST payloads.

use serde::{Deserialize, Serialize};

/// Channel message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

/// Rich embed attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(rename = "channelId", default, skip_serializing_if = "String::is_empty")]
    pub channel_id: String,
}

impl Embed {
    /// Empty `rich` embed with a title
    pub fn rich(title: impl Into<String>) -> Self {
        Self {
            kind: "rich".to_string(),
            title: title.into(),
            fields: Vec::new(),
            channel_id: String::new(),
        }
    }

    /// Append an inline field
    pub fn inline_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: true,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Guild member as returned by member search and `users/@me/guilds/{id}/member`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: DiscordUser,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Member {
    /// Mention tag for this member, e.g. `<@80351110224678912>`
    pub fn tag(&self) -> String {
        mention(&self.user.id)
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.iter().any(|r| r == role_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
}

/// OAuth2 token returned by the authorization-code exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub scope: String,
    pub token_type: String,
}

/// Mention markup for a user ID
pub fn mention(id: &str) -> String {
    format!("<@{id}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_serializes_type_field() {
        let embed = Embed::rich("title").inline_field("Jeu", "Warhammer");
        let json = serde_json::to_value(&embed).unwrap();

        assert_eq!(json["type"], "rich");
        assert_eq!(json["fields"][0]["name"], "Jeu");
        assert_eq!(json["fields"][0]["inline"], true);
        assert!(json.get("channelId").is_none());
    }

    #[test]
    fn test_member_deserializes_without_roles() {
        let member: Member =
            serde_json::from_str(r#"{"user": {"id": "42", "username": "player2"}}"#).unwrap();
        assert_eq!(member.tag(), "<@42>");
        assert!(!member.has_role("admin"));
    }
}
