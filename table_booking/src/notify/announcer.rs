//! Booking announcements posted to the community's Discord channel.

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use log::warn;
use std::sync::Arc;

use super::resolver::IdentityResolver;
use crate::booking::{Booking, LifecycleEvent, LifecycleEventKind, LifecycleHook};
use crate::discord::{ChatClient, DiscordResult, Embed, Message, mention};

/// Zone used when none is configured
pub const DEFAULT_TIME_ZONE: &str = "Europe/Paris";

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const EMPTY_DESCRIPTION: &str = "Aucune";
const PLAYER_SEPARATOR: &str = ", ";

/// Announcement settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Channel receiving every announcement
    pub channel_id: String,
    /// IANA zone name used to display booking dates
    pub time_zone: String,
}

impl NotifyConfig {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
        }
    }
}

/// Zone booking dates are rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Named(Tz),
    /// Host zone, used when the configured name is unknown
    Local,
}

impl DisplayZone {
    /// Parse an IANA zone name, degrading to the host zone when it is unknown
    pub fn parse(name: &str) -> Self {
        match name.parse::<Tz>() {
            Ok(tz) => DisplayZone::Named(tz),
            Err(_) => {
                warn!("Unknown time zone '{name}', announcing dates in local time");
                DisplayZone::Local
            }
        }
    }

    pub fn format(&self, instant: DateTime<Utc>) -> String {
        match self {
            DisplayZone::Named(tz) => instant.with_timezone(tz).format(DATE_TIME_FORMAT).to_string(),
            DisplayZone::Local => instant
                .with_timezone(&Local)
                .format(DATE_TIME_FORMAT)
                .to_string(),
        }
    }
}

/// Embed title for a lifecycle event
pub fn event_label(kind: &LifecycleEventKind) -> &'static str {
    match kind {
        LifecycleEventKind::Created => "Nouvelle Réservation :calendar:",
        LifecycleEventKind::Modified => "Réservation Modifiée :pencil:",
        LifecycleEventKind::Accepted => "Réservation Acceptée :white_check_mark:",
        LifecycleEventKind::Refused { .. } => "Réservation Refusée :no_entry:",
        LifecycleEventKind::Canceled => "Réservation Annulée :negative_squared_cross_mark:",
    }
}

/// Posts one embed per committed booking change.
///
/// Used as the engine's [`LifecycleHook`]: delivery runs on a detached task
/// and failures are only logged.
#[derive(Clone)]
pub struct Announcer {
    client: Arc<dyn ChatClient>,
    resolver: IdentityResolver,
    channel_id: String,
    zone: DisplayZone,
}

impl Announcer {
    pub fn new(client: Arc<dyn ChatClient>, resolver: IdentityResolver, config: &NotifyConfig) -> Self {
        Self {
            client,
            resolver,
            channel_id: config.channel_id.clone(),
            zone: DisplayZone::parse(&config.time_zone),
        }
    }

    /// Build and send the announcement for `event`
    pub async fn announce(&self, event: &LifecycleEvent) -> DiscordResult<()> {
        let message = self.compose(event).await;
        self.client.send_message(&self.channel_id, &message).await
    }

    /// Build the announcement without sending it
    pub async fn compose(&self, event: &LifecycleEvent) -> Message {
        let booking = &event.booking;
        let players = self.player_tags(booking).await;

        let description = if booking.description.is_empty() {
            EMPTY_DESCRIPTION
        } else {
            booking.description.as_str()
        };

        let mut embed = Embed::rich(event_label(&event.kind))
            .inline_field("Utilisateur", requester_tag(booking))
            .inline_field("Date et Heure", self.zone.format(booking.date_time))
            .inline_field("Jeu", booking.game.as_str())
            .inline_field("Points", booking.points.to_string())
            .inline_field("Joueurs", players.join(PLAYER_SEPARATOR))
            .inline_field("Description", description);
        embed.channel_id = self.channel_id.clone();

        if let LifecycleEventKind::Refused { reason } = &event.kind {
            if !reason.is_empty() {
                embed = embed.inline_field("Raison", reason.as_str());
            }
        }

        Message {
            content: String::new(),
            embeds: vec![embed],
        }
    }

    /// Mention tags of every player that resolves; the rest are left out
    async fn player_tags(&self, booking: &Booking) -> Vec<String> {
        let mut tags = Vec::with_capacity(booking.players.len());
        for player in &booking.players {
            if let Some(member) = self.resolver.resolve(player).await {
                tags.push(member.tag());
            }
        }
        tags
    }
}

impl LifecycleHook for Announcer {
    fn after_commit(&self, event: LifecycleEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, skipping announcement for booking {}", event.booking.id);
            return;
        };

        let announcer = self.clone();
        runtime.spawn(async move {
            if let Err(e) = announcer.announce(&event).await {
                warn!(
                    "Failed to announce {:?} for booking {}: {e}",
                    event.kind, event.booking.id
                );
            }
        });
    }
}

/// Requester mention, falling back to the username when no user ID was stored
fn requester_tag(booking: &Booking) -> String {
    if booking.user_id.is_empty() {
        mention(&booking.username)
    } else {
        mention(&booking.user_id)
    }
}
