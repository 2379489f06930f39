//! Bot event loop
//!
//! Glues the gateway client to the core coordinator. Per-event failures are
//! logged and absorbed so the loop keeps serving; only losing the gateway
//! connection ends it.

use std::collections::HashMap;
use std::time::Duration;

use matchday_core::{Clock, Coordinator, Error, MatchSnapshot, Schedule, Storage};
use matchday_net::{GatewayClient, GatewayEvent, GatewayMessage, SenderInfo};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::inbound::{self, BotCommand};
use crate::render;

/// Dedup purge + keepalive cadence
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(600);

pub struct BotRuntime<S, C> {
    coordinator: Coordinator<S, C>,
    client: GatewayClient,
    default_schedule: Schedule,
    /// SendMessage correlations awaiting a MessagePosted ack, by match
    pending_posts: HashMap<Uuid, Uuid>,
}

impl<S: Storage, C: Clock> BotRuntime<S, C> {
    pub fn new(
        coordinator: Coordinator<S, C>,
        client: GatewayClient,
        default_schedule: Schedule,
    ) -> Self {
        Self {
            coordinator,
            client,
            default_schedule,
            pending_posts: HashMap::new(),
        }
    }

    pub async fn run(mut self) {
        let mut maintenance = tokio::time::interval(MAINTENANCE_INTERVAL);

        loop {
            tokio::select! {
                event = self.client.next_event() => {
                    match event {
                        Some(GatewayEvent::Ready) => info!("Gateway registration accepted"),
                        Some(GatewayEvent::Update(update)) => self.handle_update(update).await,
                        Some(GatewayEvent::Posted { correlation, chat_id, message_ref }) => {
                            self.handle_posted(correlation, chat_id, message_ref).await;
                        }
                        Some(GatewayEvent::Disconnected) | None => {
                            warn!("Gateway connection lost, shutting down");
                            break;
                        }
                    }
                }

                _ = maintenance.tick() => {
                    match self.coordinator.purge_expired_confirmations() {
                        Ok(0) => {}
                        Ok(n) => debug!(purged = n, "Expired confirmation ids removed"),
                        Err(e) => warn!(error = %e, "Confirmation purge failed"),
                    }
                    let _ = self.client.send(GatewayMessage::Ping).await;
                }
            }
        }
    }

    async fn handle_update(&mut self, update: GatewayMessage) {
        match update {
            GatewayMessage::Command {
                chat_id,
                chat_title,
                command,
                args,
                ..
            } => match BotCommand::parse(&command) {
                Some(BotCommand::NewTeam) => self.on_new_team(chat_id, &chat_title).await,
                Some(BotCommand::NextMatch) => self.on_next_match(chat_id, &chat_title).await,
                Some(BotCommand::SetSchedule) => self.on_set_schedule(chat_id, &args).await,
                Some(BotCommand::SeasonStats) => self.on_season_stats(chat_id).await,
                None => debug!(command = %command, "Ignoring unknown command"),
            },
            GatewayMessage::Callback {
                chat_id,
                sender,
                data,
                update_id,
                timestamp,
                ..
            } => {
                self.on_callback(chat_id, &sender, &data, &update_id, timestamp)
                    .await;
            }
            other => debug!(message = ?other, "Ignoring unexpected update"),
        }
    }

    async fn on_new_team(&mut self, chat_id: i64, title: &str) {
        match self
            .coordinator
            .ensure_team(chat_id, title, self.default_schedule.clone())
        {
            Ok(_) => self.reply(chat_id, render::greeting()).await,
            Err(e) => error!(chat_id, error = %e, "Team registration failed"),
        }
    }

    async fn on_next_match(&mut self, chat_id: i64, title: &str) {
        // register on first contact, like /newteam would
        if let Err(e) = self
            .coordinator
            .ensure_team(chat_id, title, self.default_schedule.clone())
        {
            error!(chat_id, error = %e, "Team registration failed");
            return;
        }

        match self.coordinator.next_match(chat_id) {
            Ok(outcome) => {
                let snapshot = MatchSnapshot::of(&outcome.current);
                // a reused match already has its pinned summary; only a
                // fresh one (or one whose post never got acked) needs a post
                if snapshot.message_ref.is_none() {
                    self.post_summary(&snapshot).await;
                }
            }
            Err(e) => {
                error!(chat_id, error = %e, "Next-match request failed");
                self.reply(chat_id, render::oops().to_string()).await;
            }
        }
    }

    async fn on_set_schedule(&mut self, chat_id: i64, args: &str) {
        match self.coordinator.set_schedule(chat_id, args) {
            Ok(_) => self.reply(chat_id, render::schedule_updated().to_string()).await,
            Err(Error::InvalidSchedule(_)) => {
                self.reply(chat_id, render::invalid_schedule().to_string()).await;
            }
            Err(Error::NotFound(_)) => self.reply(chat_id, render::no_team().to_string()).await,
            Err(e) => error!(chat_id, error = %e, "Schedule update failed"),
        }
    }

    async fn on_season_stats(&mut self, chat_id: i64) {
        match self.coordinator.season_stats(chat_id) {
            Ok(stats) => self.reply(chat_id, render::season_stats(&stats)).await,
            Err(e) => error!(chat_id, error = %e, "Season stats failed"),
        }
    }

    async fn on_callback(
        &mut self,
        chat_id: i64,
        sender: &SenderInfo,
        data: &str,
        update_id: &str,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) {
        // fire-and-forget semantics: an unusable payload gets no reply
        let event = match inbound::confirmation_event(chat_id, sender, data, update_id, timestamp) {
            Ok(event) => event,
            Err(e) => {
                warn!(chat_id, error = %e, "Unusable confirmation payload");
                return;
            }
        };

        match self.coordinator.apply_confirmation(&event) {
            Ok(Some(snapshot)) => match snapshot.message_ref {
                Some(message_ref) => {
                    let msg = GatewayMessage::EditMessage {
                        chat_id,
                        message_ref,
                        text: render::match_summary(&snapshot),
                        keyboard: render::vote_keyboard(&snapshot),
                    };
                    if let Err(e) = self.client.send(msg).await {
                        warn!(chat_id, error = %e, "Failed to refresh summary");
                    }
                }
                None => self.post_summary(&snapshot).await,
            },
            // duplicate, late, or misaddressed vote - deliberately silent
            Ok(None) => {}
            Err(e) => error!(chat_id, error = %e, "Confirmation processing failed"),
        }
    }

    async fn post_summary(&mut self, snapshot: &MatchSnapshot) {
        let correlation = Uuid::new_v4();
        self.pending_posts.insert(correlation, snapshot.match_id);

        let msg = GatewayMessage::SendMessage {
            correlation,
            chat_id: snapshot.chat_id,
            text: render::match_summary(snapshot),
            keyboard: render::vote_keyboard(snapshot),
        };
        if let Err(e) = self.client.send(msg).await {
            warn!(chat_id = snapshot.chat_id, error = %e, "Failed to post match summary");
            self.pending_posts.remove(&correlation);
        }
    }

    async fn handle_posted(&mut self, correlation: Uuid, chat_id: i64, message_ref: i64) {
        // plain replies are posted without tracking; only summaries are linked
        let Some(match_id) = self.pending_posts.remove(&correlation) else {
            return;
        };

        if let Err(e) = self.coordinator.link_message(match_id, message_ref) {
            warn!(%match_id, error = %e, "Failed to link summary message");
        }
        let _ = self
            .client
            .send(GatewayMessage::PinMessage {
                chat_id,
                message_ref,
            })
            .await;
    }

    async fn reply(&self, chat_id: i64, text: String) {
        let msg = GatewayMessage::SendMessage {
            correlation: Uuid::new_v4(),
            chat_id,
            text,
            keyboard: Vec::new(),
        };
        if let Err(e) = self.client.send(msg).await {
            warn!(chat_id, error = %e, "Failed to send reply");
        }
    }
}
