//! Notification service implementation
//!
//! Delivers lottery notices to entrants as Telegram messages. Entrant ids are
//! Telegram user ids, so each notice is a private chat message.

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use teloxide::{Bot, types::{ChatId, ParseMode}, requests::Requester, prelude::Request, payloads::SendMessageSetters};
use tracing::{debug, info, warn};
use crate::lottery::notify::{DeliveryReport, LotteryNotice, NoticeKind, NotificationDispatcher};
use crate::utils::errors::{PickMeError, Result};

/// Message template structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub key: String,
    pub content: HashMap<String, String>, // language -> content mapping
    pub parse_mode: Option<ParseMode>,
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    language: String,
    templates: HashMap<String, MessageTemplate>,
    delay: Duration,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            language: "en".to_string(),
            templates: Self::load_default_templates(),
            delay: Duration::from_millis(50),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Add or update a message template
    pub fn add_template(&mut self, template: MessageTemplate) {
        self.templates.insert(template.key.clone(), template);
    }

    fn template_key(kind: NoticeKind) -> &'static str {
        match kind {
            NoticeKind::Selected => "lottery_selected",
            NoticeKind::NotSelected => "lottery_not_selected",
        }
    }

    /// Format message using template and parameters
    fn format_message(&self, template_key: &str, parameters: &HashMap<String, String>) -> Result<(String, Option<ParseMode>)> {
        let template = self.templates.get(template_key)
            .ok_or_else(|| PickMeError::InvalidInput(format!("Template not found: {}", template_key)))?;

        let content = template.content.get(&self.language)
            .or_else(|| template.content.get("en"))
            .ok_or_else(|| PickMeError::InvalidInput(format!("Template content not found for language: {}", self.language)))?;

        let mut formatted = content.clone();
        for (key, value) in parameters {
            let placeholder = format!("{{{}}}", key);
            formatted = formatted.replace(&placeholder, value);
        }

        Ok((formatted, template.parse_mode))
    }

    fn render(&self, notice: &LotteryNotice) -> Result<(String, Option<ParseMode>)> {
        let mut parameters = HashMap::new();
        parameters.insert("event_title".to_string(), notice.event_title.clone());
        parameters.insert("event_id".to_string(), notice.event_id.to_string());
        self.format_message(Self::template_key(notice.kind), &parameters)
    }

    fn load_default_templates() -> HashMap<String, MessageTemplate> {
        let mut templates = HashMap::new();

        let mut selected = HashMap::new();
        selected.insert("en".to_string(),
            "🎉 <b>You were selected!</b>\n\nYou won a spot at <b>{event_title}</b>.\nReply /accept {event_id} to confirm or /decline {event_id} to give your spot away.".to_string());
        templates.insert("lottery_selected".to_string(), MessageTemplate {
            key: "lottery_selected".to_string(),
            content: selected,
            parse_mode: Some(ParseMode::Html),
        });

        let mut not_selected = HashMap::new();
        not_selected.insert("en".to_string(),
            "The lottery for <b>{event_title}</b> has been drawn and you were not selected this time.\nYou stay on the waiting list and may still be drawn if a spot frees up.".to_string());
        templates.insert("lottery_not_selected".to_string(), MessageTemplate {
            key: "lottery_not_selected".to_string(),
            content: not_selected,
            parse_mode: Some(ParseMode::Html),
        });

        templates
    }
}

#[async_trait]
impl NotificationDispatcher for TelegramNotifier {
    async fn dispatch(&self, notice: &LotteryNotice) -> anyhow::Result<DeliveryReport> {
        let (text, parse_mode) = self.render(notice)?;
        let mut report = DeliveryReport::default();

        info!(event_id = notice.event_id, kind = ?notice.kind, count = notice.recipients.len(), "Sending lottery notices");

        for &entrant_id in &notice.recipients {
            let mut request = self.bot.send_message(ChatId(entrant_id), text.clone());
            if let Some(parse_mode) = parse_mode {
                request = request.parse_mode(parse_mode);
            }

            match request.send().await {
                Ok(_) => {
                    debug!(event_id = notice.event_id, entrant_id = entrant_id, "Lottery notice delivered");
                    report.delivered.push(entrant_id);
                }
                Err(e) => {
                    warn!(event_id = notice.event_id, entrant_id = entrant_id, error = %e, "Failed to deliver lottery notice");
                    report.failed.push(entrant_id);
                }
            }

            // Small delay between messages to avoid rate limiting
            tokio::time::sleep(self.delay).await;
        }

        Ok(report)
    }
}
