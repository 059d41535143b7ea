//! Hand-off of lottery results to whatever delivers messages

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// Drawn by the lottery, asked to accept or decline
    Selected,
    /// Still waiting; may be drawn if someone declines
    NotSelected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotteryNotice {
    pub event_id: i64,
    pub event_title: String,
    pub kind: NoticeKind,
    pub recipients: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub delivered: Vec<i64>,
    pub failed: Vec<i64>,
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notice: &LotteryNotice) -> anyhow::Result<DeliveryReport>;
}
