use chrono::DateTime;
use std::sync::Arc;

use super::index::MessageIndex;
use super::phone::{digits_only, PhoneMatcher};
use crate::models::{
    status_label, Category, ClassifiedRecord, DeliveryStatus, MessageSummary, SaleRecord,
    SaleSummary, SentMessage,
};

/// 每条记录附带的最多消息数
const MAX_ATTACHED_MESSAGES: usize = 3;
/// 消息摘录最大字符数
const EXCERPT_CHARS: usize = 60;

/// 对账分类器: 结合消息记录与内部状态，为每笔销售确定唯一分类
pub struct Classifier {
    matcher: Arc<dyn PhoneMatcher>,
    lookback_days: u32,
}

impl Classifier {
    pub fn new(matcher: Arc<dyn PhoneMatcher>, lookback_days: u32) -> Self {
        Self {
            matcher,
            lookback_days,
        }
    }

    /// 分类单笔销售，电话缺失或无效时按无匹配处理
    pub fn classify(&self, sale: &SaleRecord, index: &MessageIndex) -> ClassifiedRecord {
        // 1. 号码归一化
        let tel = sale
            .customer_phone
            .as_deref()
            .map(digits_only)
            .unwrap_or_default();

        // 2. 查找匹配消息 (最新在前)
        let matched = index.lookup(&tel, self.matcher.as_ref());
        let has_match = !matched.is_empty();

        // 3. 决策表
        let (category, diagnostic) = self.decide(has_match, sale.delivery_status);

        // 4. 附带最近的消息
        let messages = matched
            .iter()
            .take(MAX_ATTACHED_MESSAGES)
            .map(|m| summarize(m))
            .collect();

        ClassifiedRecord {
            sale: SaleSummary::from(sale),
            category,
            messages,
            diagnostic,
        }
    }

    pub fn classify_all(&self, sales: &[SaleRecord], index: &MessageIndex) -> Vec<ClassifiedRecord> {
        sales.iter().map(|sale| self.classify(sale, index)).collect()
    }

    fn decide(&self, has_match: bool, status: DeliveryStatus) -> (Category, String) {
        use DeliveryStatus::*;

        match (has_match, status) {
            (true, Pending) => (
                Category::WaSentButUnconfirmed,
                "Provider shows a sent message but the sale is still 'pending': the automation \
                 failed to write the status back, so this sale will likely be sent again."
                    .to_string(),
            ),
            (false, Sent) => (
                Category::FirestoreConfirmedButUnverified,
                format!(
                    "Sale is marked 'sent' but no message was found in the provider log for the \
                     last {} days. The message may be older than the window, or the status is \
                     inconsistent.",
                    self.lookback_days
                ),
            ),
            (true, Sent) => (
                Category::ConfirmedBoth,
                "Confirmed: sent according to both the provider and the sale status.".to_string(),
            ),
            (false, Pending) => (
                Category::GenuinelyPendingOrError,
                "Awaiting send. No provider message found.".to_string(),
            ),
            (false, Error) => (
                Category::GenuinelyPendingOrError,
                "Attempts exhausted. No provider message found.".to_string(),
            ),
            (true, Error) => (
                Category::Anomalous,
                "Sale is marked 'error' but the provider shows a message to this number: a later \
                 attempt may have succeeded without a status write-back."
                    .to_string(),
            ),
            (true, Duplicate) => (
                Category::Anomalous,
                "Sale is marked 'duplicate' and the provider shows a message to this number, \
                 probably sent for another sale of the same customer."
                    .to_string(),
            ),
            (false, Duplicate) => (
                Category::Anomalous,
                "Sale is marked 'duplicate' and no provider message was found.".to_string(),
            ),
        }
    }
}

fn summarize(msg: &SentMessage) -> MessageSummary {
    MessageSummary {
        id: msg.id.clone(),
        sent_at: msg.sent_at_epoch.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        status: status_label(msg.provider_status_code),
        excerpt: truncate_excerpt(&msg.excerpt),
    }
}

fn truncate_excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_CHARS {
        let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
        out.push('…');
        out
    } else {
        text.to_string()
    }
}
