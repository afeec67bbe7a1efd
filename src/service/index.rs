use indexmap::IndexMap;

use super::phone::{digits_only, PhoneMatcher};
use crate::models::SentMessage;

/// 按号码数字串分组的已发送消息索引 (保留插入顺序)，每次运行构建一次
#[derive(Debug, Default)]
pub struct MessageIndex {
    by_phone: IndexMap<String, Vec<SentMessage>>,
}

impl MessageIndex {
    pub fn build(messages: impl IntoIterator<Item = SentMessage>) -> Self {
        let mut by_phone: IndexMap<String, Vec<SentMessage>> = IndexMap::new();
        for msg in messages {
            let key = digits_only(&msg.recipient_phone);
            if key.is_empty() {
                continue;
            }
            by_phone.entry(key).or_default().push(msg);
        }
        Self { by_phone }
    }

    /// 不同号码键的数量
    pub fn key_count(&self) -> usize {
        self.by_phone.len()
    }

    pub fn message_count(&self) -> usize {
        self.by_phone.values().map(Vec::len).sum()
    }

    /// 查找与号码匹配的所有消息，按发送时间倒序 (最新在前)
    pub fn lookup(&self, phone_digits: &str, matcher: &dyn PhoneMatcher) -> Vec<&SentMessage> {
        if phone_digits.is_empty() {
            return Vec::new();
        }

        let mut found: Vec<&SentMessage> = if matcher.exact_only() {
            self.by_phone
                .get(phone_digits)
                .map(|msgs| msgs.iter().collect())
                .unwrap_or_default()
        } else {
            // 容忍匹配需扫描全部号码键
            self.by_phone
                .iter()
                .filter(|(key, _)| matcher.same_number(key, phone_digits))
                .flat_map(|(_, msgs)| msgs.iter())
                .collect()
        };

        // 稳定排序，同一时间戳保持插入顺序
        found.sort_by(|a, b| b.sent_at_epoch.unwrap_or(0).cmp(&a.sent_at_epoch.unwrap_or(0)));
        found
    }
}
