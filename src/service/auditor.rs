use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use super::classifier::Classifier;
use super::index::MessageIndex;
use super::phone::PhoneMatcher;
use super::report::{assemble, RunContext};
use super::source::{MessageSource, SalesSource};
use crate::error;
use crate::models::{MessageFetchStatus, ReconciliationReport, RunConfig};

/// 投递对账服务: 拉取两侧记录、分类并生成报告。只读，可重复执行。
pub struct DeliveryAuditor<S, M> {
    sales: S,
    messages: M,
    lookback_days: u32,
    message_fetch_limit: u32,
    matcher: Arc<dyn PhoneMatcher>,
}

impl<S, M> DeliveryAuditor<S, M>
where
    S: SalesSource,
    M: MessageSource,
{
    pub fn new(
        sales: S,
        messages: M,
        lookback_days: u32,
        message_fetch_limit: u32,
        matcher: Arc<dyn PhoneMatcher>,
    ) -> Self {
        Self {
            sales,
            messages,
            lookback_days,
            message_fetch_limit,
            matcher,
        }
    }

    /// 执行一次对账。销售记录拉取失败时中止；消息拉取失败时降级为空索引继续。
    pub async fn run(&self) -> error::Result<ReconciliationReport> {
        let start_time = Instant::now();
        tracing::info!(
            "Starting delivery audit (lookback {} days, message limit {})",
            self.lookback_days,
            self.message_fetch_limit
        );

        // 1. 并发拉取，全部完成后才开始分类
        let (sales, messages, instance) = tokio::join!(
            self.sales.fetch_all_sales(),
            self.messages
                .fetch_sent_messages(self.lookback_days, self.message_fetch_limit),
            self.messages.fetch_instance_status(),
        );

        let sales = sales?;
        tracing::info!("✓ {} sales loaded", sales.len());

        if instance.connected {
            tracing::info!(
                "✓ Provider instance connected ({})",
                instance.state.as_deref().unwrap_or("unknown")
            );
        } else {
            tracing::warn!(
                "Provider instance not connected: {}",
                instance
                    .error
                    .as_deref()
                    .or(instance.state.as_deref())
                    .unwrap_or("unknown")
            );
        }

        let (messages, message_fetch, messages_available) = match messages {
            Ok(list) => {
                tracing::info!("✓ {} sent messages fetched", list.len());
                let status = MessageFetchStatus {
                    count: list.len(),
                    error: None,
                };
                (list, status, true)
            }
            Err(e) => {
                tracing::warn!("✗ Sent message fetch failed, negative matches are unreliable: {}", e);
                let status = MessageFetchStatus {
                    count: 0,
                    error: Some(e.to_string()),
                };
                (Vec::new(), status, false)
            }
        };

        // 2. 构建索引
        let index = MessageIndex::build(messages);
        tracing::debug!(
            "Message index: {} phone keys, {} messages",
            index.key_count(),
            index.message_count()
        );

        // 3. 分类
        let classifier = Classifier::new(Arc::clone(&self.matcher), self.lookback_days);
        let classified = classifier.classify_all(&sales, &index);

        // 4. 汇总
        let context = RunContext {
            generated_at: Utc::now(),
            config: RunConfig {
                lookback_days: self.lookback_days,
                message_fetch_limit: self.message_fetch_limit,
                provider_instance: self.messages.instance_name(),
            },
            provider_instance: instance,
            messages_available,
            message_fetch,
        };
        let report = assemble(context, sales.len(), classified);

        tracing::info!(
            "Audit finished in {:?}: A={} B={} C={} D={} E={}",
            start_time.elapsed(),
            report.summary.wa_sent_but_unconfirmed,
            report.summary.firestore_confirmed_but_unverified,
            report.summary.confirmed_both,
            report.summary.genuinely_pending_or_error,
            report.summary.anomalous
        );

        Ok(report)
    }
}
