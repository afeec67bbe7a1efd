#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use delivery_audit::models::{CustomerRecord, DeliveryStatus, InstanceStatus, SaleRecord, SentMessage};
use delivery_audit::service::{DeliveryAuditor, MessageSource, SalesSource, SuffixMatcher};
use delivery_audit::{AuditError, ProviderError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 内存中的销售来源
pub struct FakeSales {
    pub sales: Vec<SaleRecord>,
    pub fail: bool,
}

#[async_trait]
impl SalesSource for FakeSales {
    async fn fetch_all_sales(&self) -> Result<Vec<SaleRecord>, AuditError> {
        if self.fail {
            return Err(AuditError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.sales.clone())
    }

    async fn fetch_customers(&self) -> Result<Vec<CustomerRecord>, AuditError> {
        Ok(Vec::new())
    }
}

/// 内存中的消息来源，messages 为 None 时模拟拉取失败
pub struct FakeMessages {
    pub messages: Option<Vec<SentMessage>>,
    pub calls: AtomicUsize,
}

impl FakeMessages {
    pub fn ok(messages: Vec<SentMessage>) -> Self {
        Self {
            messages: Some(messages),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            messages: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MessageSource for FakeMessages {
    async fn fetch_sent_messages(
        &self,
        _lookback_days: u32,
        limit: u32,
    ) -> Result<Vec<SentMessage>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.messages {
            Some(list) => Ok(list.iter().take(limit as usize).cloned().collect()),
            None => Err(ProviderError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }

    async fn fetch_instance_status(&self) -> InstanceStatus {
        match &self.messages {
            Some(_) => InstanceStatus {
                connected: true,
                state: Some("open".to_string()),
                error: None,
            },
            None => InstanceStatus {
                connected: false,
                state: None,
                error: Some("HTTP 503".to_string()),
            },
        }
    }

    fn instance_name(&self) -> String {
        "test-store".to_string()
    }
}

pub fn sale(id: &str, status: DeliveryStatus, phone: &str) -> SaleRecord {
    SaleRecord {
        id: id.to_string(),
        customer_id: Some(format!("c-{}", id)),
        customer_name: Some(format!("Customer {}", id)),
        customer_phone: Some(phone.to_string()),
        delivery_status: status,
        attempt_count: 1,
        sale_date: None,
        sent_at: None,
        last_error: None,
    }
}

pub fn message(id: &str, phone: &str, status: i64, seconds_ago: i64) -> SentMessage {
    SentMessage {
        id: Some(id.to_string()),
        recipient_phone: phone.to_string(),
        provider_status_code: Some(status),
        sent_at_epoch: Some(Utc::now().timestamp() - seconds_ago),
        excerpt: format!("Thanks for your purchase ({})", id),
    }
}

pub fn auditor(sales: FakeSales, messages: FakeMessages) -> DeliveryAuditor<FakeSales, FakeMessages> {
    DeliveryAuditor::new(sales, messages, 30, 500, Arc::new(SuffixMatcher))
}
