use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sale::{DeliveryStatus, SaleRecord};

/// 报告结构版本
pub const REPORT_VERSION: u32 = 1;

/// 对账分类 (五类互斥)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 消息服务已发送，内部状态仍为 pending
    WaSentButUnconfirmed,
    /// 内部状态为 sent，回溯窗口内无对应消息
    FirestoreConfirmedButUnverified,
    ConfirmedBoth,
    GenuinelyPendingOrError,
    /// error/duplicate 与消息记录的其余组合
    Anomalous,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::WaSentButUnconfirmed,
        Category::FirestoreConfirmedButUnverified,
        Category::ConfirmedBoth,
        Category::GenuinelyPendingOrError,
        Category::Anomalous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaSentButUnconfirmed => "wa_sent_but_unconfirmed",
            Self::FirestoreConfirmedButUnverified => "firestore_confirmed_but_unverified",
            Self::ConfirmedBoth => "confirmed_both",
            Self::GenuinelyPendingOrError => "genuinely_pending_or_error",
            Self::Anomalous => "anomalous",
        }
    }
}

/// 销售摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    pub sale_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_status: DeliveryStatus,
    pub attempt_count: u32,
    pub sale_date: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl From<&SaleRecord> for SaleSummary {
    fn from(sale: &SaleRecord) -> Self {
        Self {
            sale_id: sale.id.clone(),
            customer_name: sale.customer_name.clone(),
            customer_phone: sale.customer_phone.clone(),
            delivery_status: sale.delivery_status,
            attempt_count: sale.attempt_count,
            sale_date: sale.sale_date,
            sent_at: sale.sent_at,
            last_error: sale.last_error.clone(),
        }
    }
}

/// 匹配到的消息摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub id: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub status: String,
    pub excerpt: String,
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub sale: SaleSummary,
    pub category: Category,
    /// 最多 3 条，最新在前
    pub messages: Vec<MessageSummary>,
    pub diagnostic: String,
}

/// 本次运行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    pub lookback_days: u32,
    pub message_fetch_limit: u32,
    pub provider_instance: String,
}

/// 消息服务实例连通性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStatus {
    pub connected: bool,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// 消息拉取结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFetchStatus {
    pub count: usize,
    pub error: Option<String>,
}

/// 各分类计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_sales: usize,
    pub wa_sent_but_unconfirmed: usize,
    pub firestore_confirmed_but_unverified: usize,
    pub confirmed_both: usize,
    pub genuinely_pending_or_error: usize,
    pub anomalous: usize,
}

impl ReportSummary {
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::WaSentButUnconfirmed => self.wa_sent_but_unconfirmed,
            Category::FirestoreConfirmedButUnverified => self.firestore_confirmed_but_unverified,
            Category::ConfirmedBoth => self.confirmed_both,
            Category::GenuinelyPendingOrError => self.genuinely_pending_or_error,
            Category::Anomalous => self.anomalous,
        }
    }

    pub fn classified(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }
}

/// 对账报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub report_version: u32,
    pub generated_at: DateTime<Utc>,
    pub config: RunConfig,
    pub provider_instance: InstanceStatus,
    /// false 时负向匹配分类不可信
    pub messages_available: bool,
    pub message_fetch: MessageFetchStatus,
    pub summary: ReportSummary,
    pub wa_sent_but_unconfirmed: Vec<ClassifiedRecord>,
    pub firestore_confirmed_but_unverified: Vec<ClassifiedRecord>,
    pub confirmed_both: Vec<ClassifiedRecord>,
    pub genuinely_pending_or_error: Vec<ClassifiedRecord>,
    pub anomalous: Vec<ClassifiedRecord>,
}

impl ReconciliationReport {
    pub fn records(&self, category: Category) -> &[ClassifiedRecord] {
        match category {
            Category::WaSentButUnconfirmed => &self.wa_sent_but_unconfirmed,
            Category::FirestoreConfirmedButUnverified => &self.firestore_confirmed_but_unverified,
            Category::ConfirmedBoth => &self.confirmed_both,
            Category::GenuinelyPendingOrError => &self.genuinely_pending_or_error,
            Category::Anomalous => &self.anomalous,
        }
    }

    /// 按分类顺序遍历全部记录
    pub fn all_records(&self) -> impl Iterator<Item = &ClassifiedRecord> {
        Category::ALL.into_iter().flat_map(move |c| self.records(c).iter())
    }
}
