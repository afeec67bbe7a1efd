use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个电话号码的格式检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneCheck {
    Valid,
    Missing,
    Invalid(String),
}

/// 有问题的客户电话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneIssue {
    pub customer_id: String,
    pub name: String,
    pub current_phone: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneCheckSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub missing: usize,
}

/// 客户电话格式报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneCheckReport {
    pub generated_at: DateTime<Utc>,
    pub summary: PhoneCheckSummary,
    pub issues: Vec<PhoneIssue>,
}
