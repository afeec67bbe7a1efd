use serde::{Deserialize, Serialize};

/// 消息服务的投递状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Error,
    Queued,
    ReachedServer,
    DeliveredToDevice,
    Read,
    Played,
}

impl ProviderStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Error),
            1 => Some(Self::Queued),
            2 => Some(Self::ReachedServer),
            3 => Some(Self::DeliveredToDevice),
            4 => Some(Self::Read),
            5 => Some(Self::Played),
            _ => None,
        }
    }

    /// Evolution API 的字符串状态 (ERROR, PENDING, SERVER_ACK ...)
    pub fn code_from_name(name: &str) -> Option<i64> {
        match name.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Some(0),
            "PENDING" => Some(1),
            "SERVER_ACK" => Some(2),
            "DELIVERY_ACK" => Some(3),
            "READ" => Some(4),
            "PLAYED" => Some(5),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Queued => "QUEUED",
            Self::ReachedServer => "REACHED_SERVER",
            Self::DeliveredToDevice => "DELIVERED_TO_DEVICE",
            Self::Read => "READ",
            Self::Played => "PLAYED",
        }
    }
}

/// 状态码的展示标签，未知码显示为 UNKNOWN(n)
pub fn status_label(code: Option<i64>) -> String {
    match code {
        Some(c) => ProviderStatus::from_code(c)
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| format!("UNKNOWN({})", c)),
        None => "UNKNOWN".to_string(),
    }
}

/// 消息服务记录的一条已发送消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub id: Option<String>,
    /// 仅数字，通常带国家码，无 "+"
    pub recipient_phone: String,
    pub provider_status_code: Option<i64>,
    pub sent_at_epoch: Option<i64>,
    pub excerpt: String,
}
