use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

/// 文档集合的一行: 文档ID + JSONB 内容
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub data: Json<Value>,
}

/// 销售通知的内部投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Error,
    Duplicate,
}

impl DeliveryStatus {
    /// 文档中的状态值 (pendente/enviado/erro/duplicado)，缺失或无法识别时视为 pending
    pub fn from_document(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("enviado") | Some("sent") => Self::Sent,
            Some("erro") | Some("error") => Self::Error,
            Some("duplicado") | Some("duplicate") => Self::Duplicate,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Error => "error",
            Self::Duplicate => "duplicate",
        }
    }
}

/// 文档时间戳的几种存储形式
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Object {
        #[serde(alias = "_seconds")]
        seconds: i64,
    },
    Number(f64),
    Text(String),
}

impl RawTimestamp {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Object { seconds } => DateTime::from_timestamp(*seconds, 0),
            // 大于 1e10 视为毫秒
            Self::Number(n) if *n > 1e10 => DateTime::from_timestamp_millis(*n as i64),
            Self::Number(n) => DateTime::from_timestamp(*n as i64, 0),
            Self::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    fn from_value(value: &Value) -> Option<DateTime<Utc>> {
        RawTimestamp::deserialize(value).ok()?.to_datetime()
    }
}

/// 文本字段: 数字 (旧数据里的电话/ID) 转成十进制文本
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n
            .as_u64()
            .map(|u| u.to_string())
            .or_else(|| n.as_i64().map(|i| i.to_string()))
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| format!("{:.0}", f))),
        _ => None,
    }
}

/// 次数字段: 整数、整值浮点数或数字字符串
fn count_value(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}

/// 逐字段读取文档，类型不对的字段按缺失处理，不影响其它字段
struct Document<'a> {
    kind: &'static str,
    id: &'a str,
    data: &'a Value,
}

impl<'a> Document<'a> {
    fn new(kind: &'static str, id: &'a str, data: &'a Value) -> Self {
        if !data.is_object() {
            tracing::warn!("{} document {} is not an object, using defaults", kind, id);
        }
        Self { kind, id, data }
    }

    fn field<T>(&self, key: &str, convert: fn(&Value) -> Option<T>) -> Option<T> {
        let value = self.data.get(key).filter(|v| !v.is_null())?;
        let converted = convert(value);
        if converted.is_none() {
            tracing::warn!(
                "{} document {} field {} has unusable value {}, treated as absent",
                self.kind,
                self.id,
                key,
                value
            );
        }
        converted
    }
}

/// 客户记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl CustomerRecord {
    pub fn from_row(row: DocumentRow) -> Self {
        let doc = Document::new("customer", &row.id, &row.data.0);
        let name = doc.field("nome", text_value);
        let phone = doc.field("telefone", text_value);
        Self { id: row.id, name, phone }
    }
}

/// 销售记录 (已关联客户姓名/电话)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_status: DeliveryStatus,
    pub attempt_count: u32,
    pub sale_date: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl SaleRecord {
    /// 解码销售文档并关联客户
    pub fn from_row(row: DocumentRow, customer: Option<&CustomerRecord>) -> Self {
        let doc = Document::new("sale", &row.id, &row.data.0);
        let record = Self {
            id: row.id.clone(),
            customer_id: doc.field("clienteId", text_value),
            customer_name: None,
            customer_phone: None,
            delivery_status: DeliveryStatus::from_document(doc.field("status", text_value).as_deref()),
            attempt_count: doc.field("tentativas", count_value).unwrap_or(0),
            sale_date: doc.field("dataVenda", RawTimestamp::from_value),
            sent_at: doc.field("dataEnvio", RawTimestamp::from_value),
            last_error: doc.field("erroEnvio", text_value),
        };
        record.link_customer(customer)
    }

    /// 填入客户姓名/电话，客户不存在时为空
    pub fn link_customer(mut self, customer: Option<&CustomerRecord>) -> Self {
        self.customer_name = customer.and_then(|c| c.name.clone());
        self.customer_phone = customer.and_then(|c| c.phone.clone());
        self
    }
}
