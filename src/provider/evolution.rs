use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::models::{InstanceStatus, ProviderStatus, SentMessage};
use crate::service::{digits_only, MessageSource};

/// 请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const WHATSAPP_JID_SUFFIX: &str = "@s.whatsapp.net";
const SECONDS_PER_DAY: i64 = 86_400;

/// Evolution API 客户端 (连通性检查 + 已发送消息查询)
#[derive(Debug, Clone)]
pub struct EvolutionClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl EvolutionClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured)
        }
    }

    /// {base}/{segments...}/{instance}，实例名作为单个路径段编码
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", self.config.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments)
            .push(&self.config.instance_name);
        Ok(url)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }

    /// 查询实例连接状态
    pub async fn connection_state(&self) -> Result<String, ProviderError> {
        self.ensure_configured()?;
        let url = self.endpoint(&["instance", "connectionState"])?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("apikey", &self.config.api_key)
            .send()
            .await?;
        let body = Self::read_json(response).await?;

        let state = body
            .pointer("/instance/state")
            .or_else(|| body.get("state"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        Ok(state.to_string())
    }

    /// 查询回溯窗口内本方发出的消息
    pub async fn find_sent_messages(
        &self,
        lookback_days: u32,
        limit: u32,
    ) -> Result<Vec<SentMessage>, ProviderError> {
        self.ensure_configured()?;
        let url = self.endpoint(&["chat", "findMessages"])?;
        let cutoff = Utc::now().timestamp() - i64::from(lookback_days) * SECONDS_PER_DAY;

        let request_body = json!({
            "where": {
                "key": { "fromMe": true },
                "messageTimestamp": { "gt": cutoff }
            },
            "limit": limit
        });
        tracing::debug!("POST {} (cutoff {}, limit {})", url, cutoff, limit);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .json(&request_body)
            .send()
            .await?;
        let body = Self::read_json(response).await?;

        Ok(decode_messages(&body, cutoff, limit as usize))
    }
}

#[async_trait]
impl MessageSource for EvolutionClient {
    async fn fetch_sent_messages(
        &self,
        lookback_days: u32,
        limit: u32,
    ) -> Result<Vec<SentMessage>, ProviderError> {
        self.find_sent_messages(lookback_days, limit).await
    }

    async fn fetch_instance_status(&self) -> InstanceStatus {
        match self.connection_state().await {
            Ok(state) => InstanceStatus {
                connected: state == "open",
                state: Some(state),
                error: None,
            },
            Err(e) => InstanceStatus {
                connected: false,
                state: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn instance_name(&self) -> String {
        if self.config.instance_name.is_empty() {
            "(not configured)".to_string()
        } else {
            self.config.instance_name.clone()
        }
    }
}

/// 从响应中取出消息列表: 顶层数组、messages (数组或 {records})、data
fn message_list(body: &Value) -> &[Value] {
    let candidates = [
        Some(body),
        body.get("messages"),
        body.pointer("/messages/records"),
        body.get("data"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn first_str<'a>(msg: &'a Value, pointers: &[&str]) -> Option<&'a str> {
    pointers
        .iter()
        .find_map(|p| msg.pointer(p).and_then(Value::as_str).filter(|s| !s.is_empty()))
}

/// 数字或数字字符串
fn as_epoch(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn status_code(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok().or_else(|| ProviderStatus::code_from_name(s)),
        _ => None,
    }
}

/// 宽松解码单条消息，字段缺失时降级为空值
fn decode_message(msg: &Value) -> SentMessage {
    let jid = first_str(msg, &["/key/remoteJid", "/remoteJid"]).unwrap_or("");
    let sent_at_epoch = ["/messageTimestamp", "/timestamp"]
        .iter()
        .find_map(|p| msg.pointer(p).and_then(as_epoch));
    let excerpt = first_str(
        msg,
        &[
            "/message/conversation",
            "/message/extendedTextMessage/text",
            "/message/imageMessage/caption",
        ],
    )
    .unwrap_or("(no text)");

    SentMessage {
        id: first_str(msg, &["/key/id", "/id"]).map(str::to_string),
        recipient_phone: digits_only(jid.trim_end_matches(WHATSAPP_JID_SUFFIX)),
        provider_status_code: status_code(msg.get("status")),
        sent_at_epoch,
        excerpt: excerpt.to_string(),
    }
}

/// 解码消息列表: 丢弃非本方发出的消息和窗口外的消息，最多保留 limit 条
pub fn decode_messages(body: &Value, cutoff: i64, limit: usize) -> Vec<SentMessage> {
    message_list(body)
        .iter()
        .filter(|m| m.pointer("/key/fromMe").and_then(Value::as_bool) != Some(false))
        .map(decode_message)
        .filter(|m| m.sent_at_epoch.map_or(true, |ts| ts > cutoff))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> EvolutionClient {
        EvolutionClient::new(ProviderConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            instance_name: "store".to_string(),
        })
        .unwrap()
    }

    fn wa_message(id: &str, jid: &str, ts: i64, status: Value, from_me: bool) -> Value {
        json!({
            "key": { "id": id, "remoteJid": jid, "fromMe": from_me },
            "status": status,
            "messageTimestamp": ts,
            "message": { "conversation": format!("Hello {}", id) }
        })
    }

    #[test]
    fn decodes_all_list_shapes() {
        let msg = wa_message("m1", "5553994242183@s.whatsapp.net", 200, json!(2), true);
        for body in [
            json!([msg.clone()]),
            json!({ "messages": [msg.clone()] }),
            json!({ "messages": { "total": 1, "records": [msg.clone()] } }),
            json!({ "data": [msg.clone()] }),
        ] {
            let decoded = decode_messages(&body, 100, 10);
            assert_eq!(decoded.len(), 1, "{}", body);
            assert_eq!(decoded[0].recipient_phone, "5553994242183");
            assert_eq!(decoded[0].provider_status_code, Some(2));
            assert_eq!(decoded[0].excerpt, "Hello m1");
        }
        assert!(decode_messages(&json!({ "unexpected": true }), 0, 10).is_empty());
    }

    #[test]
    fn filters_inbound_old_and_excess_messages() {
        let body = json!([
            wa_message("m1", "5553994242183@s.whatsapp.net", 200, json!(3), true),
            wa_message("m2", "5553994242183@s.whatsapp.net", 300, json!(3), false),
            wa_message("m3", "5553994242183@s.whatsapp.net", 50, json!(3), true),
            wa_message("m4", "5551999999999@s.whatsapp.net", 400, json!("DELIVERY_ACK"), true),
            wa_message("m5", "5551999999999@s.whatsapp.net", 500, json!(4), true),
        ]);
        let decoded = decode_messages(&body, 100, 2);
        let ids: Vec<_> = decoded.iter().map(|m| m.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["m1", "m4"]);
        assert_eq!(decoded[1].provider_status_code, Some(3));
    }

    #[test]
    fn tolerates_sparse_entries() {
        let body = json!([{ "remoteJid": "5553994242183@s.whatsapp.net", "timestamp": "250" }]);
        let decoded = decode_messages(&body, 100, 10);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, None);
        assert_eq!(decoded[0].sent_at_epoch, Some(250));
        assert_eq!(decoded[0].provider_status_code, None);
        assert_eq!(decoded[0].excerpt, "(no text)");
    }

    #[tokio::test]
    async fn fetches_sent_messages_with_api_key() {
        let server = MockServer::start().await;
        let now = Utc::now().timestamp();

        Mock::given(method("POST"))
            .and(path("/chat/findMessages/store"))
            .and(header("apikey", "test-key"))
            .and(body_partial_json(json!({ "where": { "key": { "fromMe": true } }, "limit": 500 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": {
                    "records": [wa_message("m1", "5553994242183@s.whatsapp.net", now - 60, json!(2), true)]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = test_client(&server.uri()).fetch_sent_messages(30, 500).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id.as_deref(), Some("m1"));
    }

    #[tokio::test]
    async fn message_fetch_reports_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/findMessages/store"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).fetch_sent_messages(30, 500).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn instance_status_reads_nested_or_flat_state() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/instance/connectionState/store"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instance": { "instanceName": "store", "state": "open" }
            })))
            .mount(&server)
            .await;

        let status = test_client(&server.uri()).fetch_instance_status().await;
        assert!(status.connected);
        assert_eq!(status.state.as_deref(), Some("open"));

        let flat = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/connectionState/store"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "close" })))
            .mount(&flat)
            .await;

        let status = test_client(&flat.uri()).fetch_instance_status().await;
        assert!(!status.connected);
        assert_eq!(status.state.as_deref(), Some("close"));
    }

    #[tokio::test]
    async fn unconfigured_client_degrades_without_requests() {
        let client = EvolutionClient::new(ProviderConfig::default()).unwrap();

        let err = client.fetch_sent_messages(30, 500).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));

        let status = client.fetch_instance_status().await;
        assert!(!status.connected);
        assert!(status.error.is_some());
        assert_eq!(client.instance_name(), "(not configured)");
    }

    #[test]
    fn instance_name_is_encoded_as_one_segment() {
        let client = EvolutionClient::new(ProviderConfig {
            base_url: "https://evo.example.com/api".to_string(),
            api_key: "k".to_string(),
            instance_name: "Store Main/1".to_string(),
        })
        .unwrap();
        let url = client.endpoint(&["chat", "findMessages"]).unwrap();
        assert_eq!(url.as_str(), "https://evo.example.com/api/chat/findMessages/Store%20Main%2F1");
    }
}
