use async_trait::async_trait;

use crate::error::{AuditError, ProviderError};
use crate::models::{CustomerRecord, InstanceStatus, SaleRecord, SentMessage};

/// 销售/客户记录来源
#[async_trait]
pub trait SalesSource: Send + Sync {
    /// 全部销售记录，已关联客户姓名与电话
    async fn fetch_all_sales(&self) -> Result<Vec<SaleRecord>, AuditError>;

    async fn fetch_customers(&self) -> Result<Vec<CustomerRecord>, AuditError>;
}

/// 已发送消息来源
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// 回溯窗口内本方发出的消息，最多 limit 条
    async fn fetch_sent_messages(
        &self,
        lookback_days: u32,
        limit: u32,
    ) -> Result<Vec<SentMessage>, ProviderError>;

    /// 实例连通性，仅用于报告展示
    async fn fetch_instance_status(&self) -> InstanceStatus;

    /// 报告中显示的实例名
    fn instance_name(&self) -> String;
}
