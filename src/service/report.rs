use chrono::{DateTime, Utc};

use crate::models::{
    Category, ClassifiedRecord, InstanceStatus, MessageFetchStatus, ReconciliationReport,
    ReportSummary, RunConfig, REPORT_VERSION,
};

/// 组装报告所需的运行上下文
#[derive(Debug, Clone)]
pub struct RunContext {
    pub generated_at: DateTime<Utc>,
    pub config: RunConfig,
    pub provider_instance: InstanceStatus,
    pub messages_available: bool,
    pub message_fetch: MessageFetchStatus,
}

/// 汇总分类结果，纯计算无副作用
pub fn assemble(
    context: RunContext,
    total_sales: usize,
    classified: Vec<ClassifiedRecord>,
) -> ReconciliationReport {
    let mut summary = ReportSummary {
        total_sales,
        ..ReportSummary::default()
    };

    let mut wa_sent_but_unconfirmed = Vec::new();
    let mut firestore_confirmed_but_unverified = Vec::new();
    let mut confirmed_both = Vec::new();
    let mut genuinely_pending_or_error = Vec::new();
    let mut anomalous = Vec::new();

    for record in classified {
        match record.category {
            Category::WaSentButUnconfirmed => {
                summary.wa_sent_but_unconfirmed += 1;
                wa_sent_but_unconfirmed.push(record);
            }
            Category::FirestoreConfirmedButUnverified => {
                summary.firestore_confirmed_but_unverified += 1;
                firestore_confirmed_but_unverified.push(record);
            }
            Category::ConfirmedBoth => {
                summary.confirmed_both += 1;
                confirmed_both.push(record);
            }
            Category::GenuinelyPendingOrError => {
                summary.genuinely_pending_or_error += 1;
                genuinely_pending_or_error.push(record);
            }
            Category::Anomalous => {
                summary.anomalous += 1;
                anomalous.push(record);
            }
        }
    }

    ReconciliationReport {
        report_version: REPORT_VERSION,
        generated_at: context.generated_at,
        config: context.config,
        provider_instance: context.provider_instance,
        messages_available: context.messages_available,
        message_fetch: context.message_fetch,
        summary,
        wa_sent_but_unconfirmed,
        firestore_confirmed_but_unverified,
        confirmed_both,
        genuinely_pending_or_error,
        anomalous,
    }
}
