use serde::Serialize;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::Path;

use crate::error;
use crate::models::{Category, ClassifiedRecord, PhoneCheckReport, ReconciliationReport};

const RULE: &str = "══════════════════════════════════════════════════════════";
const THIN_RULE: &str = "──────────────────────────────────────────────────────────";
/// 控制台每个问题分类最多展示的样例数
const CONSOLE_EXAMPLES: usize = 5;

/// 以格式化 JSON 写入文件，必要时创建父目录
pub fn write_json<T: Serialize>(value: &T, output_path: &Path) -> error::Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(output_path, json)?;
    Ok(())
}

/// 导出全部分类记录到 CSV
pub fn export_to_csv(report: &ReconciliationReport, output_path: &Path) -> error::Result<()> {
    use csv::Writer;

    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "category",
        "sale_id",
        "customer_name",
        "customer_phone",
        "delivery_status",
        "attempt_count",
        "latest_message_at",
        "latest_message_status",
        "diagnostic",
    ])?;

    for record in report.all_records() {
        let latest = record.messages.first();
        writer.write_record([
            record.category.as_str().to_string(),
            record.sale.sale_id.clone(),
            record.sale.customer_name.clone().unwrap_or_default(),
            record.sale.customer_phone.clone().unwrap_or_default(),
            record.sale.delivery_status.as_str().to_string(),
            record.sale.attempt_count.to_string(),
            latest
                .and_then(|m| m.sent_at)
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            latest.map(|m| m.status.clone()).unwrap_or_default(),
            record.diagnostic.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn example_line(out: &mut String, record: &ClassifiedRecord) {
    let _ = writeln!(
        out,
        "         • [{}] {} ({})",
        record.sale.sale_id,
        record.sale.customer_name.as_deref().unwrap_or("(no customer)"),
        record.sale.customer_phone.as_deref().unwrap_or("no phone"),
    );
    if let Some(msg) = record.messages.first() {
        let sent_at = msg
            .sent_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown time".to_string());
        let _ = writeln!(out, "           Provider message at {} ({})", sent_at, msg.status);
    }
}

fn examples(out: &mut String, records: &[ClassifiedRecord]) {
    for record in records.iter().take(CONSOLE_EXAMPLES) {
        example_line(out, record);
    }
    if records.len() > CONSOLE_EXAMPLES {
        let _ = writeln!(out, "         ... and {} more in the report file", records.len() - CONSOLE_EXAMPLES);
    }
}

/// 控制台摘要
pub fn render_summary(report: &ReconciliationReport, report_path: &Path) -> String {
    let mut out = String::new();
    let summary = &report.summary;
    let days = report.config.lookback_days;

    let _ = writeln!(out, "\n{}", RULE);
    let _ = writeln!(out, "               WHATSAPP DELIVERY AUDIT");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  Total sales          : {}", summary.total_sales);
    let _ = writeln!(out, "  Messages in window   : {} (last {} days)", report.message_fetch.count, days);
    let _ = writeln!(out, "{}", THIN_RULE);

    let a = summary.count(Category::WaSentButUnconfirmed);
    let _ = writeln!(out, "  🔴 [A] Sent on WhatsApp, sale still 'pending' : {}", a);
    if a > 0 {
        let _ = writeln!(out, "      → PROBLEM: the automation will send these messages again!");
        let _ = writeln!(out, "      → ACTION: set these sales to 'sent' manually");
        examples(&mut out, report.records(Category::WaSentButUnconfirmed));
    }

    let b = summary.count(Category::FirestoreConfirmedButUnverified);
    let _ = writeln!(out, "\n  🟡 [B] Sale 'sent', no WhatsApp message      : {}", b);
    if b > 0 {
        let _ = writeln!(out, "      → Message may be older than {} days, or the status is inconsistent", days);
        examples(&mut out, report.records(Category::FirestoreConfirmedButUnverified));
    }

    let _ = writeln!(
        out,
        "\n  ✅ [C] Confirmed on both sides               : {}",
        summary.count(Category::ConfirmedBoth)
    );
    let _ = writeln!(
        out,
        "\n  ⏳ [D] Genuinely pending / error             : {}",
        summary.count(Category::GenuinelyPendingOrError)
    );

    let e = summary.count(Category::Anomalous);
    let _ = writeln!(out, "\n  ⚠️  [E] Anomalous (error/duplicate status)    : {}", e);
    if e > 0 {
        examples(&mut out, report.records(Category::Anomalous));
    }

    let _ = writeln!(out, "{}", RULE);

    if !report.messages_available {
        let _ = writeln!(out, "\n⚠️  WARNING: sent messages could not be fetched from the provider.");
        if let Some(err) = &report.message_fetch.error {
            let _ = writeln!(out, "   Reason: {}", err);
        }
        let _ = writeln!(out, "   Configure EVOLUTION_API_URL, EVOLUTION_API_KEY and EVOLUTION_INSTANCE_NAME.");
        let _ = writeln!(out, "   Without messages, [A] and [C] cannot be detected and [B]/[D] are unverified.");
    }

    let _ = writeln!(out, "\n📄 Report saved to: {}", report_path.display());
    out
}

/// 电话格式检查的控制台摘要
pub fn render_phone_summary(report: &PhoneCheckReport, report_path: &Path) -> String {
    let mut out = String::new();
    let s = &report.summary;

    let _ = writeln!(out, "\n{}", RULE);
    let _ = writeln!(out, "                 PHONE FORMAT CHECK");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  Total customers  : {}", s.total);
    let _ = writeln!(out, "  ✅ Valid (E.164) : {}", s.valid);
    let _ = writeln!(out, "  ❌ Invalid       : {}", s.invalid);
    let _ = writeln!(out, "  ⚠️  Missing       : {}", s.missing);
    let _ = writeln!(out, "{}", RULE);

    if report.issues.is_empty() {
        let _ = writeln!(out, "\n✅ All phone numbers are valid E.164!");
    } else {
        let _ = writeln!(out, "\n📋 Customers with an invalid or missing phone:");
        for issue in &report.issues {
            let _ = writeln!(out, "  • [{}] {}", issue.customer_id, issue.name);
            let _ = writeln!(out, "      Current: {}", issue.current_phone.as_deref().unwrap_or("(empty)"));
            let _ = writeln!(out, "      Reason : {}", issue.reason);
        }
    }

    let _ = writeln!(out, "\n📄 Report saved to: {}", report_path.display());
    out
}
