mod support;

use delivery_audit::models::{Category, DeliveryStatus};
use delivery_audit::AuditError;
use support::{auditor, message, sale, FakeMessages, FakeSales};

fn mixed_sales() -> Vec<delivery_audit::models::SaleRecord> {
    vec![
        sale("v1", DeliveryStatus::Pending, "+5553994242183"),
        sale("v2", DeliveryStatus::Sent, "+5599988887777"),
        sale("v3", DeliveryStatus::Sent, "51988776655"),
        sale("v4", DeliveryStatus::Pending, "+5521911112222"),
        sale("v5", DeliveryStatus::Error, "+5521933334444"),
        sale("v6", DeliveryStatus::Duplicate, "+5553994242183"),
        sale("v7", DeliveryStatus::Pending, ""),
    ]
}

fn mixed_messages() -> Vec<delivery_audit::models::SentMessage> {
    vec![
        message("m1", "5553994242183", 2, 3_600),
        message("m2", "5551988776655", 4, 7_200),
        message("m3", "5511900000000", 3, 60),
    ]
}

#[tokio::test]
async fn pending_sale_with_provider_message_is_unconfirmed() {
    let auditor = auditor(
        FakeSales {
            sales: vec![sale("v1", DeliveryStatus::Pending, "+5553994242183")],
            fail: false,
        },
        FakeMessages::ok(vec![message("m1", "5553994242183", 2, 3_600)]),
    );

    let report = auditor.run().await.unwrap();

    assert_eq!(report.summary.wa_sent_but_unconfirmed, 1);
    let record = &report.wa_sent_but_unconfirmed[0];
    assert_eq!(record.category, Category::WaSentButUnconfirmed);
    assert_eq!(record.messages.len(), 1);
    assert_eq!(record.messages[0].status, "REACHED_SERVER");
}

#[tokio::test]
async fn sent_sale_without_message_is_unverified() {
    let auditor = auditor(
        FakeSales {
            sales: vec![sale("v2", DeliveryStatus::Sent, "+5599988887777")],
            fail: false,
        },
        FakeMessages::ok(vec![message("m1", "5553994242183", 2, 3_600)]),
    );

    let report = auditor.run().await.unwrap();

    assert_eq!(report.summary.firestore_confirmed_but_unverified, 1);
    assert!(report.firestore_confirmed_but_unverified[0].messages.is_empty());
}

#[tokio::test]
async fn every_sale_lands_in_exactly_one_bucket() {
    let sales = mixed_sales();
    let auditor = auditor(
        FakeSales { sales: sales.clone(), fail: false },
        FakeMessages::ok(mixed_messages()),
    );

    let report = auditor.run().await.unwrap();

    assert_eq!(report.summary.total_sales, sales.len());
    assert_eq!(report.summary.classified(), sales.len());

    let mut ids: Vec<&str> = report.all_records().map(|r| r.sale.sale_id.as_str()).collect();
    ids.sort_unstable();
    let mut expected: Vec<&str> = sales.iter().map(|s| s.id.as_str()).collect();
    expected.sort_unstable();
    assert_eq!(ids, expected);

    // pending/sent 只落在原有四类中
    let original_four = report.summary.wa_sent_but_unconfirmed
        + report.summary.firestore_confirmed_but_unverified
        + report.summary.confirmed_both
        + report.summary.genuinely_pending_or_error;
    let pending_or_sent = sales
        .iter()
        .filter(|s| matches!(s.delivery_status, DeliveryStatus::Pending | DeliveryStatus::Sent))
        .count();
    let error_without_match = 1;
    assert_eq!(original_four, pending_or_sent + error_without_match);

    assert_eq!(report.summary.wa_sent_but_unconfirmed, 1);
    assert_eq!(report.summary.firestore_confirmed_but_unverified, 1);
    assert_eq!(report.summary.confirmed_both, 1);
    assert_eq!(report.summary.genuinely_pending_or_error, 3);
    assert_eq!(report.summary.anomalous, 1);
}

#[tokio::test]
async fn failed_message_fetch_degrades_instead_of_aborting() {
    let sales = mixed_sales();
    let auditor = auditor(
        FakeSales { sales: sales.clone(), fail: false },
        FakeMessages::failing(),
    );

    let report = auditor.run().await.unwrap();

    assert!(!report.messages_available);
    assert!(report.message_fetch.error.as_deref().unwrap().contains("503"));
    assert!(!report.provider_instance.connected);
    assert_eq!(report.summary.wa_sent_but_unconfirmed, 0);
    assert_eq!(report.summary.confirmed_both, 0);
    for record in report.all_records() {
        if record.sale.delivery_status == DeliveryStatus::Pending {
            assert_eq!(record.category, Category::GenuinelyPendingOrError);
        }
    }
}

#[tokio::test]
async fn failed_sales_fetch_is_fatal() {
    let auditor = auditor(
        FakeSales { sales: vec![], fail: true },
        FakeMessages::ok(mixed_messages()),
    );

    let err = auditor.run().await.unwrap_err();
    assert!(matches!(err, AuditError::Database(_)));
}

#[tokio::test]
async fn empty_phone_never_matches() {
    let auditor = auditor(
        FakeSales {
            sales: vec![sale("v7", DeliveryStatus::Pending, "")],
            fail: false,
        },
        FakeMessages::ok(mixed_messages()),
    );

    let report = auditor.run().await.unwrap();
    assert_eq!(report.summary.genuinely_pending_or_error, 1);
    assert!(report.genuinely_pending_or_error[0].messages.is_empty());
}

#[tokio::test]
async fn repeated_runs_produce_identical_results() {
    let auditor = auditor(
        FakeSales { sales: mixed_sales(), fail: false },
        FakeMessages::ok(mixed_messages()),
    );

    let first = auditor.run().await.unwrap();
    let second = auditor.run().await.unwrap();

    assert_eq!(first.summary, second.summary);
    let mut a = serde_json::to_value(&first).unwrap();
    let mut b = serde_json::to_value(&second).unwrap();
    a["generatedAt"] = serde_json::Value::Null;
    b["generatedAt"] = serde_json::Value::Null;
    assert_eq!(a, b);
}

#[tokio::test]
async fn report_records_run_configuration() {
    let messages = FakeMessages::ok(mixed_messages());
    let auditor = auditor(FakeSales { sales: mixed_sales(), fail: false }, messages);

    let report = auditor.run().await.unwrap();

    assert_eq!(report.config.lookback_days, 30);
    assert_eq!(report.config.message_fetch_limit, 500);
    assert_eq!(report.config.provider_instance, "test-store");
    assert_eq!(report.message_fetch.count, 3);
    assert!(report.provider_instance.connected);
}
