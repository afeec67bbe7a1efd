use chrono::{DateTime, Utc};

use crate::models::{CustomerRecord, PhoneCheck, PhoneCheckReport, PhoneCheckSummary, PhoneIssue};

const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 15;

/// E.164: "+" 后接 8 到 15 位数字，无其他字符
pub fn is_e164(phone: &str) -> bool {
    let Some(rest) = phone.strip_prefix('+') else {
        return false;
    };
    (MIN_DIGITS..=MAX_DIGITS).contains(&rest.len()) && rest.chars().all(|c| c.is_ascii_digit())
}

/// 检查单个电话号码并给出原因
pub fn check_phone(phone: Option<&str>) -> PhoneCheck {
    let phone = match phone {
        Some(p) if !p.trim().is_empty() => p,
        _ => return PhoneCheck::Missing,
    };

    if is_e164(phone) {
        return PhoneCheck::Valid;
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let reason = if !phone.starts_with('+') {
        if digits == 0 {
            "no digits".to_string()
        } else if digits < MIN_DIGITS {
            format!("too few digits ({} digits, no + prefix)", digits)
        } else {
            "not E.164 (missing + prefix)".to_string()
        }
    } else if digits < MIN_DIGITS {
        format!("too few digits ({} digits)", digits)
    } else if digits > MAX_DIGITS {
        format!("too many digits ({} digits, max {})", digits, MAX_DIGITS)
    } else {
        "invalid format".to_string()
    };

    PhoneCheck::Invalid(reason)
}

/// 检查所有客户电话
pub fn audit_phones(customers: &[CustomerRecord], generated_at: DateTime<Utc>) -> PhoneCheckReport {
    let mut summary = PhoneCheckSummary {
        total: customers.len(),
        ..PhoneCheckSummary::default()
    };
    let mut issues = Vec::new();

    for customer in customers {
        let reason = match check_phone(customer.phone.as_deref()) {
            PhoneCheck::Valid => {
                summary.valid += 1;
                continue;
            }
            PhoneCheck::Missing => {
                summary.missing += 1;
                "missing".to_string()
            }
            PhoneCheck::Invalid(reason) => {
                summary.invalid += 1;
                reason
            }
        };

        issues.push(PhoneIssue {
            customer_id: customer.id.clone(),
            name: customer.name.clone().unwrap_or_else(|| "(no name)".to_string()),
            current_phone: customer.phone.clone(),
            reason,
        });
    }

    PhoneCheckReport {
        generated_at,
        summary,
        issues,
    }
}
