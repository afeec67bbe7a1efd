use std::sync::Arc;

use crate::config::PhoneMatching;

/// 去掉所有非数字字符
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 电话号码比对策略，可替换为更严格或按国家区分的实现
pub trait PhoneMatcher: Send + Sync {
    /// 两个号码是否视为同一号码
    fn same_number(&self, a: &str, b: &str) -> bool;

    /// 为 true 时只有完全相同的数字串才会匹配，索引可直接按键查找
    fn exact_only(&self) -> bool {
        false
    }
}

/// 后缀容忍匹配: 兼容一方带国家码 (如巴西 55) 而另一方不带的历史数据。
/// 短号码可能误匹配，不做额外消歧。
#[derive(Debug, Clone, Copy, Default)]
pub struct SuffixMatcher;

impl PhoneMatcher for SuffixMatcher {
    fn same_number(&self, a: &str, b: &str) -> bool {
        let da = digits_only(a);
        let db = digits_only(b);
        if da.is_empty() || db.is_empty() {
            return false;
        }
        da == db || da.ends_with(&db) || db.ends_with(&da)
    }
}

/// 严格匹配: 数字完全相同
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl PhoneMatcher for ExactMatcher {
    fn same_number(&self, a: &str, b: &str) -> bool {
        let da = digits_only(a);
        !da.is_empty() && da == digits_only(b)
    }

    fn exact_only(&self) -> bool {
        true
    }
}

/// 根据配置构造比对策略
pub fn matcher_for(strategy: PhoneMatching) -> Arc<dyn PhoneMatcher> {
    match strategy {
        PhoneMatching::Suffix => Arc::new(SuffixMatcher),
        PhoneMatching::Exact => Arc::new(ExactMatcher),
    }
}
