pub mod auditor;
pub mod classifier;
pub mod index;
pub mod phone;
pub mod phone_check;
pub mod report;
pub mod source;

pub use auditor::DeliveryAuditor;
pub use classifier::Classifier;
pub use index::MessageIndex;
pub use phone::{digits_only, matcher_for, ExactMatcher, PhoneMatcher, SuffixMatcher};
pub use phone_check::{audit_phones, check_phone, is_e164};
pub use report::{assemble, RunContext};
pub use source::{MessageSource, SalesSource};
