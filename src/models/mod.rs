pub mod message;
pub mod phone_check;
pub mod report;
pub mod sale;

pub use message::{status_label, ProviderStatus, SentMessage};
pub use phone_check::{PhoneCheck, PhoneCheckReport, PhoneCheckSummary, PhoneIssue};
pub use report::{
    Category, ClassifiedRecord, InstanceStatus, MessageFetchStatus, MessageSummary,
    ReconciliationReport, ReportSummary, RunConfig, SaleSummary, REPORT_VERSION,
};
pub use sale::{CustomerRecord, DeliveryStatus, DocumentRow, SaleRecord};
