pub mod handlers;

pub use handlers::{health_check, router, run_audit};
