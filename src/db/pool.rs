use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

const APPLICATION_NAME: &str = "delivery-audit";

/// 对账只读: 会话默认只读事务，并带上应用名方便在 pg_stat_activity 中识别
fn connect_options(database_url: &str) -> Result<PgConnectOptions, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?
        .application_name(APPLICATION_NAME)
        .options([("default_transaction_read_only", "on")])
        // 慢查询日志阈值 5秒
        .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5));
    Ok(options)
}

/// 创建记录库连接池 (批处理只需少量连接)
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options(database_url)?)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_are_read_only_and_named() {
        let options = connect_options("postgres://audit@localhost:5432/store").unwrap();
        assert_eq!(options.get_application_name(), Some(APPLICATION_NAME));
        assert!(options
            .get_options()
            .unwrap()
            .contains("default_transaction_read_only=on"));
        assert_eq!(options.get_database(), Some("store"));
    }

    #[test]
    fn rejects_malformed_url() {
        assert!(connect_options("not a url").is_err());
    }
}
