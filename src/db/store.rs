use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::db::queries;
use crate::error;
use crate::models::{CustomerRecord, DocumentRow, SaleRecord};
use crate::service::SalesSource;

/// 基于 Postgres JSONB 文档集合的记录来源
#[derive(Clone)]
pub struct PgSalesSource {
    pool: PgPool,
}

impl PgSalesSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalesSource for PgSalesSource {
    async fn fetch_all_sales(&self) -> error::Result<Vec<SaleRecord>> {
        // 两个集合并发读取，内存中按 clienteId 关联
        let (sale_rows, customer_rows) = futures::try_join!(
            queries::list_sale_documents(&self.pool),
            queries::list_customer_documents(&self.pool),
        )?;

        let customer_count = customer_rows.len();
        let sales = join_documents(sale_rows, customer_rows);

        let orphaned = sales
            .iter()
            .filter(|s| s.customer_name.is_none() && s.customer_phone.is_none())
            .count();
        tracing::info!(
            "Loaded {} sales ({} customers, {} without a linked customer)",
            sales.len(),
            customer_count,
            orphaned
        );

        Ok(sales)
    }

    async fn fetch_customers(&self) -> error::Result<Vec<CustomerRecord>> {
        let rows = queries::list_customer_documents(&self.pool).await?;
        Ok(rows.into_iter().map(CustomerRecord::from_row).collect())
    }
}

/// 按解码后的 clienteId 关联客户，找不到客户时姓名/电话为空
fn join_documents(sale_rows: Vec<DocumentRow>, customer_rows: Vec<DocumentRow>) -> Vec<SaleRecord> {
    let customers: HashMap<String, CustomerRecord> = customer_rows
        .into_iter()
        .map(CustomerRecord::from_row)
        .map(|c| (c.id.clone(), c))
        .collect();

    sale_rows
        .into_iter()
        .map(|row| {
            let sale = SaleRecord::from_row(row, None);
            let customer = sale.customer_id.as_deref().and_then(|id| customers.get(id));
            sale.link_customer(customer)
        })
        .collect()
}
