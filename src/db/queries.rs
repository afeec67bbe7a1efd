use crate::models::DocumentRow;
use sqlx::PgPool;

/// 查询全部销售文档
pub async fn list_sale_documents(pool: &PgPool) -> Result<Vec<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, data
        FROM sales
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// 查询全部客户文档
pub async fn list_customer_documents(pool: &PgPool) -> Result<Vec<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, data
        FROM customers
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}
