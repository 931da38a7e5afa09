use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, QueryBuilder};

use crate::{
    db::MarketplaceStore,
    error::AppResult,
    models::{PersonaVector, Product, ProductFilters, Seller, NEUTRAL_AXIS_VALUE},
};

/// Response time assumed for sellers with no recorded value
const DEFAULT_RESPONSE_HOURS: f64 = 24.0;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

#[derive(Debug, FromRow)]
struct SellerRow {
    seller_id: String,
    seller_name: Option<String>,
    trust_safety: Option<f64>,
    quality_condition: Option<f64>,
    remote_transaction: Option<f64>,
    activity_responsiveness: Option<f64>,
    price_flexibility: Option<f64>,
    total_sales: Option<i32>,
    avg_rating: Option<f64>,
    response_time_hours: Option<f64>,
}

impl From<SellerRow> for Seller {
    fn from(row: SellerRow) -> Self {
        let axis = |v: Option<f64>| v.unwrap_or(NEUTRAL_AXIS_VALUE);
        Seller {
            seller_name: row.seller_name.unwrap_or_else(|| row.seller_id.clone()),
            seller_id: row.seller_id,
            persona_vector: PersonaVector::new(
                axis(row.trust_safety),
                axis(row.quality_condition),
                axis(row.remote_transaction),
                axis(row.activity_responsiveness),
                axis(row.price_flexibility),
            ),
            total_sales: row.total_sales.unwrap_or(0).max(0) as u32,
            avg_rating: row.avg_rating.unwrap_or(0.0),
            response_time_hours: row.response_time_hours.unwrap_or(DEFAULT_RESPONSE_HOURS),
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    product_id: String,
    seller_id: String,
    title: String,
    price: f64,
    category: Option<String>,
    condition: Option<String>,
    location: Option<String>,
    description: Option<String>,
    view_count: Option<i32>,
    like_count: Option<i32>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            product_id: row.product_id,
            seller_id: row.seller_id,
            title: row.title,
            price: row.price,
            category: row.category.unwrap_or_default(),
            condition: row.condition.unwrap_or_default(),
            location: row.location.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            view_count: row.view_count.unwrap_or(0).max(0) as u32,
            like_count: row.like_count.unwrap_or(0).max(0) as u32,
        }
    }
}

/// Marketplace store backed by the `sellers` and `products` tables
#[derive(Clone)]
pub struct PgMarketplaceStore {
    pool: PgPool,
}

impl PgMarketplaceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the optional product filters to a query that already has a WHERE clause
fn push_product_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &ProductFilters) {
    if let Some(price_min) = filters.price_min {
        builder.push(" AND p.price >= ").push_bind(price_min);
    }
    if let Some(price_max) = filters.price_max {
        builder.push(" AND p.price <= ").push_bind(price_max);
    }
    if let Some(category) = &filters.category {
        builder.push(" AND p.category = ").push_bind(category.clone());
    }
    if let Some(location) = &filters.location {
        builder
            .push(" AND p.location LIKE ")
            .push_bind(format!("%{}%", escape_like(location)))
            .push(r" ESCAPE '\'");
    }
}

/// Escapes LIKE metacharacters so the location filter is a plain substring match
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait::async_trait]
impl MarketplaceStore for PgMarketplaceStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn fetch_sellers(&self, limit: usize) -> AppResult<Vec<Seller>> {
        let rows: Vec<SellerRow> = sqlx::query_as(
            r#"
            SELECT seller_id, seller_name,
                   trust_safety, quality_condition, remote_transaction,
                   activity_responsiveness, price_flexibility,
                   total_sales, avg_rating, response_time_hours
            FROM sellers
            WHERE trust_safety IS NOT NULL
            ORDER BY seller_id
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        tracing::info!(count = rows.len(), limit, "Fetched sellers");

        Ok(rows.into_iter().map(Seller::from).collect())
    }

    async fn fetch_products(
        &self,
        seller_ids: &[String],
        filters: &ProductFilters,
    ) -> AppResult<Vec<Product>> {
        if seller_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT p.product_id, p.seller_id, p.title, p.price, p.category,
                   p.condition, p.location, p.description, p.view_count, p.like_count
            FROM products p
            JOIN sellers s ON p.seller_id = s.seller_id
            WHERE p.seller_id = ANY("#,
        );
        builder.push_bind(seller_ids.to_vec()).push(")");
        push_product_filters(&mut builder, filters);
        builder.push(" ORDER BY p.created_at DESC");

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        tracing::info!(
            count = rows.len(),
            sellers = seller_ids.len(),
            "Fetched products"
        );

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
