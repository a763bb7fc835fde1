use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url).await
}

/// Pool that only opens connections on first use.
#[cfg(test)]
pub fn lazy_pool(database_url: &str) -> PgPool {
    pool_options()
        .connect_lazy(database_url)
        .expect("valid database url")
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
}
