use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxEventRepo {
    pub pool: PgPool,
}
