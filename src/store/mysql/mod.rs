//! MySQL-backed store. Each entity describes its table through `SqlEntity`
//! and its filter through `SqlFilter`; `MySqlStore` does the rest.

mod attendance;
mod leave;
mod payroll;
mod performance;
mod records;
mod user;

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

use super::sql::{SqlValue, SqlWhere, bind_values, insert_sql, update_sql};
use super::{Entity, PageRequest, Store, StoreError, StoreResult};

/// Table mapping for an entity.
pub trait SqlEntity: Entity {
    const TABLE: &'static str;

    /// Every column except `id`, in the order of `values`.
    const COLUMNS: &'static [&'static str];

    /// Must agree with `Entity::listing_order`.
    const ORDER_BY: &'static str;

    fn values(&self) -> Vec<SqlValue>;

    fn from_row(row: &MySqlRow) -> StoreResult<Self>;
}

pub trait SqlFilter {
    fn to_sql(&self) -> SqlWhere;
}

/// Parse a string column into one of the strum-backed enums.
pub(crate) fn parse_column<E>(row: &MySqlRow, column: &str) -> StoreResult<E>
where
    E: std::str::FromStr,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<E>()
        .map_err(|_| StoreError::Decode(format!("unexpected {} value '{}'", column, raw)))
}

pub struct MySqlStore<T> {
    pool: MySqlPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> MySqlStore<T> {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

impl<T: SqlEntity> MySqlStore<T> {
    fn select_sql(where_clause: &str) -> String {
        format!(
            "SELECT id, {} FROM {}{} ORDER BY {}",
            T::COLUMNS.join(", "),
            T::TABLE,
            where_clause,
            T::ORDER_BY
        )
    }
}

/// MySQL reports unique violations as SQLSTATE 23000, e.g.
/// "Duplicate entry 'a@x.com' for key 'users.email'".
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23000") && db_err.message().starts_with("Duplicate entry") {
            let key = db_err
                .message()
                .rsplit("for key ")
                .next()
                .map(|k| k.trim_matches('\'').rsplit('.').next().unwrap_or(k).to_string())
                .unwrap_or_else(|| db_err.message().to_string());
            return StoreError::Duplicate(key);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl<T> Store<T> for MySqlStore<T>
where
    T: SqlEntity,
    T::Filter: SqlFilter,
{
    async fn find_by_id(&self, id: u64) -> StoreResult<Option<T>> {
        let sql = Self::select_sql(" WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    async fn find_one(&self, filter: &T::Filter) -> StoreResult<Option<T>> {
        let filter = filter.to_sql();
        let sql = format!("{} LIMIT 1", Self::select_sql(&filter.clause()));
        let query = bind_values(sqlx::query(&sql), filter.into_values());
        let row = query.fetch_optional(&self.pool).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    async fn find_all(&self, filter: &T::Filter, page: Option<PageRequest>) -> StoreResult<Vec<T>> {
        let filter = filter.to_sql();
        let mut sql = Self::select_sql(&filter.clause());
        if page.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
        }
        tracing::debug!(sql = %sql, table = T::TABLE, "Fetching rows");

        let mut query = bind_values(sqlx::query(&sql), filter.into_values());
        if let Some(page) = page {
            query = query.bind(page.per_page() as u64).bind(page.offset());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(T::from_row).collect()
    }

    async fn count(&self, filter: &T::Filter) -> StoreResult<u64> {
        let filter = filter.to_sql();
        let sql = format!("SELECT COUNT(*) FROM {}{}", T::TABLE, filter.clause());
        let row = bind_values(sqlx::query(&sql), filter.into_values())
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get(0)?;
        Ok(total as u64)
    }

    async fn save(&self, mut entity: T) -> StoreResult<T> {
        if entity.id() == 0 {
            let sql = insert_sql(T::TABLE, T::COLUMNS);
            let result = bind_values(sqlx::query(&sql), entity.values())
                .execute(&self.pool)
                .await
                .map_err(map_write_error)?;
            entity.set_id(result.last_insert_id());
        } else {
            let sql = update_sql(T::TABLE, T::COLUMNS);
            let mut values = entity.values();
            values.push(SqlValue::U64(entity.id()));
            bind_values(sqlx::query(&sql), values)
                .execute(&self.pool)
                .await
                .map_err(map_write_error)?;
        }
        Ok(entity)
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
