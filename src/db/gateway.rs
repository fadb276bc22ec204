//! Generic persistence helpers shared by every repository.
//!
//! Lookups return `Ok(None)` for missing rows; the `_or_err` variants raise
//! [`GatewayError::NotFound`] instead. Listing is always ordered newest-first
//! by creation time so pagination stays deterministic.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IdenStatic,
    IntoActiveModel, Iterable, PaginatorTrait, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter,
    QueryOrder, Related,
};
use serde::Serialize;
use thiserror::Error;

use crate::entities::{profiles, session_flags, users};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("This {0} could not be found.")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Ordering and upsert metadata the generic helpers need from an entity.
pub trait GatewayEntity: EntityTrait {
    /// Column used for newest-first ordering.
    fn created_at_column() -> Self::Column;

    /// Unique columns that key [`upsert`].
    fn conflict_columns() -> Vec<Self::Column>;
}

impl GatewayEntity for users::Entity {
    fn created_at_column() -> Self::Column {
        users::Column::CreatedAt
    }

    fn conflict_columns() -> Vec<Self::Column> {
        vec![users::Column::Email]
    }
}

impl GatewayEntity for profiles::Entity {
    fn created_at_column() -> Self::Column {
        profiles::Column::CreatedAt
    }

    fn conflict_columns() -> Vec<Self::Column> {
        vec![profiles::Column::UserId]
    }
}

impl GatewayEntity for session_flags::Entity {
    fn created_at_column() -> Self::Column {
        session_flags::Column::CreatedAt
    }

    fn conflict_columns() -> Vec<Self::Column> {
        vec![session_flags::Column::UserId]
    }
}

/// One page of results with the navigation metadata handlers return as-is.
#[derive(Debug, Clone, Serialize)]
pub struct Page<M> {
    pub items: Vec<M>,
    pub total_count: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub previous_page: Option<u64>,
    pub next_page: Option<u64>,
}

pub async fn get_all<E: GatewayEntity>(
    conn: &DatabaseConnection,
    filter: Condition,
) -> Result<Vec<E::Model>, GatewayError> {
    Ok(E::find()
        .filter(filter)
        .order_by_desc(E::created_at_column())
        .all(conn)
        .await?)
}

/// `page` is 1-based; it is clamped to at least 1.
pub async fn get_all_paginated<E: GatewayEntity>(
    conn: &DatabaseConnection,
    filter: Condition,
    page: u64,
    limit: u64,
) -> Result<Page<E::Model>, GatewayError>
where
    E::Model: Send + Sync,
{
    let limit = limit.max(1);
    let current_page = page.max(1);

    let paginator = E::find()
        .filter(filter)
        .order_by_desc(E::created_at_column())
        .paginate(conn, limit);

    let total_count = paginator.num_items().await?;
    let total_pages = if total_count == 0 {
        1
    } else {
        total_count.div_ceil(limit)
    };

    let items = paginator.fetch_page(current_page - 1).await?;

    let previous_page = if current_page == 1 {
        None
    } else {
        Some(current_page - 1)
    };
    let next_page = if current_page + 1 > total_pages {
        None
    } else {
        Some(current_page + 1)
    };

    Ok(Page {
        items,
        total_count,
        current_page,
        total_pages,
        previous_page,
        next_page,
    })
}

pub async fn get_one<E: EntityTrait>(
    conn: &DatabaseConnection,
    filter: Condition,
) -> Result<Option<E::Model>, GatewayError> {
    Ok(E::find().filter(filter).one(conn).await?)
}

pub async fn get_one_or_err<E: EntityTrait>(
    conn: &DatabaseConnection,
    filter: Condition,
    name: &str,
) -> Result<E::Model, GatewayError> {
    get_one::<E>(conn, filter)
        .await?
        .ok_or_else(|| GatewayError::NotFound(name.to_lowercase()))
}

/// Eager-loads a one-to-one related row alongside the main entity.
pub async fn get_one_with_related<E, R>(
    conn: &DatabaseConnection,
    filter: Condition,
) -> Result<Option<(E::Model, Option<R::Model>)>, GatewayError>
where
    E: EntityTrait + Related<R>,
    R: EntityTrait,
{
    Ok(E::find()
        .filter(filter)
        .find_also_related(R::default())
        .one(conn)
        .await?)
}

pub async fn get_by_id<E: EntityTrait>(
    conn: &DatabaseConnection,
    id: <E::PrimaryKey as PrimaryKeyTrait>::ValueType,
) -> Result<Option<E::Model>, GatewayError> {
    Ok(E::find_by_id(id).one(conn).await?)
}

pub async fn get_by_id_or_err<E: EntityTrait>(
    conn: &DatabaseConnection,
    id: <E::PrimaryKey as PrimaryKeyTrait>::ValueType,
    name: &str,
) -> Result<E::Model, GatewayError> {
    get_by_id::<E>(conn, id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(name.to_lowercase()))
}

pub async fn create<E>(
    conn: &DatabaseConnection,
    model: E::ActiveModel,
) -> Result<E::Model, GatewayError>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
{
    Ok(model.insert(conn).await?)
}

/// Insert-or-update keyed on the entity's declared unique columns. Only the
/// columns actually set on `model` are written on conflict, so an upsert that
/// flips one flag leaves the other columns of an existing row alone.
pub async fn upsert<E>(
    conn: &DatabaseConnection,
    model: E::ActiveModel,
) -> Result<E::Model, GatewayError>
where
    E: GatewayEntity,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
{
    let conflict = E::conflict_columns();
    let pk_columns: Vec<E::Column> = E::PrimaryKey::iter()
        .map(PrimaryKeyToColumn::into_column)
        .collect();
    let created_at = E::created_at_column();

    let mut skip: Vec<&str> = conflict.iter().map(IdenStatic::as_str).collect();
    skip.extend(pk_columns.iter().map(IdenStatic::as_str));
    // Creation time is immutable once the row exists.
    skip.push(created_at.as_str());

    let update_columns: Vec<E::Column> = E::Column::iter()
        .filter(|c| !skip.contains(&c.as_str()))
        .filter(|c| model.get(*c).is_set())
        .collect();

    // The conflict key values double as the re-select filter below.
    let mut key_filter = Condition::all();
    for col in &conflict {
        let value = model.get(*col).into_value().ok_or_else(|| {
            GatewayError::Internal(format!("Upsert key column {} is not set", col.as_str()))
        })?;
        key_filter = key_filter.add(col.eq(value));
    }

    let on_conflict = OnConflict::columns(conflict)
        .update_columns(update_columns)
        .to_owned();

    // SQLite cannot hand back the row from an ON CONFLICT DO UPDATE insert,
    // so execute and re-select by the conflict key.
    E::insert(model).on_conflict(on_conflict).exec(conn).await?;

    get_one::<E>(conn, key_filter)
        .await?
        .ok_or_else(|| GatewayError::Internal("Upserted row could not be re-read".to_string()))
}

pub async fn delete<E: EntityTrait>(
    conn: &DatabaseConnection,
    filter: Condition,
) -> Result<u64, GatewayError> {
    Ok(E::delete_many().filter(filter).exec(conn).await?.rows_affected)
}

pub async fn delete_or_err<E: EntityTrait>(
    conn: &DatabaseConnection,
    filter: Condition,
    name: &str,
) -> Result<(), GatewayError> {
    let deleted = delete::<E>(conn, filter).await?;
    if deleted == 0 {
        return Err(GatewayError::NotFound(name.to_lowercase()));
    }
    Ok(())
}
