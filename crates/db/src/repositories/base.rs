//! Generic repository shared by every owned entity.
//!
//! Entity repositories implement [`Entity`] for their row type and get
//! lookup, filtered + paginated listing, duplicate checks, deletion and the
//! authorizing [`BaseRepo::find_authorized`] for free. Hand-written SQL stays
//! in the entity repositories for inserts, updates and multi-row workflows.
//!
//! Column names in [`Condition`] are `&'static str` so they can only come
//! from code; user input only ever reaches the query through bind parameters.

use std::marker::PhantomData;

use chrono::NaiveDate;
use placement_core::access::{authorize, Action, Actor, ListScope, Relation, Resource};
use placement_core::error::CoreError;
use placement_core::pagination::{Page, PageParams};
use placement_core::types::DbId;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

use crate::error::DbResult;

/// A table whose rows can be loaded, listed and authorized generically.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    /// Select list, also used in `RETURNING` clauses.
    const COLUMNS: &'static str;
    const RESOURCE: Resource;
    /// Column holding the owning user.
    const OWNER_COLUMN: &'static str;
    const SOFT_DELETE: bool = false;
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn id(&self) -> DbId;

    /// Rows an [`ListScope::Owned`] list shows to `user_id`. Entities with
    /// two parties override this with a disjunction.
    fn owned_by(user_id: DbId) -> Condition {
        Condition::eq(Self::OWNER_COLUMN, user_id)
    }

    /// How `actor` relates to this row.
    fn relation(&self, actor: &Actor) -> Relation;
}

/// A bindable filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    SmallInt(i16),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    IntList(Vec<i64>),
    SmallIntList(Vec<i16>),
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<i16> for FilterValue {
    fn from(v: i16) -> Self {
        FilterValue::SmallInt(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        FilterValue::Date(v)
    }
}

impl From<Vec<i16>> for FilterValue {
    fn from(v: Vec<i16>) -> Self {
        FilterValue::SmallIntList(v)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(v: Vec<i64>) -> Self {
        FilterValue::IntList(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    ILike,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `column = ANY($n)` against a list value.
    AnyOf,
}

impl FilterOp {
    fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => " = ",
            FilterOp::Ne => " <> ",
            FilterOp::ILike => " ILIKE ",
            FilterOp::Gt => " > ",
            FilterOp::Gte => " >= ",
            FilterOp::Lt => " < ",
            FilterOp::Lte => " <= ",
            FilterOp::AnyOf => " = ANY(",
        }
    }
}

/// A WHERE-clause fragment. Top-level conditions are joined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: &'static str,
        op: FilterOp,
        value: FilterValue,
    },
    /// `column IN (SELECT id FROM cvs WHERE owner_id = $n AND deleted_at IS NULL)`.
    CvOwnedBy { column: &'static str, user_id: DbId },
    /// Disjunction of the inner conditions.
    Any(Vec<Condition>),
}

impl Condition {
    pub fn eq(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::Eq, value)
    }

    pub fn ne(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::Ne, value)
    }

    /// Case-insensitive substring match. `%` and `_` in `needle` are escaped.
    pub fn contains(column: &'static str, needle: &str) -> Self {
        let escaped = needle
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Self::compare(column, FilterOp::ILike, format!("%{escaped}%"))
    }

    pub fn gt(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::Gt, value)
    }

    pub fn gte(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::Gte, value)
    }

    pub fn lt(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::Lt, value)
    }

    pub fn lte(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::Lte, value)
    }

    pub fn any_of(column: &'static str, values: impl Into<FilterValue>) -> Self {
        Self::compare(column, FilterOp::AnyOf, values)
    }

    pub fn cv_owned_by(column: &'static str, user_id: DbId) -> Self {
        Condition::CvOwnedBy { column, user_id }
    }

    pub fn either(conditions: Vec<Condition>) -> Self {
        Condition::Any(conditions)
    }

    fn compare(column: &'static str, op: FilterOp, value: impl Into<FilterValue>) -> Self {
        Condition::Compare {
            column,
            op,
            value: value.into(),
        }
    }
}

/// Generic data access for any [`Entity`].
pub struct BaseRepo<T>(PhantomData<T>);

impl<T: Entity> BaseRepo<T> {
    /// Find a row by primary key. Soft-deleted rows are hidden.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<T>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE id = ",
            T::COLUMNS,
            T::TABLE
        ));
        qb.push_bind(id);
        if T::SOFT_DELETE {
            qb.push(" AND deleted_at IS NULL");
        }
        qb.build_query_as::<T>().fetch_optional(pool).await
    }

    /// Load and row-lock a row inside a transaction, failing with `NotFound`.
    ///
    /// Workflow methods re-read their rows through this so status checks
    /// happen under the lock.
    pub async fn lock(tx: &mut Transaction<'_, Postgres>, id: DbId) -> DbResult<T> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE id = ",
            T::COLUMNS,
            T::TABLE
        ));
        qb.push_bind(id);
        if T::SOFT_DELETE {
            qb.push(" AND deleted_at IS NULL");
        }
        qb.push(" FOR UPDATE");
        qb.build_query_as::<T>()
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: T::RESOURCE.entity_name(),
                    id,
                }
                .into()
            })
    }

    /// Find a row or fail with `NotFound`.
    pub async fn get(pool: &PgPool, id: DbId) -> DbResult<T> {
        Self::find_by_id(pool, id).await?.ok_or_else(|| {
            CoreError::NotFound {
                entity: T::RESOURCE.entity_name(),
                id,
            }
            .into()
        })
    }

    /// Load a row and check that `actor` may perform `action` on it.
    ///
    /// Missing rows are `NotFound`; rows the actor may not touch are `Forbidden`.
    pub async fn find_authorized(
        pool: &PgPool,
        actor: &Actor,
        action: Action,
        id: DbId,
    ) -> DbResult<T> {
        let row = Self::get(pool, id).await?;
        authorize(actor, T::RESOURCE, action, row.relation(actor))?;
        Ok(row)
    }

    /// List rows matching every condition, one page at a time.
    pub async fn list(
        pool: &PgPool,
        conditions: &[Condition],
        page: &PageParams,
    ) -> Result<Page<T>, sqlx::Error> {
        let total = Self::count(pool, conditions).await?;

        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {}", T::COLUMNS, T::TABLE));
        push_where::<T>(&mut qb, conditions);
        qb.push(format!(" ORDER BY {} LIMIT ", T::ORDER_BY));
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let items = qb.build_query_as::<T>().fetch_all(pool).await?;
        Ok(Page::new(items, total, page))
    }

    /// List with the owner scope for `scope` added to `conditions`.
    pub async fn list_scoped(
        pool: &PgPool,
        scope: ListScope,
        mut conditions: Vec<Condition>,
        page: &PageParams,
    ) -> Result<Page<T>, sqlx::Error> {
        if let Some(cond) = scope_condition::<T>(scope) {
            conditions.push(cond);
        }
        Self::list(pool, &conditions, page).await
    }

    /// Count rows matching every condition.
    pub async fn count(pool: &PgPool, conditions: &[Condition]) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", T::TABLE));
        push_where::<T>(&mut qb, conditions);
        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    /// Whether any live row matches every condition.
    pub async fn exists(pool: &PgPool, conditions: &[Condition]) -> Result<bool, sqlx::Error> {
        Ok(Self::count(pool, conditions).await? > 0)
    }

    /// Delete a row (soft for soft-delete entities). Returns `true` if a row changed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let query = if T::SOFT_DELETE {
            format!(
                "UPDATE {} SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
                T::TABLE
            )
        } else {
            format!("DELETE FROM {} WHERE id = $1", T::TABLE)
        };
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Owner filter for a list scope, if any.
pub fn scope_condition<T: Entity>(scope: ListScope) -> Option<Condition> {
    match scope {
        ListScope::All => None,
        ListScope::Owned(user_id) => Some(T::owned_by(user_id)),
    }
}

fn push_where<T: Entity>(qb: &mut QueryBuilder<'_, Postgres>, conditions: &[Condition]) {
    let mut first = true;
    if T::SOFT_DELETE {
        push_joiner(qb, &mut first);
        qb.push("deleted_at IS NULL");
    }
    for cond in conditions {
        push_joiner(qb, &mut first);
        push_condition(qb, cond);
    }
}

fn push_joiner(qb: &mut QueryBuilder<'_, Postgres>, first: &mut bool) {
    qb.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, cond: &Condition) {
    match cond {
        Condition::Compare { column, op, value } => {
            qb.push(*column);
            qb.push(op.sql());
            push_value(qb, value);
            if *op == FilterOp::AnyOf {
                qb.push(")");
            }
        }
        Condition::CvOwnedBy { column, user_id } => {
            qb.push(format!(
                "{column} IN (SELECT id FROM cvs WHERE deleted_at IS NULL AND owner_id = "
            ));
            qb.push_bind(*user_id);
            qb.push(")");
        }
        Condition::Any(inner) if inner.is_empty() => {
            qb.push("FALSE");
        }
        Condition::Any(inner) => {
            qb.push("(");
            for (i, c) in inner.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                push_condition(qb, c);
            }
            qb.push(")");
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value.clone() {
        FilterValue::Int(v) => qb.push_bind(v),
        FilterValue::SmallInt(v) => qb.push_bind(v),
        FilterValue::Text(v) => qb.push_bind(v),
        FilterValue::Bool(v) => qb.push_bind(v),
        FilterValue::Date(v) => qb.push_bind(v),
        FilterValue::IntList(v) => qb.push_bind(v),
        FilterValue::SmallIntList(v) => qb.push_bind(v),
    };
}
