//! Table-agnostic data access built on sea-orm entities.
//!
//! `Repository<E>` works for any entity. Filters are expressed as typed
//! [`Criteria`] over the entity's `Column` enum, and ordering uses the same
//! enum plus [`Order`], so nothing caller-supplied ever ends up spliced into
//! SQL text.

pub mod reputation;

use std::fmt;
use std::marker::PhantomData;

use sea_orm::sea_query::Order;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, PrimaryKeyTrait, QueryFilter,
    QueryOrder, QuerySelect, Value,
};

use crate::db::DbClient;
use crate::error::DatabaseError;

/// A single filter on one column.
#[derive(Clone, Debug, PartialEq)]
pub enum Criterion {
    /// `column = value`
    Equals(Value),
    /// `column IN (values...)`; an empty set matches no rows.
    OneOf(Vec<Value>),
}

/// AND-combined column filters.
#[derive(Clone, Debug)]
pub struct Criteria<C> {
    filters: Vec<(C, Criterion)>,
}

impl<C> Default for Criteria<C> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
        }
    }
}

impl<C: ColumnTrait> Criteria<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq<V: Into<Value>>(mut self, column: C, value: V) -> Self {
        self.filters.push((column, Criterion::Equals(value.into())));
        self
    }

    pub fn one_of<V, I>(mut self, column: C, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filters.push((column, Criterion::OneOf(values)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    fn condition(&self) -> Condition {
        self.filters
            .iter()
            .fold(Condition::all(), |cond, (column, criterion)| match criterion {
                Criterion::Equals(v) => cond.add(column.eq(v.clone())),
                Criterion::OneOf(vs) => cond.add(column.is_in(vs.iter().cloned())),
            })
    }
}

/// Generic finder/counter for one entity.
pub struct Repository<E> {
    db: DbClient,
    entity: PhantomData<E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            entity: PhantomData,
        }
    }
}

impl<E: EntityTrait> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("table", &E::default().table_name())
            .finish()
    }
}

impl<E> Repository<E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    pub fn new(db: DbClient) -> Self {
        Self {
            db,
            entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DbClient {
        &self.db
    }

    #[tracing::instrument(skip_all, fields(table = E::default().table_name()))]
    pub async fn find_by_id<T>(&self, id: T) -> Result<Option<E::Model>, DatabaseError>
    where
        T: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        Ok(E::find_by_id(id).one(self.db.connection()).await?)
    }

    #[tracing::instrument(skip_all, fields(table = E::default().table_name()))]
    pub async fn find_all(
        &self,
        order_by: E::Column,
        direction: Order,
    ) -> Result<Vec<E::Model>, DatabaseError> {
        Ok(E::find()
            .order_by(order_by, direction)
            .all(self.db.connection())
            .await?)
    }

    /// Rows matching every criterion, optionally ordered and limited.
    #[tracing::instrument(skip_all, fields(table = E::default().table_name(), filters = criteria.filters.len()))]
    pub async fn find_by(
        &self,
        criteria: &Criteria<E::Column>,
        order_by: Option<(E::Column, Order)>,
        limit: Option<u64>,
    ) -> Result<Vec<E::Model>, DatabaseError> {
        let mut query = E::find().filter(criteria.condition());
        if let Some((column, direction)) = order_by {
            query = query.order_by(column, direction);
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        Ok(query.all(self.db.connection()).await?)
    }

    pub async fn find_one_by(
        &self,
        criteria: &Criteria<E::Column>,
    ) -> Result<Option<E::Model>, DatabaseError> {
        Ok(self.find_by(criteria, None, Some(1)).await?.into_iter().next())
    }

    #[tracing::instrument(skip_all, fields(table = E::default().table_name(), filters = criteria.filters.len()))]
    pub async fn count(&self, criteria: &Criteria<E::Column>) -> Result<u64, DatabaseError> {
        Ok(E::find()
            .filter(criteria.condition())
            .count(self.db.connection())
            .await?)
    }
}
