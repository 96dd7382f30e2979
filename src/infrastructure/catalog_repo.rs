use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{NewProduct, NewVariant, ProductPage, ProductView, VariantView};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CatalogStore, StockTarget};
use crate::schema::{product_variants, products};

use super::models::{NewProductRow, NewVariantRow, ProductRow, VariantRow};

impl From<ProductRow> for ProductView {
    fn from(row: ProductRow) -> Self {
        ProductView {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            has_variants: row.has_variants,
            stock: row.stock,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<VariantRow> for VariantView {
    fn from(row: VariantRow) -> Self {
        VariantView {
            id: row.id,
            product_id: row.product_id,
            variant_type: row.variant_type,
            value: row.value,
            stock: row.stock,
        }
    }
}

pub struct DieselCatalogStore {
    pool: DbPool,
}

impl DieselCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for DieselCatalogStore {
    fn insert_product(&self, product: NewProduct) -> Result<ProductView, DomainError> {
        product.validate()?;
        let mut conn = self.pool.get()?;

        let row: ProductRow = diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: Uuid::new_v4(),
                title: product.title,
                description: product.description,
                price: product.price,
                has_variants: product.has_variants,
                stock: product.stock,
                is_active: product.is_active,
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;

        Ok(row.into())
    }

    fn insert_variant(&self, variant: NewVariant) -> Result<VariantView, DomainError> {
        variant.validate()?;
        let mut conn = self.pool.get()?;

        let product_exists: i64 = products::table
            .filter(products::id.eq(variant.product_id))
            .count()
            .get_result(&mut conn)?;
        if product_exists == 0 {
            return Err(DomainError::ProductNotFound);
        }

        let row: VariantRow = diesel::insert_into(product_variants::table)
            .values(&NewVariantRow {
                id: Uuid::new_v4(),
                product_id: variant.product_id,
                variant_type: variant.variant_type.to_uppercase(),
                value: variant.value,
                stock: variant.stock,
            })
            .returning(VariantRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::VariantExists
                }
                other => other.into(),
            })?;

        Ok(row.into())
    }

    fn find_product(&self, id: Uuid) -> Result<Option<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Into::into))
    }

    fn find_variant(&self, id: Uuid) -> Result<Option<VariantView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = product_variants::table
            .filter(product_variants::id.eq(id))
            .select(VariantRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Into::into))
    }

    fn list_active(&self, page: i64, limit: i64) -> Result<ProductPage, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = products::table
                .filter(products::is_active.eq(true))
                .count()
                .get_result(conn)?;

            let rows = products::table
                .filter(products::is_active.eq(true))
                .select(ProductRow::as_select())
                .order(products::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ProductPage {
                items: rows.into_iter().map(Into::into).collect(),
                total,
            })
        })
    }

    /// The reservation primitive: a single conditional UPDATE that decrements
    /// the counter iff it still holds at least `quantity`. The check and the
    /// write are one atomic statement at the database, so concurrent callers
    /// can never drive the counter negative.
    fn reserve(&self, target: StockTarget, quantity: i32) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidInput(
                "reservation quantity must be positive".into(),
            ));
        }
        let mut conn = self.pool.get()?;

        let matched = match target {
            StockTarget::Product(id) => diesel::update(
                products::table.filter(products::id.eq(id).and(products::stock.ge(quantity))),
            )
            .set((
                products::stock.eq(products::stock - quantity),
                products::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?,
            StockTarget::Variant(id) => diesel::update(
                product_variants::table
                    .filter(product_variants::id.eq(id).and(product_variants::stock.ge(quantity))),
            )
            .set((
                product_variants::stock.eq(product_variants::stock - quantity),
                product_variants::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?,
        };

        if matched == 0 {
            return Err(DomainError::OutOfStock);
        }
        Ok(())
    }

    fn release(&self, target: StockTarget, quantity: i32) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidInput(
                "release quantity must be positive".into(),
            ));
        }
        let mut conn = self.pool.get()?;

        let matched = match target {
            StockTarget::Product(id) => {
                diesel::update(products::table.filter(products::id.eq(id)))
                    .set((
                        products::stock.eq(products::stock + quantity),
                        products::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(&mut conn)?
            }
            StockTarget::Variant(id) => {
                diesel::update(product_variants::table.filter(product_variants::id.eq(id)))
                    .set((
                        product_variants::stock.eq(product_variants::stock + quantity),
                        product_variants::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(&mut conn)?
            }
        };

        if matched == 0 {
            log::warn!("release matched no row for {target:?}");
        }
        Ok(())
    }
}
