use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::{
    domain::product::{NewProduct as DomainNewProduct, Product as DomainProduct, ProductListQuery},
    models::product::{NewProduct as DbNewProduct, Product as DbProduct, RefreshProduct},
    repository::{DieselRepository, ProductReader, ProductWriter, RepositoryResult},
};

impl ProductReader for DieselRepository {
    fn get_product_by_item_id(&self, item_id: &str) -> RepositoryResult<Option<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let product = products::table
            .filter(products::item_id.eq(item_id))
            .select(DbProduct::as_select())
            .first::<DbProduct>(&mut conn)
            .optional()?;

        Ok(product.map(Into::into))
    }

    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<Vec<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let mut items = products::table
            .select(DbProduct::as_select())
            .into_boxed::<diesel::sqlite::Sqlite>();

        if !query.include_inactive {
            items = items.filter(products::is_active.eq(true));
        }

        items = items.order(products::item_id.asc());

        if let Some(limit) = query.limit {
            items = items.limit(limit as i64);
        }

        let db_products = items.load::<DbProduct>(&mut conn)?;

        Ok(db_products.into_iter().map(Into::into).collect())
    }
}

impl ProductWriter for DieselRepository {
    fn upsert_product(&self, new_product: &DomainNewProduct) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_new = DbNewProduct::from(new_product);
        let refresh = RefreshProduct::from(new_product);

        conn.transaction(|conn| {
            diesel::insert_into(products::table)
                .values(&db_new)
                .on_conflict(products::item_id)
                .do_update()
                .set(&refresh)
                .execute(conn)?;

            products::table
                .filter(products::item_id.eq(&new_product.item_id))
                .select(DbProduct::as_select())
                .first::<DbProduct>(conn)
        })
        .map(Into::into)
        .map_err(Into::into)
    }

    fn record_successful_post(
        &self,
        item_id: &str,
        posted_at: NaiveDateTime,
    ) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let target = products::table.filter(products::item_id.eq(item_id));

        let updated = diesel::update(target)
            .set((
                products::post_count.eq(products::post_count + 1),
                products::last_posted_at.eq(Some(posted_at)),
                products::updated_at.eq(posted_at),
            ))
            .get_result::<DbProduct>(&mut conn)?;

        Ok(updated.into())
    }

    fn set_product_active(&self, item_id: &str, is_active: bool) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let now = chrono::Local::now().naive_utc();

        let target = products::table.filter(products::item_id.eq(item_id));

        let updated = diesel::update(target)
            .set((
                products::is_active.eq(is_active),
                products::updated_at.eq(now),
            ))
            .get_result::<DbProduct>(&mut conn)?;

        Ok(updated.into())
    }
}
