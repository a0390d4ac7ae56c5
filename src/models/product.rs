use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::{NewProduct as DomainNewProduct, Product as DomainProduct};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i32,
    pub item_id: String,
    pub name: String,
    pub price: Option<i32>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub affiliate_url: Option<String>,
    pub post_count: i32,
    pub last_posted_at: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct<'a> {
    pub item_id: &'a str,
    pub name: &'a str,
    pub price: Option<i32>,
    pub image_url: Option<&'a str>,
    pub category: Option<&'a str>,
    pub description: Option<&'a str>,
    pub affiliate_url: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

/// Descriptive fields replaced when an existing `item_id` is imported again.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::products)]
#[diesel(treat_none_as_null = true)]
pub struct RefreshProduct<'a> {
    pub name: &'a str,
    pub price: Option<i32>,
    pub image_url: Option<&'a str>,
    pub category: Option<&'a str>,
    pub description: Option<&'a str>,
    pub affiliate_url: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl From<Product> for DomainProduct {
    fn from(value: Product) -> Self {
        Self {
            id: value.id,
            item_id: value.item_id,
            name: value.name,
            price: value.price,
            image_url: value.image_url,
            category: value.category,
            description: value.description,
            affiliate_url: value.affiliate_url,
            post_count: value.post_count,
            last_posted_at: value.last_posted_at,
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewProduct> for NewProduct<'a> {
    fn from(value: &'a DomainNewProduct) -> Self {
        Self {
            item_id: value.item_id.as_str(),
            name: value.name.as_str(),
            price: value.price,
            image_url: value.image_url.as_deref(),
            category: value.category.as_deref(),
            description: value.description.as_deref(),
            affiliate_url: value.affiliate_url.as_deref(),
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewProduct> for RefreshProduct<'a> {
    fn from(value: &'a DomainNewProduct) -> Self {
        Self {
            name: value.name.as_str(),
            price: value.price,
            image_url: value.image_url.as_deref(),
            category: value.category.as_deref(),
            description: value.description.as_deref(),
            affiliate_url: value.affiliate_url.as_deref(),
            updated_at: value.updated_at,
        }
    }
}
