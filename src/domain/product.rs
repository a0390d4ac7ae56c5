use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Domain representation of an affiliate product that can be promoted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    /// Surrogate database identifier.
    pub id: i32,
    /// Stable external identifier of the product, unique across its lifetime.
    pub item_id: String,
    /// Human-readable name of the product.
    pub name: String,
    /// Price in whole currency units (yen).
    pub price: Option<i32>,
    /// Source image reference used for hosting.
    pub image_url: Option<String>,
    /// Optional category label.
    pub category: Option<String>,
    /// Optional longer description fed to the copy generator.
    pub description: Option<String>,
    /// Affiliate link pointing at the shop listing.
    pub affiliate_url: Option<String>,
    /// Number of successful publishes, never decreases.
    pub post_count: i32,
    /// Timestamp of the last successful publish, `None` when never posted.
    pub last_posted_at: Option<NaiveDateTime>,
    /// Inactive products are skipped by the rotation.
    pub is_active: bool,
    /// Timestamp for when the product record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the product record.
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Whether the product has ever been published.
    pub fn was_posted(&self) -> bool {
        self.last_posted_at.is_some()
    }
}

/// Payload used to insert a product or refresh its descriptive fields.
///
/// Posting statistics are never part of this payload, so re-importing a
/// product keeps its rotation history.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub item_id: String,
    pub name: String,
    pub price: Option<i32>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub affiliate_url: Option<String>,
    /// Timestamp captured when the product payload was created.
    pub updated_at: NaiveDateTime,
}

impl NewProduct {
    /// Build a new product payload with the supplied identity and current timestamp.
    pub fn new(item_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = chrono::Local::now().naive_utc();
        Self {
            item_id: item_id.into(),
            name: name.into(),
            price: None,
            image_url: None,
            category: None,
            description: None,
            affiliate_url: None,
            updated_at: now,
        }
    }

    /// Attach a price to the product payload.
    pub fn with_price(mut self, price: i32) -> Self {
        self.price = Some(price);
        self
    }

    /// Attach the source image reference.
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Attach a category label.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach a descriptive text to the product payload.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach the affiliate link.
    pub fn with_affiliate_url(mut self, affiliate_url: impl Into<String>) -> Self {
        self.affiliate_url = Some(affiliate_url.into());
        self
    }
}

/// Query definition used to list products.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    /// Whether deactivated products should be included in the results.
    pub include_inactive: bool,
    /// Optional cap on the number of returned rows.
    pub limit: Option<usize>,
}

impl ProductListQuery {
    /// Construct a query that targets all active products.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include deactivated products in the results.
    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    /// Return at most `limit` products.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
