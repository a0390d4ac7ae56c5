use std::io::Read;

use csv::{StringRecord, Trim};
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::domain::product::NewProduct;

const ITEM_ID_MAX_LEN: u64 = 64;
const NAME_MAX_LEN: u64 = 256;
const REQUIRED_HEADERS: [&str; 2] = ["item_id", "item_name"];

/// Result type returned by the product form helpers.
pub type ProductFormResult<T> = Result<T, ProductFormError>;

/// Errors that abort a whole import.
#[derive(Debug, Error)]
pub enum ProductFormError {
    /// The CSV is missing `item_id` or `item_name`.
    #[error("CSV is missing the required `item_id`/`item_name` headers")]
    MissingRequiredHeaders,
    /// CSV parsing failures.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One CSV row in the catalogue export format.
#[derive(Debug, Deserialize, Validate)]
pub struct ProductRow {
    #[validate(length(min = 1, max = ITEM_ID_MAX_LEN))]
    pub item_id: String,
    #[validate(length(min = 1, max = NAME_MAX_LEN))]
    pub item_name: String,
    #[validate(range(min = 0))]
    pub price: Option<i32>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub affiliate_url: Option<String>,
}

impl ProductRow {
    fn into_new_product(self) -> NewProduct {
        let mut product = NewProduct::new(
            sanitize_inline_text(&self.item_id),
            sanitize_inline_text(&self.item_name),
        );

        if let Some(price) = self.price {
            product = product.with_price(price);
        }
        if let Some(image_url) = non_empty(self.image_url.as_deref()) {
            product = product.with_image_url(image_url);
        }
        if let Some(category) = self
            .category
            .as_deref()
            .map(sanitize_inline_text)
            .filter(|value| !value.is_empty())
        {
            product = product.with_category(category);
        }
        if let Some(description) = self
            .description
            .as_deref()
            .map(sanitize_multiline_text)
            .filter(|value| !value.is_empty())
        {
            product = product.with_description(description);
        }
        if let Some(affiliate_url) = non_empty(self.affiliate_url.as_deref()) {
            product = product.with_affiliate_url(affiliate_url);
        }

        product
    }
}

/// A row that could not be turned into a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based line number in the file, counting the header.
    pub row: usize,
    pub reason: String,
}

/// Parsed products plus the rows that were skipped.
#[derive(Debug, Default)]
pub struct ImportBatch {
    pub products: Vec<NewProduct>,
    pub rejected: Vec<RejectedRow>,
}

/// CSV catalogue upload.
#[derive(Debug)]
pub struct ImportProductsForm {
    pub bytes: Vec<u8>,
}

impl ImportProductsForm {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn from_reader(mut reader: impl Read) -> std::io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::new(bytes))
    }

    /// Parse every row. Rows that fail to deserialize or validate are
    /// collected in `rejected` instead of aborting the import.
    pub fn into_batch(self) -> ProductFormResult<ImportBatch> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(self.bytes.as_slice());

        let headers = reader.headers()?.clone();
        if !has_required_headers(&headers) {
            return Err(ProductFormError::MissingRequiredHeaders);
        }

        let mut batch = ImportBatch::default();
        for (index, record) in reader.records().enumerate() {
            let row = index + 2; // account for header row
            let record = record?;

            let parsed: ProductRow = match record.deserialize(Some(&headers)) {
                Ok(parsed) => parsed,
                Err(e) => {
                    batch.rejected.push(RejectedRow {
                        row,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if let Err(e) = parsed.validate() {
                batch.rejected.push(RejectedRow {
                    row,
                    reason: e.to_string(),
                });
                continue;
            }

            batch.products.push(parsed.into_new_product());
        }

        Ok(batch)
    }
}

fn has_required_headers(headers: &StringRecord) -> bool {
    REQUIRED_HEADERS
        .iter()
        .all(|required| headers.iter().any(|header| header == *required))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if !ch.is_control() {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

fn sanitize_multiline_text(input: &str) -> String {
    input
        .lines()
        .map(sanitize_inline_text)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
