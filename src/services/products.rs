use log::{info, warn};

use crate::domain::post::PostLog;
use crate::domain::product::Product;
use crate::forms::products::{ImportProductsForm, RejectedRow};
use crate::repository::{PostLogReader, ProductReader, ProductWriter};
use crate::services::{ServiceError, ServiceResult};

/// Summary of a catalogue import.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows inserted or refreshed.
    pub imported: usize,
    /// Rows skipped because they did not parse or validate.
    pub failed: usize,
    pub rejected: Vec<RejectedRow>,
}

/// Upsert every valid row of the CSV. Posting statistics of products that
/// already exist are left untouched.
pub fn import_products<R>(repo: &R, form: ImportProductsForm) -> ServiceResult<ImportReport>
where
    R: ProductWriter + ?Sized,
{
    let batch = form
        .into_batch()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    for rejected in &batch.rejected {
        warn!("skipping CSV row {}: {}", rejected.row, rejected.reason);
    }

    let mut imported = 0usize;
    for product in &batch.products {
        repo.upsert_product(product)?;
        imported += 1;
    }

    info!(
        "import finished: {imported} imported, {} failed",
        batch.rejected.len()
    );

    Ok(ImportReport {
        imported,
        failed: batch.rejected.len(),
        rejected: batch.rejected,
    })
}

/// Take a product out of the rotation without deleting it.
pub fn deactivate_product<R>(repo: &R, item_id: &str) -> ServiceResult<Product>
where
    R: ProductReader + ProductWriter + ?Sized,
{
    if repo.get_product_by_item_id(item_id)?.is_none() {
        return Err(ServiceError::NotFound);
    }

    let product = repo.set_product_active(item_id, false)?;
    info!("product {item_id} deactivated");
    Ok(product)
}

/// Most recent log entries, newest first.
pub fn recent_posts<R>(repo: &R, limit: usize) -> ServiceResult<Vec<PostLog>>
where
    R: PostLogReader + ?Sized,
{
    Ok(repo.list_recent_posts(limit)?)
}
