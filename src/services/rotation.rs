//! Fair ordering of products for the next publish.

use std::cmp::Ordering;

use crate::domain::product::{Product, ProductListQuery};
use crate::repository::ProductReader;
use crate::services::ServiceResult;

/// Never-posted products first, then fewest posts, then longest since the
/// last post. `item_id` breaks any remaining tie so the order is total.
pub fn rotation_order(a: &Product, b: &Product) -> Ordering {
    a.was_posted()
        .cmp(&b.was_posted())
        .then(a.post_count.cmp(&b.post_count))
        .then(a.last_posted_at.cmp(&b.last_posted_at))
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// Active products sorted by [`rotation_order`].
pub fn rank(products: Vec<Product>) -> Vec<Product> {
    let mut candidates: Vec<Product> = products
        .into_iter()
        .filter(|product| product.is_active)
        .collect();
    candidates.sort_by(rotation_order);
    candidates
}

/// All active products in the order they should be published.
pub fn select_candidates<R>(repo: &R) -> ServiceResult<Vec<Product>>
where
    R: ProductReader + ?Sized,
{
    let products = repo.list_products(ProductListQuery::new())?;
    Ok(rank(products))
}

/// The product to publish next, if any product is active.
pub fn select_next<R>(repo: &R) -> ServiceResult<Option<Product>>
where
    R: ProductReader + ?Sized,
{
    Ok(select_candidates(repo)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::MockProductReader;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn product(item_id: &str, post_count: i32, last_posted_at: Option<NaiveDateTime>) -> Product {
        Product {
            id: 0,
            item_id: item_id.into(),
            name: item_id.to_uppercase(),
            price: None,
            image_url: None,
            category: None,
            description: None,
            affiliate_url: None,
            post_count,
            last_posted_at,
            is_active: true,
            created_at: ts(1),
            updated_at: ts(1),
        }
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.item_id.as_str()).collect()
    }

    #[test]
    fn order_is_independent_of_input_order() {
        let a = product("a", 0, None);
        let b = product("b", 2, Some(ts(3)));
        let c = product("c", 0, Some(ts(5)));
        let permutations = [
            vec![a.clone(), b.clone(), c.clone()],
            vec![a.clone(), c.clone(), b.clone()],
            vec![b.clone(), a.clone(), c.clone()],
            vec![b.clone(), c.clone(), a.clone()],
            vec![c.clone(), a.clone(), b.clone()],
            vec![c.clone(), b.clone(), a.clone()],
        ];

        for input in permutations {
            assert_eq!(ids(&rank(input)), vec!["a", "c", "b"]);
        }
    }

    #[test]
    fn oldest_post_breaks_post_count_ties() {
        let ranked = rank(vec![
            product("newer", 1, Some(ts(9))),
            product("older", 1, Some(ts(2))),
        ]);
        assert_eq!(ids(&ranked), vec!["older", "newer"]);
    }

    #[test]
    fn identical_statistics_fall_back_to_item_id() {
        let ranked = rank(vec![product("z", 0, None), product("m", 0, None)]);
        assert_eq!(ids(&ranked), vec!["m", "z"]);
    }

    #[test]
    fn inactive_products_are_skipped() {
        let mut retired = product("retired", 0, None);
        retired.is_active = false;

        let ranked = rank(vec![retired, product("live", 3, Some(ts(1)))]);

        assert_eq!(ids(&ranked), vec!["live"]);
    }

    #[test]
    fn select_next_reads_active_products_only() {
        let mut repo = MockProductReader::new();
        repo.expect_list_products()
            .withf(|query| !query.include_inactive && query.limit.is_none())
            .times(1)
            .returning(|_| Ok(vec![product("b", 1, Some(ts(2))), product("a", 0, None)]));

        let next = select_next(&repo).unwrap();

        assert_eq!(next.map(|p| p.item_id), Some("a".to_string()));
    }

    #[test]
    fn select_next_is_none_without_products() {
        let mut repo = MockProductReader::new();
        repo.expect_list_products().returning(|_| Ok(vec![]));

        assert!(select_next(&repo).unwrap().is_none());
    }
}
