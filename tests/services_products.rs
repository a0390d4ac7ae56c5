use shop_poster::forms::products::ImportProductsForm;
use shop_poster::repository::{DieselRepository, ProductReader, ProductWriter};
use shop_poster::services::ServiceError;
use shop_poster::services::products::{deactivate_product, import_products};
use shop_poster::services::rotation::select_next;

mod common;

const CATALOGUE: &str = "\
item_id,item_name,price,image_url,category,description,affiliate_url
p1,Portable Neck Fan,2980,https://x/fan.jpg,Gadgets,Hands-free cooling,https://shop/p1
p2,Thermo Mug,1200,https://x/mug.jpg,Kitchen,,https://shop/p2
,Nameless,100,,,,
";

#[test]
fn test_import_then_reimport_keeps_history() {
    let test_db = common::TestDb::new("test_import_then_reimport.db");
    let repo = DieselRepository::new(test_db.pool());

    let report = import_products(&repo, ImportProductsForm::new(CATALOGUE.into())).unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.failed, 1);

    let posted_at = chrono::NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    repo.record_successful_post("p1", posted_at).unwrap();

    let again = import_products(&repo, ImportProductsForm::new(CATALOGUE.into())).unwrap();
    assert_eq!(again.imported, 2);

    let p1 = repo.get_product_by_item_id("p1").unwrap().unwrap();
    assert_eq!(p1.post_count, 1);
    assert_eq!(p1.last_posted_at, Some(posted_at));
    assert_eq!(p1.description.as_deref(), Some("Hands-free cooling"));

    assert_eq!(select_next(&repo).unwrap().unwrap().item_id, "p2");
}

#[test]
fn test_deactivate_removes_product_from_rotation() {
    let test_db = common::TestDb::new("test_deactivate_removes_product.db");
    let repo = DieselRepository::new(test_db.pool());
    import_products(&repo, ImportProductsForm::new(CATALOGUE.into())).unwrap();

    deactivate_product(&repo, "p1").unwrap();
    deactivate_product(&repo, "p2").unwrap();

    assert!(select_next(&repo).unwrap().is_none());
    assert!(matches!(
        deactivate_product(&repo, "missing"),
        Err(ServiceError::NotFound)
    ));
}
