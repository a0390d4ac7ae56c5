use chrono::NaiveDateTime;
use mockall::mock;

use super::{
    PostLogReader, PostLogWriter, ProductReader, ProductWriter, RepositoryResult,
    ResearchLogReader, ResearchLogWriter,
};
use crate::domain::{
    post::{NewPostLog, PostLog},
    product::{NewProduct, Product, ProductListQuery},
    research::{NewResearchLog, ResearchLog},
};

mock! {
    pub ProductReader {}

    impl ProductReader for ProductReader {
        fn get_product_by_item_id(&self, item_id: &str) -> RepositoryResult<Option<Product>>;
        fn list_products(&self, query: ProductListQuery) -> RepositoryResult<Vec<Product>>;
    }
}

mock! {
    pub ProductWriter {}

    impl ProductWriter for ProductWriter {
        fn upsert_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
        fn record_successful_post(&self, item_id: &str, posted_at: NaiveDateTime) -> RepositoryResult<Product>;
        fn set_product_active(&self, item_id: &str, is_active: bool) -> RepositoryResult<Product>;
    }
}

mock! {
    pub PostLogReader {}

    impl PostLogReader for PostLogReader {
        fn list_recent_posts(&self, limit: usize) -> RepositoryResult<Vec<PostLog>>;
    }
}

mock! {
    pub PostLogWriter {}

    impl PostLogWriter for PostLogWriter {
        fn append_post_log(&self, entry: &NewPostLog) -> RepositoryResult<PostLog>;
    }
}

mock! {
    pub ResearchLogReader {}

    impl ResearchLogReader for ResearchLogReader {
        fn latest_research(&self) -> RepositoryResult<Option<ResearchLog>>;
    }
}

mock! {
    pub ResearchLogWriter {}

    impl ResearchLogWriter for ResearchLogWriter {
        fn append_research_log(&self, entry: &NewResearchLog) -> RepositoryResult<ResearchLog>;
    }
}

/// Repository double combining every reader and writer mock, for services
/// that need more than one capability.
#[derive(Default)]
pub struct MockStore {
    pub product_reader: MockProductReader,
    pub product_writer: MockProductWriter,
    pub post_reader: MockPostLogReader,
    pub post_writer: MockPostLogWriter,
    pub research_reader: MockResearchLogReader,
    pub research_writer: MockResearchLogWriter,
}

impl ProductReader for MockStore {
    fn get_product_by_item_id(&self, item_id: &str) -> RepositoryResult<Option<Product>> {
        self.product_reader.get_product_by_item_id(item_id)
    }

    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<Vec<Product>> {
        self.product_reader.list_products(query)
    }
}

impl ProductWriter for MockStore {
    fn upsert_product(&self, new_product: &NewProduct) -> RepositoryResult<Product> {
        self.product_writer.upsert_product(new_product)
    }

    fn record_successful_post(
        &self,
        item_id: &str,
        posted_at: NaiveDateTime,
    ) -> RepositoryResult<Product> {
        self.product_writer.record_successful_post(item_id, posted_at)
    }

    fn set_product_active(&self, item_id: &str, is_active: bool) -> RepositoryResult<Product> {
        self.product_writer.set_product_active(item_id, is_active)
    }
}

impl PostLogReader for MockStore {
    fn list_recent_posts(&self, limit: usize) -> RepositoryResult<Vec<PostLog>> {
        self.post_reader.list_recent_posts(limit)
    }
}

impl PostLogWriter for MockStore {
    fn append_post_log(&self, entry: &NewPostLog) -> RepositoryResult<PostLog> {
        self.post_writer.append_post_log(entry)
    }
}

impl ResearchLogReader for MockStore {
    fn latest_research(&self) -> RepositoryResult<Option<ResearchLog>> {
        self.research_reader.latest_research()
    }
}

impl ResearchLogWriter for MockStore {
    fn append_research_log(&self, entry: &NewResearchLog) -> RepositoryResult<ResearchLog> {
        self.research_writer.append_research_log(entry)
    }
}
