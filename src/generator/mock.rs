use async_trait::async_trait;
use mockall::mock;

use super::{GeneratorError, TextGenerator};

mock! {
    pub TextGenerator {}

    #[async_trait]
    impl TextGenerator for TextGenerator {
        async fn complete(&self, prompt: &str) -> Result<String, GeneratorError>;
    }
}
