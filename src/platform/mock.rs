use async_trait::async_trait;
use mockall::mock;

use super::{PlatformApi, PlatformResult, PublishRequest, StatusReport};
use crate::domain::credential::TokenGrant;

mock! {
    pub PlatformApi {}

    #[async_trait]
    impl PlatformApi for PlatformApi {
        async fn refresh_token(&self, refresh_token: &str) -> PlatformResult<TokenGrant>;
        async fn exchange_code(&self, code: &str, redirect_uri: &str) -> PlatformResult<TokenGrant>;
        async fn init_publish(&self, access_token: &str, request: &PublishRequest) -> PlatformResult<String>;
        async fn fetch_status(&self, access_token: &str, publish_id: &str) -> PlatformResult<StatusReport>;
    }
}
