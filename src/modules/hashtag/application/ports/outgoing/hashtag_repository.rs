use async_trait::async_trait;

use crate::hashtag::application::domain::entities::Hashtag;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store_error::StoreError;

#[async_trait]
pub trait HashtagRepository: Send + Sync {
    /// Hashtags with at least one post, most used first.
    async fn trending(&self, page: PageRequest) -> Result<PageResult<Hashtag>, StoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Hashtag>, StoreError>;
}
