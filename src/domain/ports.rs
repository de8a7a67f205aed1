use crate::domain::model::{ListingCandidate, ProductDetail};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 商品搜尋 API
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// `category` 必須是已正規化的 SearchIndex
    async fn search_items(
        &self,
        category: &str,
        keyword: Option<&str>,
    ) -> Result<Vec<ListingCandidate>>;

    /// 找不到商品時回傳 `Ok(None)`
    async fn get_item(&self, asin: &str) -> Result<Option<ProductDetail>>;
}

/// 社群平台發佈目標
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &str;

    /// 平台的字數上限
    fn char_limit(&self) -> usize;

    async fn publish(&self, text: &str, image_url: Option<&str>) -> Result<()>;
}
