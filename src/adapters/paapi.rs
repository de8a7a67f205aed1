use crate::core::api_client::{ApiOperation, SignedApiClient};
use crate::domain::model::{ListingCandidate, ProductDetail};
use crate::domain::ports::MarketplaceApi;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const SEARCH_RESOURCES: &[&str] = &[
    "ItemInfo.Title",
    "ItemInfo.ByLineInfo",
    "Offers.Listings.Price",
    "Images.Primary.Small",
];

const DETAIL_RESOURCES: &[&str] = &[
    "ItemInfo.Title",
    "Offers.Listings.Price",
    "Offers.Listings.SavingBasis",
    "Offers.Listings.MerchantInfo",
    "Images.Primary.Medium",
];

/// 搜尋與查詢時共用的市場參數
#[derive(Debug, Clone)]
pub struct PaApiSettings {
    pub partner_tag: String,
    pub marketplace: String,
    pub item_count: u32,
    pub default_keywords: String,
}

/// Product Advertising API 5.0 的 `MarketplaceApi` 實作
pub struct PaApiClient {
    client: SignedApiClient,
    settings: PaApiSettings,
}

impl PaApiClient {
    pub fn new(client: SignedApiClient, settings: PaApiSettings) -> Self {
        Self { client, settings }
    }

    fn search_payload(&self, category: &str, keyword: Option<&str>) -> serde_json::Value {
        json!({
            "Resources": SEARCH_RESOURCES,
            "PartnerTag": self.settings.partner_tag,
            "PartnerType": "Associates",
            "Marketplace": self.settings.marketplace,
            "SearchIndex": category,
            "ItemCount": self.settings.item_count,
            "Keywords": keyword.unwrap_or(&self.settings.default_keywords),
            "Availability": "Available",
            "SortBy": "Price:LowToHigh",
        })
    }

    fn detail_payload(&self, asin: &str) -> serde_json::Value {
        json!({
            "ItemIds": [asin],
            "Resources": DETAIL_RESOURCES,
            "PartnerTag": self.settings.partner_tag,
            "PartnerType": "Associates",
            "Marketplace": self.settings.marketplace,
        })
    }
}

#[async_trait]
impl MarketplaceApi for PaApiClient {
    async fn search_items(
        &self,
        category: &str,
        keyword: Option<&str>,
    ) -> Result<Vec<ListingCandidate>> {
        let payload = self.search_payload(category, keyword);
        let value = self.client.call(ApiOperation::SearchItems, &payload).await?;

        let response: SearchItemsResponse = match serde_json::from_value(value) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("🕳️ Unexpected SearchItems shape for {}: {}", category, e);
                return Ok(Vec::new());
            }
        };

        Ok(response
            .search_result
            .map(|result| result.items)
            .unwrap_or_default()
            .into_iter()
            .filter(|item| !item.asin.is_empty())
            .map(|item| ListingCandidate {
                title: item.title(),
                asin: item.asin,
            })
            .collect())
    }

    async fn get_item(&self, asin: &str) -> Result<Option<ProductDetail>> {
        let payload = self.detail_payload(asin);
        let value = self.client.call(ApiOperation::GetItems, &payload).await?;

        let response: GetItemsResponse = match serde_json::from_value(value) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("🕳️ Insufficient data for {}, skipping: {}", asin, e);
                return Ok(None);
            }
        };

        let item = response
            .items_result
            .and_then(|result| result.items.into_iter().next());

        Ok(item.map(ApiItem::into_detail))
    }
}

#[derive(Debug, Deserialize)]
struct SearchItemsResponse {
    #[serde(rename = "SearchResult")]
    search_result: Option<ItemList>,
}

#[derive(Debug, Deserialize)]
struct GetItemsResponse {
    #[serde(rename = "ItemsResult")]
    items_result: Option<ItemList>,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(rename = "Items", default)]
    items: Vec<ApiItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiItem {
    #[serde(rename = "ASIN", default)]
    asin: String,
    #[serde(rename = "DetailPageURL")]
    detail_page_url: Option<String>,
    item_info: Option<ItemInfo>,
    offers: Option<Offers>,
    images: Option<Images>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemInfo {
    title: Option<DisplayValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DisplayValue {
    display_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Offers {
    #[serde(default)]
    listings: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Listing {
    price: Option<Price>,
    saving_basis: Option<Money>,
    merchant_info: Option<MerchantInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Price {
    amount: Option<f64>,
    savings: Option<Money>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Money {
    amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MerchantInfo {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Images {
    primary: Option<PrimaryImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PrimaryImage {
    medium: Option<ImageRef>,
    small: Option<ImageRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImageRef {
    #[serde(rename = "URL")]
    url: Option<String>,
}

impl ApiItem {
    fn title(&self) -> Option<String> {
        self.item_info
            .as_ref()
            .and_then(|info| info.title.as_ref())
            .and_then(|title| title.display_value.clone())
    }

    fn image_url(&self) -> Option<String> {
        let primary = self.images.as_ref()?.primary.as_ref()?;
        primary
            .medium
            .as_ref()
            .or(primary.small.as_ref())
            .and_then(|image| image.url.clone())
    }

    fn into_detail(self) -> ProductDetail {
        let title = self.title();
        let image_url = self.image_url();
        let listing = self.offers.and_then(|offers| offers.listings.into_iter().next());

        let (current_price, original_price, merchant) = match listing {
            Some(listing) => {
                let current = listing.price.as_ref().and_then(|p| p.amount);
                // 原價優先取 SavingBasis，否則以現價加折扣額推算
                let original = listing
                    .saving_basis
                    .as_ref()
                    .and_then(|basis| basis.amount)
                    .or_else(|| {
                        let savings = listing
                            .price
                            .as_ref()
                            .and_then(|p| p.savings.as_ref())
                            .and_then(|s| s.amount)?;
                        current.map(|c| c + savings)
                    });
                (
                    current,
                    original,
                    listing.merchant_info.and_then(|m| m.name),
                )
            }
            None => (None, None, None),
        };

        ProductDetail {
            asin: self.asin,
            title,
            current_price,
            original_price,
            merchant,
            image_url,
            detail_page_url: self.detail_page_url,
        }
    }
}
