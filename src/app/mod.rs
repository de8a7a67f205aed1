// 依設定組裝執行所需的元件

use crate::adapters::{LocalStorage, PaApiClient, PaApiSettings, ThreadsPublisher, XPublisher};
use crate::config::AppConfig;
use crate::core::api_client::SignedApiClient;
use crate::core::dedup::DedupStore;
use crate::core::dispatch::PublisherDispatch;
use crate::core::engine::{DiscountFinder, RunOptions};
use crate::core::evaluator::DiscountEvaluator;
use crate::core::orchestrator::{DiscountBand, SearchOrchestrator};
use crate::core::signing::RequestSigner;
use crate::domain::ports::Publisher;
use crate::utils::error::Result;
use std::path::Path;

pub type LiveFinder = DiscountFinder<PaApiClient, LocalStorage>;

pub fn build_finder(config: &AppConfig) -> Result<LiveFinder> {
    let search = &config.search;
    let marketplace = config.credentials.require_marketplace()?;

    let signer = RequestSigner::new(
        &marketplace.access_key,
        &marketplace.secret_key,
        &search.marketplace.region,
    );
    let client = SignedApiClient::new(
        &search.marketplace.base_url,
        signer,
        search.retry.clone(),
        search.request_timeout(),
    )?;
    let api = PaApiClient::new(
        client,
        PaApiSettings {
            partner_tag: marketplace.partner_tag.clone(),
            marketplace: search.marketplace.marketplace.clone(),
            item_count: search.marketplace.item_count,
            default_keywords: search.marketplace.default_keywords.clone(),
        },
    );

    let evaluator = DiscountEvaluator::new(
        &search.marketplace.first_party_merchant,
        &search.marketplace.merchant_token,
        &search.marketplace.marketplace,
        &marketplace.partner_tag,
    );
    let orchestrator = SearchOrchestrator::new(
        api,
        evaluator,
        DiscountBand {
            min_percent: search.min_discount_percent,
            max_percent: search.max_discount_percent,
        },
        search.request_interval(),
    );

    let (base_dir, file_name) = split_results_path(&config.results_path);
    let dedup = DedupStore::new(
        LocalStorage::new(base_dir),
        &file_name,
        search.max_retained_results,
    );

    let dispatch = PublisherDispatch::new(
        build_publishers(config)?,
        config.dry_run,
        search.publish_interval(),
    );
    if !dispatch.has_targets() {
        tracing::warn!("⚠️ No publish targets configured, items will only be recorded");
    }

    Ok(DiscountFinder::new(
        orchestrator,
        dedup,
        dispatch,
        search.search_items.clone(),
        RunOptions {
            max_posts: search.max_posts_per_run,
            failed_publish_policy: search.failed_publish_policy,
        },
    ))
}

/// 依憑證啟用的發佈目標，順序固定為 X、Threads
pub fn build_publishers(config: &AppConfig) -> Result<Vec<Box<dyn Publisher>>> {
    let publish = &config.search.publish;
    let timeout = config.search.request_timeout();
    let mut targets: Vec<Box<dyn Publisher>> = Vec::new();

    if let Some(token) = &config.credentials.x_access_token {
        targets.push(Box::new(XPublisher::new(
            &publish.x_api_base,
            token.clone(),
            publish.x_char_limit,
            timeout,
        )?));
    }

    if let Some(threads) = &config.credentials.threads {
        targets.push(Box::new(ThreadsPublisher::new(
            &publish.threads_api_base,
            threads.user_id.clone(),
            threads.access_token.clone(),
            publish.threads_char_limit,
            timeout,
        )?));
    }

    Ok(targets)
}

fn split_results_path(results_path: &str) -> (String, String) {
    let path = Path::new(results_path);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| results_path.to_string());
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    (base_dir, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::credentials::{Credentials, MarketplaceCredentials, ThreadsCredentials};
    use crate::config::search_config::SearchConfig;

    fn config(credentials: Credentials) -> AppConfig {
        AppConfig::new(SearchConfig::default(), credentials, "out/results.json", true)
    }

    #[test]
    fn test_split_results_path() {
        assert_eq!(
            split_results_path("discount_results.json"),
            (".".to_string(), "discount_results.json".to_string())
        );
        assert_eq!(
            split_results_path("data/run/results.json"),
            ("data/run".to_string(), "results.json".to_string())
        );
    }

    #[test]
    fn test_publishers_follow_credentials() {
        let credentials = Credentials {
            marketplace: Some(MarketplaceCredentials::placeholder()),
            x_access_token: None,
            threads: Some(ThreadsCredentials {
                access_token: "th-token".to_string(),
                user_id: "12345".to_string(),
            }),
        };

        let targets = build_publishers(&config(credentials)).unwrap();
        let names: Vec<&str> = targets.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["threads"]);
        assert_eq!(targets[0].char_limit(), 500);
    }

    #[test]
    fn test_build_requires_marketplace_credentials() {
        assert!(build_finder(&config(Credentials::default())).is_err());
        assert!(build_finder(&config(Credentials {
            marketplace: Some(MarketplaceCredentials::placeholder()),
            ..Credentials::default()
        }))
        .is_ok());
    }
}
