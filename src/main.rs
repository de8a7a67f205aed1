use clap::Parser;
use discount_finder::config::credentials::{Credentials, MarketplaceCredentials};
use discount_finder::config::search_config::SearchConfig;
use discount_finder::utils::error::{DiscountError, ErrorSeverity};
use discount_finder::utils::logger::{self, LogFormat};
use discount_finder::utils::validation::Validate;
use discount_finder::{build_finder, AppConfig, CliArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // .env 先載入，RUST_LOG 也可以寫在裡面
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(args.verbose, format);

    tracing::info!("Starting discount-finder");
    if dotenv_loaded {
        tracing::debug!("Loaded environment from .env");
    }
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    // 設定檔不存在時寫出預設檔
    let loaded = SearchConfig::load(&args.config);
    if loaded.needs_persist() {
        if let Err(e) = SearchConfig::persist_default(&args.config) {
            tracing::warn!("⚠️ Could not write default config {}: {}", args.config, e);
        }
    }
    let mut search = loaded.into_config();

    if let Err(e) = args.apply_overrides(&mut search) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let mut credentials = if args.relaxed {
        Credentials::from_env_relaxed()
    } else {
        Credentials::from_env().unwrap_or_else(|e| exit_missing_credentials(e))
    };
    if credentials.marketplace.is_none() {
        if args.relaxed {
            tracing::warn!("⚠️ Marketplace credentials missing, API calls will fail (relaxed mode)");
            credentials.marketplace = Some(MarketplaceCredentials::placeholder());
        } else {
            exit_missing_credentials(DiscountError::MissingCredentialError {
                name: "PA_API_KEY".to_string(),
            });
        }
    }

    let targets = credentials.enabled_targets();
    tracing::info!(
        "📋 {} search items, band {:.1}%..{:.1}%, max {} posts, targets: [{}]",
        search.search_items.len(),
        search.min_discount_percent,
        search.max_discount_percent,
        search.max_posts_per_run,
        targets.join(", ")
    );

    let config = AppConfig::new(search, credentials, args.results.clone(), args.dry_run);
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    let mut finder = match build_finder(&config) {
        Ok(finder) => finder,
        Err(e) => {
            tracing::error!("❌ Cannot start: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    match finder.run().await {
        Ok(summary) => {
            println!(
                "✅ Done: {} accepted, {} new, {} published, {} stored in {}",
                summary.accepted, summary.fresh, summary.published, summary.persisted, args.results
            );
        }
        Err(e) => {
            tracing::error!("❌ Run failed: {} (Severity: {:?})", e, e.severity());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());

            // 結果檔寫入失敗視為重試類錯誤
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium | ErrorSeverity::High => 2,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn exit_missing_credentials(e: DiscountError) -> ! {
    tracing::error!("❌ {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(1);
}
