use crate::config::search_config::{SearchConfig, DEFAULT_CONFIG_FILE};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;

pub const DEFAULT_RESULTS_FILE: &str = "discount_results.json";

#[derive(Debug, Clone, Parser)]
#[command(name = "discount-finder")]
#[command(about = "Find discounted first-party Amazon listings and announce them on X and Threads")]
pub struct CliArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    #[arg(long, default_value = DEFAULT_RESULTS_FILE)]
    pub results: String,

    #[arg(long, help = "Build and log messages without posting")]
    pub dry_run: bool,

    #[arg(long)]
    pub min_discount: Option<f64>,

    #[arg(long)]
    pub max_discount: Option<f64>,

    #[arg(long)]
    pub max_posts: Option<usize>,

    #[arg(long, help = "Continue with placeholder marketplace credentials when they are missing")]
    pub relaxed: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliArgs {
    /// 命令列參數優先於設定檔
    pub fn apply_overrides(&self, config: &mut SearchConfig) -> Result<()> {
        if let Some(min) = self.min_discount {
            config.min_discount_percent = min;
        }
        if let Some(max) = self.max_discount {
            config.max_discount_percent = max;
        }
        if let Some(max_posts) = self.max_posts {
            config.max_posts_per_run = max_posts;
        }
        config.validate()
    }
}
