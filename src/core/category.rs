/// 找不到對應時使用的 SearchIndex
pub const FALLBACK_CATEGORY: &str = "All";

/// amazon.co.jp 的有效 SearchIndex
const SEARCH_INDEXES: &[&str] = &[
    "All",
    "AmazonVideo",
    "Apparel",
    "Appliances",
    "Automotive",
    "Baby",
    "Beauty",
    "Books",
    "Classical",
    "Computers",
    "CreditCards",
    "DigitalMusic",
    "Electronics",
    "EverythingElse",
    "Fashion",
    "FashionBaby",
    "FashionMen",
    "FashionWomen",
    "ForeignBooks",
    "GiftCards",
    "GroceryAndGourmetFood",
    "HealthPersonalCare",
    "Hobbies",
    "HomeAndKitchen",
    "Industrial",
    "Jewelry",
    "KindleStore",
    "MobileApps",
    "MoviesAndTV",
    "Music",
    "MusicalInstruments",
    "OfficeProducts",
    "PetSupplies",
    "Shoes",
    "Software",
    "SportsAndOutdoors",
    "ToolsAndHomeImprovement",
    "Toys",
    "VideoGames",
    "Watches",
];

/// 舊設定檔沿用的別名
const ALIASES: &[(&str, &str)] = &[
    ("kitchen", "HomeAndKitchen"),
    ("home", "HomeAndKitchen"),
    ("health", "HealthPersonalCare"),
    ("healthandbeauty", "HealthPersonalCare"),
    ("grocery", "GroceryAndGourmetFood"),
    ("food", "GroceryAndGourmetFood"),
    ("sports", "SportsAndOutdoors"),
    ("outdoors", "SportsAndOutdoors"),
    ("tools", "ToolsAndHomeImprovement"),
    ("diy", "ToolsAndHomeImprovement"),
    ("games", "VideoGames"),
    ("pets", "PetSupplies"),
    ("pet", "PetSupplies"),
    ("office", "OfficeProducts"),
    ("kindle", "KindleStore"),
    ("movies", "MoviesAndTV"),
    ("dvd", "MoviesAndTV"),
    ("car", "Automotive"),
    ("instruments", "MusicalInstruments"),
    ("pc", "Computers"),
    ("toy", "Toys"),
    ("clothing", "Apparel"),
];

/// 將使用者輸入的分類轉為 SearchIndex。未知的分類回傳 `All` 並記錄警告。
pub fn normalize(label: &str) -> &'static str {
    let key = label.trim();

    if let Some(index) = SEARCH_INDEXES
        .iter()
        .copied()
        .find(|index| index.eq_ignore_ascii_case(key))
    {
        return index;
    }

    let lowered = key.to_ascii_lowercase();
    if let Some((_, index)) = ALIASES.iter().copied().find(|(alias, _)| *alias == lowered) {
        tracing::debug!("🏷️ Category alias '{}' -> {}", label, index);
        return index;
    }

    tracing::warn!(
        "⚠️ Unknown category '{}', falling back to {}",
        label,
        FALLBACK_CATEGORY
    );
    FALLBACK_CATEGORY
}

pub fn is_known(label: &str) -> bool {
    let lowered = label.trim().to_ascii_lowercase();
    SEARCH_INDEXES
        .iter()
        .any(|index| index.eq_ignore_ascii_case(&lowered))
        || ALIASES.iter().any(|(alias, _)| *alias == lowered)
}
