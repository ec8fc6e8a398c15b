use super::item::Marketplace;

pub const BUCKETS: [&str; 4] = ["electronics", "collectibles", "clothing", "toys"];
pub const DEFAULT_BUCKET: &str = "electronics";

const PLACEHOLDER_THUMBNAIL: &str = "https://picsum.photos/100/100?text=No+Image";
const LOCAL_IMAGE_DIR: &str = "flatten_images/";

/// Map a marketplace category name onto one of the coarse buckets.
pub fn map_category(category: &str, marketplace: &Marketplace) -> &'static str {
    let category = category.trim().to_lowercase();
    let mapped = match marketplace {
        Marketplace::Ebay => match category.as_str() {
            "cell phones & accessories" | "electronics" => Some("electronics"),
            "collectibles" => Some("collectibles"),
            "clothing, shoes & accessories" => Some("clothing"),
            "toys & hobbies" => Some("toys"),
            _ => None,
        },
        Marketplace::Amazon => match category.as_str() {
            "electronics" => Some("electronics"),
            "toys & games" => Some("toys"),
            "clothing" => Some("clothing"),
            "collectibles" => Some("collectibles"),
            _ => None,
        },
        Marketplace::Mock | Marketplace::Other(_) => {
            BUCKETS.iter().copied().find(|bucket| *bucket == category)
        }
    };
    mapped.unwrap_or(DEFAULT_BUCKET)
}

/// Bucket for a full `" > "` category path, keyed on its first segment.
pub fn bucket_for(category_path: &str, marketplace: &Marketplace) -> &'static str {
    let top = category_path.split('>').next().unwrap_or_default();
    map_category(top, marketplace)
}

/// Typical time to resell an item on a marketplace.
pub fn sell_time(marketplace: &Marketplace, bucket: &str) -> &'static str {
    let bucket = bucket.to_lowercase();
    match marketplace {
        Marketplace::Ebay => match bucket.as_str() {
            "electronics" | "toys" => "3-7 days",
            "collectibles" => "1-3 weeks",
            _ => "1-2 weeks",
        },
        Marketplace::Amazon => match bucket.as_str() {
            "electronics" | "toys" => "1-2 weeks",
            "collectibles" => "2-4 weeks",
            _ => "1-3 weeks",
        },
        Marketplace::Mock | Marketplace::Other(_) => match bucket.as_str() {
            "electronics" | "toys" => "1-2 weeks",
            "collectibles" => "2-4 weeks",
            "clothing" => "1-3 weeks",
            _ => "Unknown",
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    Purple,
    Blue,
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn for_score(confidence: f64) -> Self {
        if confidence >= 95.0 {
            ConfidenceTier::Purple
        } else if confidence >= 85.0 {
            ConfidenceTier::Blue
        } else if confidence > 80.0 {
            ConfidenceTier::High
        } else if confidence >= 50.0 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::Purple => "confidence-purple",
            ConfidenceTier::Blue => "confidence-blue",
            ConfidenceTier::High => "confidence-high",
            ConfidenceTier::Medium => "confidence-medium",
            ConfidenceTier::Low => "confidence-low",
        }
    }
}

pub fn profit_label(profit: f64) -> &'static str {
    if profit > 0.0 {
        "profit-high"
    } else {
        "profit-low"
    }
}

/// Resolve the thumbnail to show: absolute URLs pass through, relative paths
/// point into the flattened local image directory.
pub fn thumbnail_url(image: Option<&str>, images: &[String]) -> String {
    let thumb = image
        .filter(|s| !s.is_empty())
        .or_else(|| images.first().map(String::as_str).filter(|s| !s.is_empty()));

    match thumb {
        Some(url) if url.starts_with("http") => url.to_string(),
        Some(path) => {
            let file = path.rsplit('/').next().unwrap_or(path);
            format!("{}{}", LOCAL_IMAGE_DIR, file)
        }
        None => PLACEHOLDER_THUMBNAIL.to_string(),
    }
}
