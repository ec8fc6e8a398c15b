use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::item::{Marketplace, NormalizedItem};
use super::name_cleaner::{CategoryPathCleaner, NameCleaner};
use crate::api::{SearchResult, SourceKind};
use crate::core::{round2, FlipperError, Result};

pub const DEFAULT_CONFIDENCE: f64 = 75.0;
pub const STARTING_BID_RATIO: f64 = 0.8;

const TITLE_FIELDS: [&str; 4] = ["title", "Title", "name", "productName"];
const UNKNOWN_ITEM: &str = "Unknown Item";
const DEFAULT_CATEGORY: &str = "misc";
const SEARCH_CATEGORY: &str = "Electronics";

/// Maps raw marketplace records of any supported shape onto `NormalizedItem`.
#[derive(Clone)]
pub struct Normalizer {
    cleaner: Arc<dyn NameCleaner>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Arc::new(CategoryPathCleaner))
    }
}

impl Normalizer {
    pub fn new(cleaner: Arc<dyn NameCleaner>) -> Self {
        Self { cleaner }
    }

    /// Normalize a whole document, skipping records that cannot be mapped.
    /// Returns the items and the number of skipped records.
    pub fn normalize_all(&self, kind: SourceKind, raw_items: &[Value]) -> (Vec<NormalizedItem>, usize) {
        let mut items = Vec::with_capacity(raw_items.len());
        let mut skipped = 0;

        for (index, raw) in raw_items.iter().enumerate() {
            match self.normalize(kind, raw) {
                Ok(item) => items.push(item),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping {} record #{}: {}", kind.name(), index, e);
                }
            }
        }

        (items, skipped)
    }

    pub fn normalize(&self, kind: SourceKind, raw: &Value) -> Result<NormalizedItem> {
        let record = raw
            .as_object()
            .ok_or_else(|| FlipperError::Parse(format!("expected an object, got {}", type_name(raw))))?;

        let raw_title = TITLE_FIELDS
            .iter()
            .find_map(|field| non_empty_str(record.get(*field)))
            .unwrap_or(UNKNOWN_ITEM);

        let category_path = non_empty_str(record.get("categoryPath"))
            .or_else(|| non_empty_str(raw.pointer("/primaryCategory/categoryName")))
            .or_else(|| non_empty_str(record.get("categoryName")))
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();

        let item_name = self.cleaner.clean(raw_title, &category_path);

        let marketplace = non_empty_str(record.get("marketplace"))
            .map(Marketplace::from)
            .unwrap_or_else(|| Marketplace::from(kind.default_marketplace()));

        let (price, native_id) = match kind {
            SourceKind::Amazon => (amazon_price(raw), id_value(record.get("ASIN"))),
            _ => (
                record.get("price").and_then(parse_price).unwrap_or(0.0),
                None,
            ),
        };
        let price = sanitize_price(price);
        if price == 0.0 {
            tracing::warn!("⚠️  {} record '{}' has no usable price", kind.name(), raw_title);
        }

        let native_id = native_id
            .or_else(|| id_value(record.get("itemId")))
            .or_else(|| id_value(record.get("id")));
        let id = native_id.unwrap_or_else(|| synthesize_id(&marketplace, &item_name, &category_path));

        let confidence = record
            .get("confidenceScore")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 100.0))
            .unwrap_or(DEFAULT_CONFIDENCE);

        let starting_bid = record
            .get("startingBid")
            .and_then(parse_price)
            .unwrap_or_else(|| round2(price * STARTING_BID_RATIO));
        let suggested_max_bid = record
            .get("suggestedMaxBid")
            .and_then(parse_price)
            .unwrap_or(price);

        let images: Vec<String> = record
            .get("images")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let (image, images) = pair_images(non_empty_str(record.get("image")).map(str::to_string), images);

        Ok(NormalizedItem {
            item_name,
            category_path,
            price,
            confidence,
            marketplace,
            id,
            starting_bid,
            suggested_max_bid,
            image,
            images,
        })
    }

    /// Map proxy search rows. Every row maps; an unparsable price becomes 0.
    pub fn normalize_search(&self, results: &[SearchResult]) -> Vec<NormalizedItem> {
        results
            .iter()
            .map(|result| {
                let raw_title = if result.title.trim().is_empty() {
                    UNKNOWN_ITEM
                } else {
                    result.title.as_str()
                };
                let item_name = self.cleaner.clean(raw_title, SEARCH_CATEGORY);
                let price = sanitize_price(parse_price_str(&result.price).unwrap_or(0.0));
                let marketplace = Marketplace::from(SourceKind::Search.default_marketplace());
                let id = synthesize_id(&marketplace, &item_name, SEARCH_CATEGORY);
                let image = result.image.clone().filter(|s| !s.is_empty());
                let (image, images) = pair_images(image, Vec::new());

                NormalizedItem {
                    item_name,
                    category_path: SEARCH_CATEGORY.to_string(),
                    price,
                    confidence: DEFAULT_CONFIDENCE,
                    marketplace,
                    id,
                    starting_bid: round2(price * STARTING_BID_RATIO),
                    suggested_max_bid: price,
                    image,
                    images,
                }
            })
            .collect()
    }
}

/// `ListPrice.Amount` is in minor units; `Offers[0].Price` is the fallback.
fn amazon_price(raw: &Value) -> f64 {
    raw.pointer("/ListPrice/Amount")
        .and_then(parse_price)
        .filter(|amount| *amount != 0.0)
        .map(|amount| amount / 100.0)
        .or_else(|| raw.pointer("/Offers/0/Price").and_then(parse_price))
        .unwrap_or(0.0)
}

/// Accepts numbers, currency strings ("$1,299.99") and `{value}` objects.
pub fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price_str(s),
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("amount"))
            .and_then(parse_price),
        _ => None,
    }
}

pub fn parse_price_str(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(|c: char| !(c.is_ascii_digit() || c == '-' || c == '.'))
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok()
}

fn sanitize_price(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
        price
    } else {
        0.0
    }
}

fn pair_images(image: Option<String>, images: Vec<String>) -> (Option<String>, Vec<String>) {
    let image = image.or_else(|| images.first().cloned());
    let images = if images.is_empty() {
        image.iter().cloned().collect()
    } else {
        images
    };
    (image, images)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// String or numeric identifier; blank strings count as absent.
pub(crate) fn id_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Short hex digest over the given parts, separated so that
/// ("ab", "c") and ("a", "bc") differ.
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

/// Identifier for records without one: marketplace prefix, slugged name and
/// a content hash, so repeated loads of the same record agree.
pub fn synthesize_id(marketplace: &Marketplace, item_name: &str, category_path: &str) -> String {
    let hash = content_hash(&[marketplace.as_str(), &item_name.to_lowercase(), &category_path.to_lowercase()]);
    format!("{}-{}-{}", marketplace, slugify(item_name), hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scored_item_mapping() {
        let normalizer = Normalizer::default();
        let raw = json!({
            "title": "Electronics - Apple iPhone 12",
            "categoryPath": "Electronics > Cell Phones",
            "price": 250.0,
            "confidenceScore": 88,
            "marketplace": "ebay",
            "itemId": "v1|1234|0",
            "image": "https://img/phone.jpg"
        });

        let item = normalizer.normalize(SourceKind::Scored, &raw).unwrap();
        assert_eq!(item.item_name, "Apple iPhone 12");
        assert_eq!(item.price, 250.0);
        assert_eq!(item.confidence, 88.0);
        assert_eq!(item.id, "v1|1234|0");
        assert_eq!(item.starting_bid, 200.0);
        assert_eq!(item.suggested_max_bid, 250.0);
        assert_eq!(item.images, vec!["https://img/phone.jpg".to_string()]);
    }

    #[test]
    fn test_missing_confidence_defaults_to_75() {
        let normalizer = Normalizer::default();
        let item = normalizer
            .normalize(SourceKind::Scored, &json!({"title": "Widget", "price": 5}))
            .unwrap();
        assert_eq!(item.confidence, 75.0);
        assert_eq!(item.category_path, "misc");
        assert_eq!(item.marketplace, Marketplace::Ebay);
    }

    #[test]
    fn test_confidence_clamped_to_range() {
        let normalizer = Normalizer::default();
        let high = normalizer
            .normalize(SourceKind::Scored, &json!({"title": "A", "confidenceScore": 140}))
            .unwrap();
        let low = normalizer
            .normalize(SourceKind::Scored, &json!({"title": "B", "confidenceScore": -3}))
            .unwrap();
        assert_eq!(high.confidence, 100.0);
        assert_eq!(low.confidence, 0.0);
    }

    #[test]
    fn test_amazon_list_price_in_cents() {
        let normalizer = Normalizer::default();
        let raw = json!({
            "Title": "Echo Dot (4th Gen)",
            "ASIN": "B07XJ8C8F5",
            "ListPrice": {"Amount": 4999},
            "categoryName": "Electronics"
        });

        let item = normalizer.normalize(SourceKind::Amazon, &raw).unwrap();
        assert_eq!(item.price, 49.99);
        assert_eq!(item.id, "B07XJ8C8F5");
        assert_eq!(item.marketplace, Marketplace::Amazon);
        assert_eq!(item.starting_bid, 39.99);
    }

    #[test]
    fn test_amazon_falls_back_to_offer_price() {
        let normalizer = Normalizer::default();
        let raw = json!({"Title": "Lego Set", "Offers": [{"Price": 19.5}]});
        let item = normalizer.normalize(SourceKind::Amazon, &raw).unwrap();
        assert_eq!(item.price, 19.5);

        let bare = normalizer.normalize(SourceKind::Amazon, &json!({"Title": "Nothing"})).unwrap();
        assert_eq!(bare.price, 0.0);
    }

    #[test]
    fn test_amazon_fields_read_independently() {
        let normalizer = Normalizer::default();
        let raw = json!({
            "Title": "Echo Dot",
            "ASIN": "B07XJ8C8F5",
            "ListPrice": {"Amount": 4999},
            "Offers": null
        });
        let item = normalizer.normalize(SourceKind::Amazon, &raw).unwrap();
        assert_eq!(item.price, 49.99);
        assert_eq!(item.id, "B07XJ8C8F5");

        let string_offer = json!({"Title": "Lego Set", "Offers": [{"Price": "19.99"}]});
        let item = normalizer.normalize(SourceKind::Amazon, &string_offer).unwrap();
        assert_eq!(item.price, 19.99);

        let numeric_asin = json!({"Title": "Kindle", "ASIN": 12345, "ListPrice": {"Amount": "8999"}});
        let item = normalizer.normalize(SourceKind::Amazon, &numeric_asin).unwrap();
        assert_eq!(item.id, "12345");
        assert_eq!(item.price, 89.99);
    }

    #[test]
    fn test_price_strings() {
        assert_eq!(parse_price_str("$12.99"), Some(12.99));
        assert_eq!(parse_price_str("US $1,299.00"), Some(1299.0));
        assert_eq!(parse_price_str("free"), None);
        assert_eq!(parse_price(&json!({"value": "8.50", "currency": "USD"})), Some(8.5));
    }

    #[test]
    fn test_non_object_records_are_skipped() {
        let normalizer = Normalizer::default();
        let raw = vec![json!({"title": "Good"}), json!("bad"), json!(42)];
        let (items, skipped) = normalizer.normalize_all(SourceKind::Ebay, &raw);
        assert_eq!(items.len(), 1);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_synthesized_ids_are_stable() {
        let normalizer = Normalizer::default();
        let raw = json!({"title": "Retro Console", "categoryPath": "Toys & Hobbies"});
        let first = normalizer.normalize(SourceKind::Scored, &raw).unwrap();
        let second = normalizer.normalize(SourceKind::Scored, &raw).unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.id.starts_with("ebay-retro-console-"));
    }

    #[test]
    fn test_search_results() {
        let normalizer = Normalizer::default();
        let results = vec![SearchResult {
            title: "Canon EOS Rebel".to_string(),
            price: "$310.00".to_string(),
            image: Some("https://img/cam.jpg".to_string()),
        }];

        let items = normalizer.normalize_search(&results);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, 310.0);
        assert_eq!(items[0].starting_bid, 248.0);
        assert_eq!(items[0].category_path, "Electronics");
        assert_eq!(items[0].confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Apple iPhone 12 (64GB)"), "apple-iphone-12-64gb");
        assert_eq!(slugify("  --  "), "");
    }
}
