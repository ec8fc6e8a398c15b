/// Strategy for deriving a display name from a raw listing title.
pub trait NameCleaner: Send + Sync {
    fn clean(&self, raw_title: &str, category_path: &str) -> String;
}

/// Drops title fragments that repeat the category taxonomy.
///
/// The title is split on `-`, `:`, `|` and `>`; the first fragment that does
/// not contain any category segment wins. Falls back to the last fragment,
/// then to the raw title when the pick is shorter than two characters.
/// Best effort: titles that interleave category words with the product
/// name are not untangled.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryPathCleaner;

const TITLE_SEPARATORS: [char; 4] = ['-', ':', '|', '>'];

impl NameCleaner for CategoryPathCleaner {
    fn clean(&self, raw_title: &str, category_path: &str) -> String {
        let segments: Vec<String> = category_path
            .split('>')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let candidates: Vec<&str> = raw_title.split(&TITLE_SEPARATORS[..]).map(str::trim).collect();

        let picked = candidates
            .iter()
            .find(|candidate| {
                let lower = candidate.to_lowercase();
                !segments.iter().any(|segment| lower.contains(segment.as_str()))
            })
            .filter(|candidate| !candidate.is_empty())
            .or_else(|| candidates.last().filter(|candidate| !candidate.is_empty()))
            .copied()
            .unwrap_or(raw_title);

        if picked.chars().count() < 2 {
            raw_title.to_string()
        } else {
            picked.to_string()
        }
    }
}

/// Leaves titles untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCleaner;

impl NameCleaner for PassthroughCleaner {
    fn clean(&self, raw_title: &str, _category_path: &str) -> String {
        raw_title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_category_prefix() {
        let cleaner = CategoryPathCleaner;
        let name = cleaner.clean(
            "Electronics - Apple iPhone 12 64GB",
            "Electronics > Cell Phones",
        );
        assert_eq!(name, "Apple iPhone 12 64GB");
    }

    #[test]
    fn test_first_clean_fragment_wins() {
        let cleaner = CategoryPathCleaner;
        let name = cleaner.clean("Nintendo Switch | Toys: Console", "Toys & Hobbies > toys");
        assert_eq!(name, "Nintendo Switch");
    }

    #[test]
    fn test_falls_back_to_last_fragment() {
        let cleaner = CategoryPathCleaner;
        let name = cleaner.clean("Collectibles: Rare Collectibles Coin", "Collectibles");
        assert_eq!(name, "Rare Collectibles Coin");
    }

    #[test]
    fn test_short_pick_falls_back_to_title() {
        let cleaner = CategoryPathCleaner;
        let name = cleaner.clean("X - Electronics", "Electronics");
        assert_eq!(name, "X - Electronics");
    }

    #[test]
    fn test_title_without_separators() {
        let cleaner = CategoryPathCleaner;
        assert_eq!(cleaner.clean("Sony WH-1000XM4", "misc"), "Sony WH");
        assert_eq!(PassthroughCleaner.clean("Sony WH-1000XM4", "misc"), "Sony WH-1000XM4");
    }
}
