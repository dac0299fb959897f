//! Video categories and supported trending regions

use serde::Serialize;

/// YouTube video categories by id
pub const CATEGORIES: &[(&str, &str)] = &[
    ("1", "Film & Animation"),
    ("2", "Autos & Vehicles"),
    ("10", "Music"),
    ("15", "Pets & Animals"),
    ("17", "Sports"),
    ("18", "Short Movies"),
    ("19", "Travel & Events"),
    ("20", "Gaming"),
    ("21", "Videoblogging"),
    ("22", "People & Blogs"),
    ("23", "Comedy"),
    ("24", "Entertainment"),
    ("25", "News & Politics"),
    ("26", "Howto & Style"),
    ("27", "Education"),
    ("28", "Science & Technology"),
    ("29", "Nonprofits & Activism"),
    ("30", "Movies"),
    ("31", "Anime/Animation"),
    ("32", "Action/Adventure"),
    ("33", "Classics"),
    ("34", "Comedy"),
    ("35", "Documentary"),
    ("36", "Drama"),
    ("37", "Family"),
    ("38", "Foreign"),
    ("39", "Horror"),
    ("40", "Sci-Fi/Fantasy"),
    ("41", "Thriller"),
    ("42", "Shorts"),
    ("43", "Shows"),
    ("44", "Trailers"),
];

/// Regions offered for trending lookups
pub const COUNTRIES: &[(&str, &str)] = &[
    ("US", "United States"),
    ("GB", "United Kingdom"),
    ("CA", "Canada"),
    ("AU", "Australia"),
    ("DE", "Germany"),
    ("FR", "France"),
    ("IT", "Italy"),
    ("ES", "Spain"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("IN", "India"),
    ("BR", "Brazil"),
    ("MX", "Mexico"),
    ("RU", "Russia"),
    ("CN", "China"),
    ("NL", "Netherlands"),
    ("SE", "Sweden"),
    ("NO", "Norway"),
    ("PL", "Poland"),
    ("TR", "Turkey"),
];

pub const DEFAULT_COUNTRY: &str = "US";

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
}

/// Display name for a category id
pub fn category_name(id: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(cid, _)| *cid == id)
        .map(|(_, name)| *name)
}

/// Whether the id is a known category
pub fn is_known_category(id: &str) -> bool {
    category_name(id).is_some()
}

/// All categories sorted by name
pub fn sorted_categories() -> Vec<Category> {
    let mut out: Vec<Category> = CATEGORIES
        .iter()
        .map(|&(id, name)| Category { id, name })
        .collect();
    out.sort_by_key(|c| c.name);
    out
}

pub fn countries() -> Vec<Country> {
    COUNTRIES
        .iter()
        .map(|&(code, name)| Country { code, name })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lookup() {
        assert_eq!(category_name("10"), Some("Music"));
        assert_eq!(category_name("3"), None);
        assert!(is_known_category("44"));
    }

    #[test]
    fn test_sorted_categories() {
        let cats = sorted_categories();
        assert_eq!(cats.len(), CATEGORIES.len());
        assert_eq!(cats[0].name, "Action/Adventure");
        assert!(cats.windows(2).all(|w| w[0].name <= w[1].name));
    }

    #[test]
    fn test_countries_include_default() {
        assert_eq!(countries().len(), 20);
        assert!(COUNTRIES.iter().any(|(c, _)| *c == DEFAULT_COUNTRY));
    }
}
