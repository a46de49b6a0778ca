//! Image registry: symbolic image keys mapped to display metadata and the
//! URL currently in use.
//!
//! [`default_registry`] is the hardcoded table the site ships with. The
//! backend may override any entry; the merged result lives in the resolver.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// ImageEntry
// ---------------------------------------------------------------------------

/// One manageable image on the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Stable key, unique within a registry.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Absolute URL, root-relative path, or empty.
    #[serde(default)]
    pub current_url: String,
    /// Human-readable usage sites, display only.
    #[serde(default)]
    pub locations: Vec<String>,
    /// Free-text dimension hint, e.g. `1920x1080px`.
    #[serde(default)]
    pub recommended_size: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// Set by backends that track whether the URL is a deliberate override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_custom: Option<bool>,
}

impl ImageEntry {
    /// Minimal entry for a key the defaults do not know about.
    pub fn bare(id: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            current_url: url.to_string(),
            locations: Vec::new(),
            recommended_size: String::new(),
            category: String::new(),
            updated_at: None,
            is_custom: None,
        }
    }

    /// `true` when the entry points at something renderable.
    pub fn has_url(&self) -> bool {
        !self.current_url.trim().is_empty()
    }

    /// Replace the URL and stamp `updated_at`.
    pub fn touch_url(&mut self, url: &str, now: Timestamp) {
        self.current_url = url.to_string();
        self.updated_at = Some(now);
    }

    /// Replace the display metadata and stamp `updated_at`.
    pub fn touch_metadata(&mut self, name: &str, description: &str, now: Timestamp) {
        self.name = name.to_string();
        self.description = description.to_string();
        self.updated_at = Some(now);
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Mapping from image key to [`ImageEntry`]. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry(BTreeMap<String, ImageEntry>);

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ImageEntry> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ImageEntry> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, entry: ImageEntry) -> Option<ImageEntry> {
        self.0.insert(entry.id.clone(), entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<ImageEntry> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The entry's URL when present and non-empty.
    pub fn url_of(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .filter(|entry| entry.has_url())
            .map(|entry| entry.current_url.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ImageEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Distinct non-empty categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .0
            .values()
            .map(|entry| entry.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ImageEntry> for Registry {
    fn from_iter<I: IntoIterator<Item = ImageEntry>>(iter: I) -> Self {
        Self(iter.into_iter().map(|e| (e.id.clone(), e)).collect())
    }
}

impl IntoIterator for Registry {
    type Item = (String, ImageEntry);
    type IntoIter = std::collections::btree_map::IntoIter<String, ImageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const PEXELS_TOOLS: &str = "https://images.pexels.com/photos/162553/keys-workshop-mechanic-tools-162553.jpeg";
const PEXELS_1148820: &str = "https://images.pexels.com/photos/1148820/pexels-photo-1148820.jpeg";
const PEXELS_236705: &str = "https://images.pexels.com/photos/236705/pexels-photo-236705.jpeg";
const PEXELS_1216589: &str = "https://images.pexels.com/photos/1216589/pexels-photo-1216589.jpeg";
const PEXELS_257736: &str = "https://images.pexels.com/photos/257736/pexels-photo-257736.jpeg";
const PEXELS_280221: &str = "https://images.pexels.com/photos/280221/pexels-photo-280221.jpeg";
const PEXELS_1202723: &str = "https://images.pexels.com/photos/1202723/pexels-photo-1202723.jpeg";
const PEXELS_1571460: &str = "https://images.pexels.com/photos/1571460/pexels-photo-1571460.jpeg";
const PEXELS_1571463: &str = "https://images.pexels.com/photos/1571463/pexels-photo-1571463.jpeg";

const WIDE: &str = "?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=1";
const CARD: &str = "?auto=compress&cs=tinysrgb&w=800&h=600&dpr=1";

/// `(key, name, base url, query, location, recommended size, category)`
type DefaultRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
);

const DEFAULT_ROWS: &[DefaultRow] = &[
    ("hero_slide_1", "Hero Slide 1", PEXELS_TOOLS, WIDE, "Hero Section", "1920x1080px", "hero"),
    ("hero_slide_2", "Hero Slide 2", PEXELS_1148820, WIDE, "Hero Section", "1920x1080px", "hero"),
    ("hero_slide_3", "Hero Slide 3", PEXELS_236705, WIDE, "Hero Section", "1920x1080px", "hero"),
    ("about_main", "About Section Main Image", PEXELS_1216589, WIDE, "About Section", "800x600px", "about"),
    (
        "mechanical_suppliers",
        "Mechanical Suppliers Background",
        PEXELS_TOOLS,
        CARD,
        "Trading Section - Mechanical Suppliers",
        "800x600px",
        "trading",
    ),
    (
        "electrical_suppliers",
        "Electrical Suppliers Background",
        PEXELS_257736,
        CARD,
        "Trading Section - Electrical Suppliers",
        "800x600px",
        "trading",
    ),
    (
        "plumbing_suppliers",
        "Plumbing Suppliers Background",
        PEXELS_1216589,
        CARD,
        "Trading Section - Plumbing Suppliers",
        "800x600px",
        "trading",
    ),
    (
        "fire_fighting_suppliers",
        "Fire Fighting Suppliers Background",
        PEXELS_280221,
        CARD,
        "Trading Section - Fire Fighting Suppliers",
        "800x600px",
        "trading",
    ),
    (
        "portfolio_civil_1",
        "Civil Structure Project 1",
        PEXELS_1216589,
        CARD,
        "Portfolio Section - Civil Structure",
        "800x600px",
        "portfolio",
    ),
    (
        "portfolio_civil_2",
        "Civil Structure Project 2",
        PEXELS_TOOLS,
        CARD,
        "Portfolio Section - Civil Structure",
        "800x600px",
        "portfolio",
    ),
    (
        "portfolio_road_1",
        "Road Infrastructure Project 1",
        PEXELS_280221,
        CARD,
        "Portfolio Section - Road Infrastructure",
        "800x600px",
        "portfolio",
    ),
    (
        "portfolio_road_2",
        "Road Infrastructure Project 2",
        PEXELS_1202723,
        CARD,
        "Portfolio Section - Road Infrastructure",
        "800x600px",
        "portfolio",
    ),
    (
        "portfolio_fitout_1",
        "Fit Out Project 1",
        PEXELS_1571460,
        CARD,
        "Portfolio Section - Fit Out",
        "800x600px",
        "portfolio",
    ),
    (
        "portfolio_fitout_2",
        "Fit Out Project 2",
        PEXELS_1571463,
        CARD,
        "Portfolio Section - Fit Out",
        "800x600px",
        "portfolio",
    ),
    (
        "portfolio_special_1",
        "Special Installation Project 1",
        PEXELS_1216589,
        CARD,
        "Portfolio Section - Special Installation",
        "800x600px",
        "portfolio",
    ),
    (
        "portfolio_special_2",
        "Special Installation Project 2",
        PEXELS_TOOLS,
        CARD,
        "Portfolio Section - Special Installation",
        "800x600px",
        "portfolio",
    ),
];

/// Site-local path of the company logo.
pub const LOGO_PATH: &str = "/mechgenz-logo.jpg";

/// The hardcoded registry the site ships with. Built once, never mutated.
pub fn default_registry() -> &'static Registry {
    static DEFAULTS: OnceLock<Registry> = OnceLock::new();
    DEFAULTS.get_or_init(build_defaults)
}

/// Default URL for `key`, if the defaults know it.
pub fn default_url(key: &str) -> Option<&'static str> {
    default_registry().url_of(key)
}

fn build_defaults() -> Registry {
    let logo = ImageEntry {
        id: "logo".into(),
        name: "Company Logo".into(),
        description: String::new(),
        current_url: LOGO_PATH.into(),
        locations: vec!["Header".into(), "Footer".into()],
        recommended_size: "200x200px".into(),
        category: "branding".into(),
        updated_at: None,
        is_custom: None,
    };

    let rows = DEFAULT_ROWS
        .iter()
        .map(|&(id, name, base, query, location, size, category)| ImageEntry {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            current_url: format!("{base}{query}"),
            locations: vec![location.into()],
            recommended_size: size.into(),
            category: category.into(),
            updated_at: None,
            is_custom: None,
        });

    std::iter::once(logo).chain(rows).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_site_slot() {
        let defaults = default_registry();
        assert_eq!(defaults.len(), 17);
        for key in ["logo", "hero_slide_3", "fire_fighting_suppliers", "portfolio_special_2"] {
            assert!(defaults.url_of(key).is_some(), "{key} must have a default URL");
        }
        assert_eq!(default_url("logo"), Some(LOGO_PATH));
    }

    #[test]
    fn default_entries_are_keyed_by_their_id() {
        for (key, entry) in default_registry().entries() {
            assert_eq!(key, entry.id);
            assert!(!entry.category.is_empty());
        }
    }

    #[test]
    fn categories_are_sorted_and_distinct() {
        assert_eq!(
            default_registry().categories(),
            vec!["about", "branding", "hero", "portfolio", "trading"]
        );
    }

    #[test]
    fn url_of_ignores_blank_urls() {
        let registry: Registry = [ImageEntry::bare("logo", "  ")].into_iter().collect();
        assert!(registry.contains("logo"));
        assert_eq!(registry.url_of("logo"), None);
    }

    #[test]
    fn entry_deserializes_with_missing_optional_fields() {
        let entry: ImageEntry =
            serde_json::from_str(r#"{"id":"logo","name":"Logo","current_url":"/images/logo.png"}"#)
                .expect("minimal entry should decode");
        assert!(entry.locations.is_empty());
        assert_eq!(entry.is_custom, None);
        assert_eq!(entry.updated_at, None);
    }

    #[test]
    fn touch_stamps_updated_at() {
        let mut entry = ImageEntry::bare("logo", "/a.png");
        let now = chrono::Utc::now();
        entry.touch_url("/images/b.png", now);
        assert_eq!(entry.current_url, "/images/b.png");
        assert_eq!(entry.updated_at, Some(now));
    }
}
