//! Image slots of the public pages.
//!
//! Each section lists the registry keys it renders together with the
//! hardcoded fallback it shows when the key resolves to nothing usable. Some
//! project gallery tiles have no key at all and always show their fallback.

use futures::future::join_all;
use mechgenz_core::registry::LOGO_PATH;
use mechgenz_images::ImageResolver;
use serde::Serialize;

const PEXELS: &str = "https://images.pexels.com/photos";
const HERO_SIZE: &str = "auto=compress&cs=tinysrgb&w=1260&h=750&dpr=1";
const CARD_SIZE: &str = "auto=compress&cs=tinysrgb&w=800&h=600&dpr=1";

/// One place on a page that shows an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    /// Registry key, or `None` for a tile that only ever shows its fallback.
    pub key: Option<&'static str>,
    pub label: &'static str,
    pub caption: Option<&'static str>,
    pub fallback: String,
}

impl ImageSlot {
    fn keyed(key: &'static str, label: &'static str, fallback: String) -> Self {
        Self {
            key: Some(key),
            label,
            caption: None,
            fallback,
        }
    }

    fn fixed(label: &'static str, fallback: String) -> Self {
        Self {
            key: None,
            label,
            caption: None,
            fallback,
        }
    }

    fn with_caption(mut self, caption: &'static str) -> Self {
        self.caption = Some(caption);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: &'static str,
    pub title: &'static str,
    pub slots: Vec<ImageSlot>,
}

fn pexels(photo: &str, file: &str, size: &str) -> String {
    format!("{PEXELS}/{photo}/{file}.jpeg?{size}")
}

fn tools(size: &str) -> String {
    pexels("162553", "keys-workshop-mechanic-tools-162553", size)
}

fn photo(id: &str, size: &str) -> String {
    pexels(id, &format!("pexels-photo-{id}"), size)
}

/// A project category: two configurable tiles followed by six fixed ones
/// cycling through `extra`.
fn project_category(
    id: &'static str,
    title: &'static str,
    keys: [(&'static str, String); 2],
    extra: [String; 2],
) -> Section {
    let mut slots: Vec<ImageSlot> = keys
        .into_iter()
        .map(|(key, fallback)| ImageSlot::keyed(key, title, fallback))
        .collect();
    for i in 0..6 {
        slots.push(ImageSlot::fixed(title, extra[i % 2].clone()));
    }
    Section { id, title, slots }
}

/// Every section of the site that renders registry images, in page order.
pub fn site_sections() -> Vec<Section> {
    vec![
        Section {
            id: "header",
            title: "Header",
            slots: vec![ImageSlot::keyed("logo", "Company Logo", LOGO_PATH.to_string())],
        },
        Section {
            id: "hero",
            title: "Hero",
            slots: vec![
                ImageSlot::keyed("hero_slide_1", "RESPONSIBLE INFRASTRUCTURE", tools(HERO_SIZE))
                    .with_caption("we take your vision forward"),
                ImageSlot::keyed("hero_slide_2", "BUILDING THE FUTURE", photo("1148820", HERO_SIZE))
                    .with_caption("innovative construction solutions"),
                ImageSlot::keyed("hero_slide_3", "EXCELLENCE IN CONSTRUCTION", photo("236705", HERO_SIZE))
                    .with_caption("delivering quality projects on time"),
            ],
        },
        Section {
            id: "about",
            title: "About Us",
            slots: vec![ImageSlot::keyed("about_main", "About MECHGENZ", photo("1216589", HERO_SIZE))],
        },
        Section {
            id: "trading",
            title: "Trading Division",
            slots: vec![
                ImageSlot::keyed("mechanical_suppliers", "Mechanical Suppliers", tools(CARD_SIZE)),
                ImageSlot::keyed("electrical_suppliers", "Electrical Suppliers", photo("257736", CARD_SIZE)),
                ImageSlot::keyed("plumbing_suppliers", "Plumbing Suppliers", photo("1216589", CARD_SIZE)),
                ImageSlot::keyed(
                    "fire_fighting_suppliers",
                    "Fire Fighting & Fire Alarm Systems",
                    photo("280221", CARD_SIZE),
                ),
            ],
        },
        project_category(
            "projects-civil",
            "CIVIL STRUCTURE",
            [
                ("portfolio_civil_1", photo("1216589", CARD_SIZE)),
                ("portfolio_civil_2", tools(CARD_SIZE)),
            ],
            [photo("1148820", CARD_SIZE), photo("236705", CARD_SIZE)],
        ),
        project_category(
            "projects-road",
            "ROAD INFRASTRUCTURE",
            [
                ("portfolio_road_1", photo("280221", CARD_SIZE)),
                ("portfolio_road_2", photo("1202723", CARD_SIZE)),
            ],
            [photo("280221", CARD_SIZE), photo("1202723", CARD_SIZE)],
        ),
        project_category(
            "projects-fitout",
            "FIT OUT",
            [
                ("portfolio_fitout_1", photo("1571460", CARD_SIZE)),
                ("portfolio_fitout_2", photo("1571463", CARD_SIZE)),
            ],
            [photo("1571460", CARD_SIZE), photo("1571463", CARD_SIZE)],
        ),
        project_category(
            "projects-special",
            "SPECIAL INSTALLATION",
            [
                ("portfolio_special_1", photo("1216589", CARD_SIZE)),
                ("portfolio_special_2", tools(CARD_SIZE)),
            ],
            [photo("1216589", CARD_SIZE), tools(CARD_SIZE)],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSection {
    pub id: String,
    pub title: String,
    pub images: Vec<ResolvedImage>,
}

/// Every slot of the site with the URL it would render right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPage {
    pub sections: Vec<ResolvedSection>,
}

fn resolved(slot: &ImageSlot, url: String) -> ResolvedImage {
    ResolvedImage {
        key: slot.key.map(str::to_string),
        label: slot.label.to_string(),
        caption: slot.caption.map(str::to_string),
        url,
    }
}

fn resolve_slot(resolver: &ImageResolver, slot: &ImageSlot) -> String {
    match slot.key {
        Some(key) => resolver.resolve(key, &slot.fallback),
        None => slot.fallback.clone(),
    }
}

impl ResolvedPage {
    /// Resolve every slot synchronously from the resolver's current state.
    pub fn compose(resolver: &ImageResolver) -> Self {
        let sections = site_sections()
            .iter()
            .map(|section| ResolvedSection {
                id: section.id.to_string(),
                title: section.title.to_string(),
                images: section
                    .slots
                    .iter()
                    .map(|slot| resolved(slot, resolve_slot(resolver, slot)))
                    .collect(),
            })
            .collect();
        Self { sections }
    }

    pub fn section(&self, id: &str) -> Option<&ResolvedSection> {
        self.sections.iter().find(|s| s.id == id)
    }
}

/// Preload every slot of `section` concurrently.
///
/// A slot whose image (and fallback) fails to load shows its fallback URL
/// anyway, so the section is never left without an image.
pub async fn preload_section(resolver: &ImageResolver, section: &Section) -> ResolvedSection {
    let loads = section.slots.iter().map(|slot| async move {
        let url = match slot.key {
            Some(key) => match resolver.preload(key, &slot.fallback).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(section = section.id, key, error = %e, "Showing fallback image");
                    slot.fallback.clone()
                }
            },
            None => slot.fallback.clone(),
        };
        resolved(slot, url)
    });

    ResolvedSection {
        id: section.id.to_string(),
        title: section.title.to_string(),
        images: join_all(loads).await,
    }
}
