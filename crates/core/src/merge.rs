//! Merge rule combining a freshly fetched registry with the working one.
//!
//! An incoming entry never clobbers a known-good URL with an empty one.
//! When the backend says whether an entry is a deliberate override
//! (`is_custom`), that answer wins; otherwise an entry only replaces the
//! working one when its URL differs from the hardcoded default.

use crate::registry::{ImageEntry, Registry};

/// Result of [`merge_fetched`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub registry: Registry,
    /// Keys whose working entry was replaced by the fetched one.
    pub replaced: Vec<String>,
    /// Fetched keys that were ignored in favour of the working entry.
    pub kept: Vec<String>,
}

/// Whether `incoming` should replace whatever is currently known for its key.
pub fn should_replace(incoming: &ImageEntry, defaults: &Registry) -> bool {
    if !incoming.has_url() {
        return false;
    }
    match incoming.is_custom {
        Some(_) => true,
        None => defaults.url_of(&incoming.id) != Some(incoming.current_url.as_str()),
    }
}

/// Merge `fetched` over `working`, re-seeding any default the working state
/// lost.
pub fn merge_fetched(working: &Registry, fetched: Registry, defaults: &Registry) -> MergeOutcome {
    let mut registry = working.clone();
    for (key, entry) in defaults.entries() {
        if !registry.contains(key) {
            registry.insert(entry.clone());
        }
    }

    let mut replaced = Vec::new();
    let mut kept = Vec::new();

    for (key, mut entry) in fetched {
        // The map key is authoritative; some backends omit `id` in the body.
        entry.id = key.clone();
        if should_replace(&entry, defaults) {
            registry.insert(entry);
            replaced.push(key);
        } else {
            if !registry.contains(&key) {
                // Unknown key with nothing renderable: keep its metadata so
                // the admin screens still list it.
                registry.insert(entry);
            }
            kept.push(key);
        }
    }

    MergeOutcome {
        registry,
        replaced,
        kept,
    }
}
