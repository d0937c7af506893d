//! Refinement resolution: which properties refine which metadata entry.

use std::collections::{BTreeMap, HashMap};

use crate::opf::Metadata;

/// Property name → values, in document order.
pub type Properties = BTreeMap<String, Vec<String>>;

/// Subject id → its properties.
pub type Refinements = BTreeMap<String, Properties>;

/// How metas that carry their own `id` are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefinementMode {
    /// A meta with an id is kept as a subject, with its own property
    /// recorded, only while some other meta refines it. Unreferenced ones
    /// are pruned.
    #[default]
    Chained,
    /// Plain one-level resolution: refining metas are attached to their
    /// target and metas never become subjects on their own.
    Direct,
}

/// Build the refinement map for one rendition's metadata.
///
/// Never fails; dangling references simply create a subject entry.
pub fn resolve_refinements(metadata: &Metadata, mode: RefinementMode) -> Refinements {
    let mut refines = Refinements::new();

    for element in metadata.base_items() {
        if let Some(id) = element.id.as_deref().filter(|id| !id.is_empty()) {
            refines
                .entry(id.to_string())
                .or_default()
                .entry(element.name.clone())
                .or_default()
                .push(element.value.clone());
        }
    }

    let mut refine_counter: HashMap<&str, usize> = HashMap::new();
    for target in metadata.metas.iter().filter_map(|m| m.refines_id()) {
        *refine_counter.entry(target).or_default() += 1;
    }
    let is_refined = |id: &str| refine_counter.get(id).is_some_and(|&n| n > 0);

    if mode == RefinementMode::Chained {
        for meta in &metadata.metas {
            let Some(id) = meta.id.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };
            if is_refined(id) {
                refines
                    .entry(id.to_string())
                    .or_default()
                    .entry(meta.key().unwrap_or_default().to_string())
                    .or_default()
                    .push(meta.text().to_string());
            } else {
                refines.remove(id);
            }
        }
    }

    for meta in &metadata.metas {
        let Some(target) = meta.refines_id() else {
            continue;
        };
        if is_refined(target) {
            refines
                .entry(target.to_string())
                .or_default()
                .entry(meta.key().unwrap_or_default().to_string())
                .or_default()
                .push(meta.text().to_string());
        }
    }

    refines
}
