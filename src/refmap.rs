//! The link reference map: normalized labels to destinations and titles.

use crate::nodes::{Block, BlockKind, InlineKind};
use crate::strings;
use rustc_hash::FxHashMap;

/// A resolved link reference definition.
///
/// Destination and title are materialized (entity and backslash escapes
/// expanded), so the map borrows nothing from the root blocks it was
/// extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDefinition {
    pub destination: Vec<u8>,
    pub title: Vec<u8>,
    /// Distinguishes an absent title from an empty one.
    pub title_present: bool,
}

/// Maps normalized reference labels to their definitions.  The first
/// definition of a label wins; later ones are ignored.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    map: FxHashMap<String, LinkDefinition>,
}

impl ReferenceMap {
    pub fn new() -> ReferenceMap {
        ReferenceMap {
            map: FxHashMap::default(),
        }
    }

    /// Walks `block`, collecting every link reference definition in source
    /// order.  `source` is the owning root block's source.
    pub fn extract(&mut self, source: &[u8], block: &Block) {
        let mut work = vec![block];
        while let Some(b) = work.pop() {
            if let BlockKind::LinkReferenceDefinition = b.kind() {
                self.insert_definition(source, b);
                continue;
            }
            for child in b.children().iter().rev() {
                work.push(child);
            }
        }
    }

    fn insert_definition(&mut self, source: &[u8], block: &Block) {
        let mut label = None;
        let mut destination = Vec::new();
        let mut title = None;

        for inl in block.inlines() {
            match inl.kind() {
                InlineKind::LinkLabel { reference } => label = Some(reference.clone()),
                InlineKind::LinkDestination => {
                    destination = strings::clean_url(inl.span().slice(source));
                }
                InlineKind::LinkTitle => {
                    title = Some(strings::clean_title(inl.span().slice(source)));
                }
                _ => {}
            }
        }

        let Some(label) = label else { return };
        self.insert(
            label,
            LinkDefinition {
                destination,
                title_present: title.is_some(),
                title: title.unwrap_or_default(),
            },
        );
    }

    /// Inserts a definition under an already-normalized label.  Empty labels
    /// are rejected; duplicates keep the first definition.
    pub fn insert(&mut self, label: String, definition: LinkDefinition) -> bool {
        if label.is_empty() {
            return false;
        }
        match self.map.entry(label) {
            std::collections::hash_map::Entry::Occupied(e) => {
                log::debug!("ignoring duplicate link reference definition [{}]", e.key());
                false
            }
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(definition);
                true
            }
        }
    }

    /// Whether a definition exists for the given raw label.
    pub fn matches(&self, raw_label: &[u8]) -> bool {
        let label = strings::normalize_label(raw_label);
        !label.is_empty() && self.map.contains_key(&label)
    }

    /// Looks up a definition by normalized label.
    pub fn get(&self, label: &str) -> Option<&LinkDefinition> {
        self.map.get(label)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
