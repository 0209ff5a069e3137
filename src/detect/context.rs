use std::collections::{HashMap, HashSet};

use crate::dom::dom_model::{node_selector, DomSnapshot};
use crate::error::EngineError;
use crate::page::driver::PageDriver;

/// Scan-scoped state threaded through every discovery pass: the identifier
/// counter for id-less elements and the set of ids already represented by a
/// descriptor (including group members, which later passes must skip).
///
/// One context per `discover()` call; nothing survives the scan.
pub struct ScanContext {
    next_ordinal: u32,
    claimed: HashSet<String>,
    assigned: HashSet<String>,
    // The scan's shared snapshot predates our id write-backs, so later
    // passes must see the id the element was already given this scan.
    assigned_by_index: HashMap<usize, String>,
}

impl ScanContext {
    pub fn new() -> Self {
        Self {
            next_ordinal: 0,
            claimed: HashSet::new(),
            assigned: HashSet::new(),
            assigned_by_index: HashMap::new(),
        }
    }

    /// The element's identifier, assigning (and writing back) a generated
    /// one when the element has none. Write-back makes re-scans of an
    /// unmutated document reproduce the same identifiers.
    pub fn ensure_id(
        &mut self,
        driver: &mut dyn PageDriver,
        snapshot: &DomSnapshot,
        index: usize,
    ) -> Result<String, EngineError> {
        if let Some(existing) = snapshot.node(index).id() {
            return Ok(existing.to_string());
        }
        if let Some(already) = self.assigned_by_index.get(&index) {
            return Ok(already.clone());
        }

        let id = loop {
            let candidate = format!("ff-field-{}", self.next_ordinal);
            self.next_ordinal += 1;
            let taken = self.assigned.contains(&candidate)
                || snapshot.find_by_dom_id(&candidate).is_some();
            if !taken {
                break candidate;
            }
        };

        driver.set_attribute(&node_selector(index), "id", &id)?;
        self.assigned.insert(id.clone());
        self.assigned_by_index.insert(index, id.clone());
        Ok(id)
    }

    /// Claim an identifier for a descriptor. Returns false when it is
    /// already represented, which is how deduplication across passes works.
    pub fn claim(&mut self, id: &str) -> bool {
        self.claimed.insert(id.to_string())
    }

    pub fn is_claimed(&self, id: &str) -> bool {
        self.claimed.contains(id)
    }
}

impl Default for ScanContext {
    fn default() -> Self {
        Self::new()
    }
}
