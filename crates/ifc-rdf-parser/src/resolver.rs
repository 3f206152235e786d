// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazily decoding [`EntityResolver`]

use crate::scanner::{EntityIndex, EntityScanner};
use crate::tokenizer::parse_entity_at;
use ifc_rdf_model::{DecodedEntity, EntityId, EntityResolver};
use log::debug;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Owns the file text and decodes records on first access
///
/// Loading only scans record boundaries. Decoded records are memoized behind
/// an `RwLock`, so a resolver can serve several threads.
pub struct ResolverImpl {
    content: String,
    ranges: EntityIndex,
    /// Ascending
    ids: Vec<EntityId>,
    /// Upper-cased type name -> ascending ids
    by_type: FxHashMap<String, Vec<EntityId>>,
    decoded: RwLock<FxHashMap<u32, Arc<DecodedEntity>>>,
}

impl ResolverImpl {
    pub fn new(content: String) -> Self {
        let mut ranges = EntityIndex::default();
        let mut by_type: FxHashMap<String, Vec<EntityId>> = FxHashMap::default();

        for record in EntityScanner::new(&content) {
            ranges.insert(record.id, (record.start, record.end));
            by_type
                .entry(record.type_name.to_ascii_uppercase())
                .or_default()
                .push(EntityId(record.id));
        }
        for ids in by_type.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
        let mut ids: Vec<EntityId> = ranges.keys().copied().map(EntityId).collect();
        ids.sort_unstable();

        Self {
            content,
            ranges,
            ids,
            by_type,
            decoded: RwLock::new(FxHashMap::default()),
        }
    }

    fn decode(&self, id: u32) -> Option<Arc<DecodedEntity>> {
        if let Some(hit) = self.decoded.read().ok()?.get(&id) {
            return Some(Arc::clone(hit));
        }

        let &(start, end) = self.ranges.get(&id)?;
        let entity = match parse_entity_at(&self.content, start, end) {
            Ok(entity) => Arc::new(entity),
            Err(e) => {
                debug!("Skipping undecodable entity #{}: {}", id, e);
                return None;
            }
        };

        if let Ok(mut decoded) = self.decoded.write() {
            decoded.insert(id, Arc::clone(&entity));
        }
        Some(entity)
    }
}

impl EntityResolver for ResolverImpl {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.decode(id.0)
    }

    fn instances_of(&self, type_name: &str) -> Vec<Arc<DecodedEntity>> {
        self.by_type
            .get(&type_name.to_ascii_uppercase())
            .map(|ids| ids.iter().filter_map(|&id| self.get(id)).collect())
            .unwrap_or_default()
    }

    fn ids(&self) -> Vec<EntityId> {
        self.ids.clone()
    }

    fn entity_count(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_rdf_model::IfcType;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#10=IFCWALL('guid2',$,'Wall 1',$,$,$,$,$);
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCFLOWSEGMENT('guid3',$,$,$,$,$,$,$);
#5=IFCWALL('broken;
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_get_decodes_on_demand() {
        let resolver = ResolverImpl::new(TEST_IFC.to_string());
        let entity = resolver.get(EntityId(1)).unwrap();
        assert_eq!(entity.id, EntityId(1));
        assert_eq!(entity.ifc_type, IfcType::IfcProject);
        assert!(resolver.get(EntityId(99)).is_none());
    }

    #[test]
    fn test_ids_ascending() {
        let resolver = ResolverImpl::new(TEST_IFC.to_string());
        let ids = resolver.ids();
        assert_eq!(ids.first(), Some(&EntityId(1)));
        assert_eq!(ids.last(), Some(&EntityId(10)));
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_instances_of_exact_type() {
        let resolver = ResolverImpl::new(TEST_IFC.to_string());
        let walls = resolver.instances_of("IfcWall");
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].id, EntityId(10));
    }

    #[test]
    fn test_find_unknown_type_by_any_spelling() {
        let resolver = ResolverImpl::new(TEST_IFC.to_string());
        assert_eq!(resolver.instances_of("IfcFlowSegment").len(), 1);
        assert_eq!(resolver.instances_of("IFCFLOWSEGMENT").len(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        use std::thread;

        let resolver = Arc::new(ResolverImpl::new(TEST_IFC.to_string()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                thread::spawn(move || {
                    for id in 1..=4 {
                        let _ = resolver.get(EntityId(id));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
