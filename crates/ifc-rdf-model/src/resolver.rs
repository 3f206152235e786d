// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance lookup

use crate::{AttributeValue, DecodedEntity, EntityId};
use std::sync::Arc;

/// Read access to the instances of a file by instance name
///
/// A record that cannot be decoded is indistinguishable from a missing one:
/// `get` returns `None` for both. Dangling references therefore resolve to
/// nothing instead of failing.
///
/// ```ignore
/// let wall = resolver.get(EntityId(16))?;
/// let placement = wall.get(5).and_then(|a| resolver.resolve_ref(a));
/// ```
pub trait EntityResolver: Send + Sync {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>>;

    /// Follow a `#id` attribute; any other value resolves to `None`
    fn resolve_ref(&self, attr: &AttributeValue) -> Option<Arc<DecodedEntity>> {
        attr.as_entity_ref().and_then(|id| self.get(id))
    }

    /// Follow every `#id` member of a list attribute, skipping the rest
    fn resolve_ref_list(&self, attr: &AttributeValue) -> Vec<Arc<DecodedEntity>> {
        attr.as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(|item| self.resolve_ref(item))
            .collect()
    }

    /// Instances whose type name equals `type_name`, ignoring case,
    /// in ascending id order. Subtypes are not included.
    fn instances_of(&self, type_name: &str) -> Vec<Arc<DecodedEntity>>;

    /// Every instance name in the file, ascending
    fn ids(&self) -> Vec<EntityId>;

    fn entity_count(&self) -> usize {
        self.ids().len()
    }
}
