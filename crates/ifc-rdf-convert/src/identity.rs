// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance identity
//!
//! Every projected entity gets an IRI `{base}{identifier}`. The identifier
//! is the entity's `GlobalId` expanded from the 22-character IFC encoding to
//! the 8-4-4-4-12 UUID form. Entities without a usable `GlobalId` get a
//! random v4 UUID, generated once per entity and reused for the rest of the
//! run.

use ifc_rdf_model::{DecodedEntity, EntityId, SchemaIntrospector, SchemaIntrospectorExt};
use log::debug;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// The 64 characters of the IFC GUID encoding, in value order
const GUID_ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// Length of a compressed IFC GUID
pub const COMPRESSED_GUID_LEN: usize = 22;

/// Why a compressed GUID could not be expanded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuidError {
    #[error("expected {COMPRESSED_GUID_LEN} characters, found {0}")]
    Length(usize),

    #[error("character {0:?} is not in the IFC GUID alphabet")]
    Character(char),

    #[error("leading value {0} does not fit in one byte")]
    Overflow(u32),
}

fn digit(c: u8) -> Result<u32, GuidError> {
    GUID_ALPHABET
        .iter()
        .position(|&a| a == c)
        .map(|p| p as u32)
        .ok_or(GuidError::Character(c as char))
}

fn decode_group(chars: &[u8]) -> Result<u32, GuidError> {
    chars
        .iter()
        .try_fold(0u32, |acc, &c| Ok(acc * 64 + digit(c)?))
}

/// Expand a compressed IFC GUID to its 16 bytes
///
/// The first two characters carry one byte, each following group of four
/// characters carries three.
pub fn decode_guid(compressed: &str) -> Result<[u8; 16], GuidError> {
    let bytes = compressed.as_bytes();
    if bytes.len() != COMPRESSED_GUID_LEN {
        return Err(GuidError::Length(compressed.chars().count()));
    }

    let mut out = [0u8; 16];
    let head = decode_group(&bytes[..2])?;
    if head > 0xFF {
        return Err(GuidError::Overflow(head));
    }
    out[0] = head as u8;

    for (i, group) in bytes[2..].chunks_exact(4).enumerate() {
        let value = decode_group(group)?;
        out[1 + i * 3] = (value >> 16) as u8;
        out[2 + i * 3] = (value >> 8) as u8;
        out[3 + i * 3] = value as u8;
    }

    Ok(out)
}

/// Expand a compressed IFC GUID to `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
pub fn expand_guid(compressed: &str) -> Result<String, GuidError> {
    let bytes = decode_guid(compressed)?;
    Ok(uuid::Uuid::from_bytes(bytes).hyphenated().to_string())
}

/// The entity's `GlobalId`, if present and not blank
///
/// Rooted types the schema table does not list still carry `GlobalId` first,
/// so an undeclared type falls back to a leading string attribute.
pub fn natural_id<'e>(entity: &'e DecodedEntity, schema: &dyn SchemaIntrospector) -> Option<&'e str> {
    let value = if schema.declares(entity.ifc_type.name()) {
        schema.attribute(entity, "GlobalId")
    } else {
        entity.get(0)
    }?;
    value.as_string().map(str::trim).filter(|id| !id.is_empty())
}

/// A resolved instance identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// `{base}{identifier}`
    pub uri: String,
    /// Expanded GUID or synthesized UUID
    pub identifier: String,
}

/// Resolves entities to instance IRIs for one run
pub struct IdentityResolver {
    base: String,
    synthesized: FxHashMap<EntityId, String>,
}

impl IdentityResolver {
    /// Resolver minting IRIs under `base`
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            synthesized: FxHashMap::default(),
        }
    }

    /// Instance namespace
    pub fn base(&self) -> &str {
        &self.base
    }

    /// IRI for an identifier in the instance namespace
    pub fn uri_for(&self, identifier: &str) -> String {
        format!("{}{}", self.base, identifier)
    }

    /// Identity of `entity`
    ///
    /// A malformed `GlobalId` is treated as absent.
    pub fn resolve(&mut self, entity: &DecodedEntity, schema: &dyn SchemaIntrospector) -> Identity {
        let expanded = natural_id(entity, schema).and_then(|gid| match expand_guid(gid) {
            Ok(expanded) => Some(expanded),
            Err(e) => {
                debug!("Malformed GlobalId {:?} on {}: {}", gid, entity.id, e);
                None
            }
        });

        let identifier = match expanded {
            Some(identifier) => identifier,
            None => self.synthesize(entity.id),
        };

        Identity {
            uri: self.uri_for(&identifier),
            identifier,
        }
    }

    fn synthesize(&mut self, id: EntityId) -> String {
        self.synthesized
            .entry(id)
            .or_insert_with(|| uuid::Uuid::new_v4().hyphenated().to_string())
            .clone()
    }
}
