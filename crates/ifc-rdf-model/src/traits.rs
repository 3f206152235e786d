// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The parsed model as seen by consumers

use crate::{EntityResolver, ModelMetadata, SchemaIntrospector};

/// A loaded IFC file
///
/// Implementations are immutable once built and may be shared across threads.
pub trait IfcModel: Send + Sync {
    fn resolver(&self) -> &dyn EntityResolver;

    /// Declarations for the schema named in the header
    fn schema(&self) -> &dyn SchemaIntrospector;

    /// Metres per file length unit: 0.001 for a millimetre file, 0.3048 for feet
    fn unit_scale(&self) -> f64;

    fn metadata(&self) -> &ModelMetadata;
}
