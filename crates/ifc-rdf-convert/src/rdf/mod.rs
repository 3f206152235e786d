// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal RDF model: terms, an append-only graph and a Turtle writer

mod graph;
pub mod namespace;
mod term;
mod turtle;

pub use graph::{Graph, Triple};
pub use term::{Datatype, Literal, Term};
pub use turtle::{escape_iri, escape_turtle_string, to_turtle, write_turtle_file, Prefixes};
