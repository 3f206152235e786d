// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Append-only triple set

use super::term::{Literal, Term};
use std::collections::BTreeSet;

/// One statement
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub s: Term,
    pub p: Term,
    pub o: Term,
}

impl Triple {
    pub fn new(s: Term, p: Term, o: Term) -> Self {
        Self { s, p, o }
    }
}

/// A set of triples
///
/// Adding a triple twice keeps one copy. Nothing is ever removed. Iteration
/// is ordered by subject, then predicate, then object, which keeps the
/// Turtle output stable between runs.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple; returns `false` when it was already present
    pub fn add(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    /// Add `<s> <p> <o>`
    pub fn add_iri(&mut self, s: &str, p: &str, o: &str) -> bool {
        self.add(Triple::new(Term::iri(s), Term::iri(p), Term::iri(o)))
    }

    /// Add `<s> <p> "literal"`
    pub fn add_literal(&mut self, s: &str, p: &str, o: Literal) -> bool {
        self.add(Triple::new(Term::iri(s), Term::iri(p), Term::Literal(o)))
    }

    /// Whether the triple is present
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Number of triples
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Triples in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Triples with subject `s` and predicate `p`
    pub fn matching<'a>(&'a self, s: &'a str, p: &'a str) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.s.as_iri() == Some(s) && t.p.as_iri() == Some(p))
    }

    /// Triples with predicate `p`
    pub fn with_predicate<'a>(&'a self, p: &'a str) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.iter().filter(move |t| t.p.as_iri() == Some(p))
    }

    /// Triples grouped by subject, in subject order
    pub fn group_by_subject(&self) -> Vec<(&Term, Vec<&Triple>)> {
        let mut groups: Vec<(&Term, Vec<&Triple>)> = Vec::new();
        for triple in &self.triples {
            match groups.last_mut() {
                Some((subject, members)) if **subject == triple.s => members.push(triple),
                _ => groups.push((&triple.s, vec![triple])),
            }
        }
        groups
    }
}
