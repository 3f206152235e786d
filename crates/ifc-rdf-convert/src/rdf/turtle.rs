// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Turtle serialization
//!
//! One subject block per subject, predicates joined with ` ;`, IRIs written
//! as prefixed names where the local part is a valid Turtle name and as
//! `<...>` otherwise. `rdf:type` is written as `a`.

use super::graph::Graph;
use super::namespace;
use super::term::{Literal, Term};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

/// Prefix bindings: (prefix, namespace IRI)
pub type Prefixes = [(&'static str, String)];

/// Render `graph` as a Turtle document
pub fn to_turtle(graph: &Graph, prefixes: &Prefixes) -> String {
    let mut s = String::with_capacity(graph.len() * 96 + 512);

    for (prefix, namespace) in prefixes {
        // Writing into a String cannot fail
        let _ = writeln!(s, "@prefix {}: <{}> .", prefix, escape_iri(namespace));
    }

    for (subject, triples) in graph.group_by_subject() {
        s.push('\n');
        s.push_str(&format_term(subject, prefixes));

        for (i, triple) in triples.iter().enumerate() {
            let separator = if i == 0 { " " } else { " ;\n    " };
            let predicate = if triple.p.as_iri() == Some(namespace::rdf::TYPE) {
                "a".to_string()
            } else {
                format_term(&triple.p, prefixes)
            };
            let _ = write!(
                s,
                "{}{} {}",
                separator,
                predicate,
                format_term(&triple.o, prefixes)
            );
        }
        s.push_str(" .\n");
    }

    s
}

/// Write `graph` to `path` as Turtle, creating parent directories
pub fn write_turtle_file(path: &Path, graph: &Graph, prefixes: &Prefixes) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_turtle(graph, prefixes))
}

fn format_term(term: &Term, prefixes: &Prefixes) -> String {
    match term {
        Term::Iri(iri) => format_iri(iri, prefixes),
        Term::Literal(literal) => format_literal(literal, prefixes),
    }
}

fn format_literal(literal: &Literal, prefixes: &Prefixes) -> String {
    format!(
        "\"{}\"^^{}",
        escape_turtle_string(literal.lexical()),
        format_iri(&literal.datatype().iri(), prefixes)
    )
}

/// Prefixed name when a binding covers `iri`, `<iri>` otherwise
fn format_iri(iri: &str, prefixes: &Prefixes) -> String {
    prefixes
        .iter()
        .filter_map(|(prefix, namespace)| {
            iri.strip_prefix(namespace.as_str())
                .filter(|local| is_local_name(local))
                .map(|local| (namespace.len(), prefix, local))
        })
        .max_by_key(|(len, _, _)| *len)
        .map(|(_, prefix, local)| format!("{}:{}", prefix, local))
        .unwrap_or_else(|| format!("<{}>", escape_iri(iri)))
}

/// ASCII subset of Turtle's `PN_LOCAL`
fn is_local_name(local: &str) -> bool {
    let bytes = local.as_bytes();
    let (first, last) = match (bytes.first(), bytes.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return false,
    };
    (first.is_ascii_alphanumeric() || first == b'_')
        && last != b'.'
        && bytes
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}

/// Escape a string for a double-quoted Turtle literal
pub fn escape_turtle_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Percent-encode the characters an `IRIREF` may not contain
pub fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for ch in iri.chars() {
        match ch {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                let _ = write!(out, "%{:02X}", ch as u32);
            }
            c if (c as u32) <= 0x20 => {
                let _ = write!(out, "%{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
