// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RDF terms: IRIs and typed literals
//!
//! Literals are always typed; the lexical form is fixed at construction so
//! terms order and hash by value.

use super::namespace::XSD;
use std::fmt;

/// Literal datatype
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Datatype {
    String,
    Boolean,
    Integer,
    Float,
    Double,
    NonNegativeInteger,
    AnyUri,
}

impl Datatype {
    /// Local name in the XSD namespace
    pub fn local_name(self) -> &'static str {
        match self {
            Datatype::String => "string",
            Datatype::Boolean => "boolean",
            Datatype::Integer => "integer",
            Datatype::Float => "float",
            Datatype::Double => "double",
            Datatype::NonNegativeInteger => "nonNegativeInteger",
            Datatype::AnyUri => "anyURI",
        }
    }

    /// Expanded datatype IRI
    pub fn iri(self) -> String {
        format!("{}{}", XSD, self.local_name())
    }
}

/// A typed literal
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    lexical: String,
    datatype: Datatype,
}

impl Literal {
    /// `xsd:string`
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(value, Datatype::String)
    }

    /// `xsd:boolean`
    pub fn boolean(value: bool) -> Self {
        Self::typed(value.to_string(), Datatype::Boolean)
    }

    /// `xsd:integer`
    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), Datatype::Integer)
    }

    /// `xsd:float`
    pub fn float(value: f64) -> Self {
        Self::typed(real_lexical(value), Datatype::Float)
    }

    /// `xsd:double`
    pub fn double(value: f64) -> Self {
        Self::typed(real_lexical(value), Datatype::Double)
    }

    /// `xsd:nonNegativeInteger`
    pub fn non_negative(value: u64) -> Self {
        Self::typed(value.to_string(), Datatype::NonNegativeInteger)
    }

    /// `xsd:anyURI`
    pub fn any_uri(value: impl Into<String>) -> Self {
        Self::typed(value, Datatype::AnyUri)
    }

    fn typed(lexical: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            lexical: lexical.into(),
            datatype,
        }
    }

    /// Lexical form
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    /// Datatype
    pub fn datatype(&self) -> Datatype {
        self.datatype
    }
}

/// XSD lexical form of a real number
fn real_lexical(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let inf = if value.is_sign_positive() { "INF" } else { "-INF" };
        inf.to_string()
    } else {
        value.to_string()
    }
}

/// Subject, predicate or object of a triple
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// Expanded IRI
    Iri(String),
    /// Typed literal
    Literal(Literal),
}

impl Term {
    /// IRI term
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// Get the IRI, if this is one
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }

    /// Get the literal, if this is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(literal) => Some(literal),
            Term::Iri(_) => None,
        }
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Literal(lit) => write!(f, "\"{}\"^^<{}>", lit.lexical, lit.datatype.iri()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_lexical_forms() {
        assert_eq!(Literal::double(2.5).lexical(), "2.5");
        assert_eq!(Literal::double(f64::NAN).lexical(), "NaN");
        assert_eq!(Literal::float(f64::NEG_INFINITY).lexical(), "-INF");
    }

    #[test]
    fn test_boolean_is_not_an_integer() {
        let t = Literal::boolean(true);
        assert_eq!(t.lexical(), "true");
        assert_eq!(t.datatype(), Datatype::Boolean);
        assert_ne!(Term::from(t), Term::from(Literal::integer(1)));
    }

    #[test]
    fn test_datatype_iri() {
        assert_eq!(
            Datatype::NonNegativeInteger.iri(),
            "http://www.w3.org/2001/XMLSchema#nonNegativeInteger"
        );
    }
}
