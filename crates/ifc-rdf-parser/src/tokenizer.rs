// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP file tokenizer using nom combinators
//!
//! Parses STEP/IFC entity definitions into tokens.

use ifc_rdf_model::{AttributeValue, DecodedEntity, EntityId, IfcType};
use nom::{
    branch::alt,
    bytes::complete::{take_until, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};
use std::borrow::Cow;

/// Raw token from STEP file (before conversion to AttributeValue)
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Entity reference (#123)
    EntityRef(u32),
    /// String value ('text'), already unescaped
    String(Cow<'a, str>),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Enumeration (.VALUE.)
    Enum(&'a str),
    /// List of tokens
    List(Vec<Token<'a>>),
    /// Typed value like IFCLABEL('text')
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value ($)
    Null,
    /// Derived value (*)
    Derived,
}

impl Token<'_> {
    /// Convert token to owned AttributeValue
    ///
    /// The enumerations `.T.` and `.F.` become booleans; `.U.` (unknown
    /// LOGICAL) stays an enumeration.
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(s.to_string()),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum("T") => AttributeValue::Bool(true),
            Token::Enum("F") => AttributeValue::Bool(false),
            Token::Enum(s) => AttributeValue::Enum((*s).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(|t| t.to_attribute_value()).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                (*name).to_string(),
                args.iter().map(|t| t.to_attribute_value()).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

// ============================================================================
// Parsing Primitives
// ============================================================================

/// Skip whitespace and `/* ... */` comments
fn ws(mut input: &str) -> IResult<&str, ()> {
    loop {
        let (rest, _) = multispace0(input)?;
        match rest.strip_prefix("/*") {
            Some(comment) => {
                let (after, _) = take_until("*/")(comment)?;
                input = &after[2..];
            }
            None => return Ok((rest, ())),
        }
    }
}

/// Parse an entity reference (#123)
fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, _) = char('#')(input)?;
    let (rest, digits) = take_while1(|c: char| c.is_ascii_digit())(rest)?;
    let id = digits
        .parse::<u32>()
        .map_err(|_| nom::Err::Failure(Error::new(input, ErrorKind::Digit)))?;
    Ok((rest, Token::EntityRef(id)))
}

/// Parse a STEP string ('text' with '' for escaped quotes)
fn step_string(input: &str) -> IResult<&str, Token<'_>> {
    let (body, _) = char('\'')(input)?;

    let bytes = body.as_bytes();
    let mut end = 0;
    loop {
        match memchr::memchr(b'\'', &bytes[end..]) {
            Some(offset) => {
                end += offset;
                if bytes.get(end + 1) == Some(&b'\'') {
                    end += 2;
                    continue;
                }
                break;
            }
            // Unterminated string
            None => return Err(nom::Err::Failure(Error::new(input, ErrorKind::Char))),
        }
    }

    let raw = &body[..end];
    Ok((&body[end + 1..], Token::String(decode_step_string(raw))))
}

/// Decode the ISO 10303-21 string encodings
///
/// Handles `''`, `\\`, `\S\c` (upper half of ISO 8859-1), `\X\hh` (one
/// ISO 8859-1 byte), `\X2\...\X0\` (UTF-16) and `\X4\...\X0\` (UTF-32).
/// Code page switches (`\PA\`) are dropped. Malformed escapes are kept
/// verbatim.
pub fn decode_step_string(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') && !raw.contains("''") {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(c) = rest.chars().next() {
        if c == '\'' && rest.starts_with("''") {
            out.push('\'');
            rest = &rest[2..];
        } else if c == '\\' {
            rest = decode_escape(rest, &mut out);
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    Cow::Owned(out)
}

/// Decode one escape sequence at the start of `rest`, returning the remainder
fn decode_escape<'a>(rest: &'a str, out: &mut String) -> &'a str {
    if let Some(tail) = rest.strip_prefix("\\\\") {
        out.push('\\');
        return tail;
    }
    if let Some(tail) = rest.strip_prefix("\\S\\") {
        if let Some(c) = tail.chars().next() {
            if let Some(decoded) = char::from_u32(c as u32 + 0x80) {
                out.push(decoded);
                return &tail[c.len_utf8()..];
            }
        }
    }
    if let Some(tail) = rest.strip_prefix("\\X\\") {
        if let Some(decoded) = tail.get(..2).and_then(|h| u32::from_str_radix(h, 16).ok()) {
            if let Some(c) = char::from_u32(decoded) {
                out.push(c);
                return &tail[2..];
            }
        }
    }
    for (prefix, width) in [("\\X2\\", 4), ("\\X4\\", 8)] {
        if let Some(tail) = rest.strip_prefix(prefix) {
            if let Some(close) = tail.find("\\X0\\") {
                if let Some(text) = decode_hex_run(&tail[..close], width) {
                    out.push_str(&text);
                    return &tail[close + 4..];
                }
            }
        }
    }
    if rest.starts_with("\\P") && rest.get(3..4) == Some("\\") {
        return &rest[4..];
    }
    out.push('\\');
    &rest[1..]
}

/// Decode a run of fixed-width hex code units (4 = UTF-16, 8 = UTF-32)
fn decode_hex_run(hex: &str, width: usize) -> Option<String> {
    if hex.len() % width != 0 || !hex.is_ascii() {
        return None;
    }
    let units: Vec<u32> = (0..hex.len())
        .step_by(width)
        .map(|i| u32::from_str_radix(&hex[i..i + width], 16).ok())
        .collect::<Option<_>>()?;
    if width == 4 {
        let utf16: Vec<u16> = units.into_iter().map(|u| u as u16).collect();
        String::from_utf16(&utf16).ok()
    } else {
        units.into_iter().map(char::from_u32).collect()
    }
}

/// Parse a number (integer or float)
fn number(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, num_str) = recognize((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    let fail = || nom::Err::Failure(Error::new(input, ErrorKind::Float));
    let is_real = num_str.contains(['.', 'e', 'E']);

    if !is_real {
        // Integers that overflow i64 are still valid STEP numbers
        if let Ok(i) = lexical_core::parse::<i64>(num_str.as_bytes()) {
            return Ok((rest, Token::Integer(i)));
        }
    }

    let f: f64 = lexical_core::parse(num_str.as_bytes())
        .ok()
        .or_else(|| num_str.parse().ok())
        .ok_or_else(fail)?;
    Ok((rest, Token::Float(f)))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_').parse(input)
}

/// `.VALUE.`
fn enumeration(input: &str) -> IResult<&str, Token<'_>> {
    map(delimited(char('.'), identifier, char('.')), Token::Enum).parse(input)
}

/// `$` and `*`
fn placeholder(input: &str) -> IResult<&str, Token<'_>> {
    alt((value(Token::Null, char('$')), value(Token::Derived, char('*')))).parse(input)
}

/// Parenthesised, comma separated tokens
fn token_list(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

/// `KEYWORD(args)`, e.g. `IFCLABEL('text')`
fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    map((identifier, ws, token_list), |(name, _, args)| {
        Token::TypedValue(name, args)
    })
    .parse(input)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        entity_ref,
        step_string,
        placeholder,
        enumeration,
        number,
        map(token_list, Token::List),
        typed_value,
    ))
    .parse(input)
}

/// Parse a parenthesised parameter list, as found after an entity or header keyword
pub fn parameter_list(input: &str) -> Result<Vec<Token<'_>>, String> {
    let (_, (_, tokens)) = (ws, token_list)
        .parse(input)
        .map_err(|e| format!("Failed to parse attributes: {:?}", e))?;
    Ok(tokens)
}

// ============================================================================
// Entity Parsing
// ============================================================================

/// Parse a complete entity definition
///
/// Format: `#123=IFCWALL(attr1,attr2,...);`
pub fn parse_entity(input: &str) -> Result<DecodedEntity, String> {
    let (input, _) = ws(input).map_err(|_| "Unterminated comment")?;

    let (input, _) = char::<&str, Error<&str>>('#')
        .parse(input)
        .map_err(|_| "Expected # at start of entity")?;

    let (input, id_str) = take_while1::<_, &str, Error<&str>>(|c: char| c.is_ascii_digit())
        .parse(input)
        .map_err(|_| "Expected entity ID")?;

    let id: u32 = id_str.parse().map_err(|_| "Invalid entity ID")?;

    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<Error<&str>>| "Expected = after entity ID")?;

    let (input, type_name) = identifier(input).map_err(|_| "Expected type name")?;

    let tokens = parameter_list(input)?;
    let attributes: Vec<AttributeValue> = tokens.iter().map(|t| t.to_attribute_value()).collect();

    Ok(DecodedEntity {
        id: EntityId(id),
        ifc_type: IfcType::parse(type_name),
        attributes,
    })
}

/// Parse entity from raw bytes at given position
pub fn parse_entity_at(content: &str, start: usize, end: usize) -> Result<DecodedEntity, String> {
    let slice = content
        .get(start..end)
        .ok_or_else(|| format!("Entity range {}..{} out of bounds", start, end))?;
    parse_entity(slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference() {
        let (remaining, token) = entity_ref("#123").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::EntityRef(123));
    }

    #[test]
    fn test_plain_string_is_borrowed() {
        let (remaining, token) = step_string("'hello world'").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::String(Cow::Borrowed("hello world")));
    }

    #[test]
    fn test_parse_string_with_escaped_quote() {
        let (remaining, token) = step_string("'it''s a test',1").unwrap();
        assert_eq!(remaining, ",1");
        assert_eq!(token, Token::String(Cow::Owned("it's a test".into())));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(step_string("'never closed").is_err());
        assert!(parse_entity("#1=IFCWALL('abc);").is_err());
    }

    #[test]
    fn test_decode_step_encodings() {
        assert_eq!(decode_step_string("W\\X2\\00E4\\X0\\nde"), "Wände");
        assert_eq!(decode_step_string("\\X\\E9t\\X\\E9"), "été");
        assert_eq!(decode_step_string("\\S\\Dnorm"), "Änorm");
        assert_eq!(decode_step_string("a\\\\b"), "a\\b");
        assert_eq!(decode_step_string("\\X4\\0001F600\\X0\\"), "😀");
        assert_eq!(decode_step_string("C:\\path"), "C:\\path");
    }

    #[test]
    fn test_integer() {
        let (remaining, token) = number("42").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::Integer(42));
    }

    #[test]
    fn test_real() {
        let (_, token) = number("3.14159").unwrap();
        let Token::Float(f) = token else {
            panic!("Expected float")
        };
        assert_relative_eq!(f, 3.14159);
    }

    #[test]
    fn test_parse_number_trailing_dot_and_exponent() {
        let (_, token) = number("1.").unwrap();
        assert_eq!(token, Token::Float(1.0));
        let (_, token) = number("1.5E-3").unwrap();
        let Token::Float(f) = token else {
            panic!("Expected float")
        };
        assert_relative_eq!(f, 0.0015);
    }

    #[test]
    fn test_parse_enum_and_booleans() {
        let (_, token) = enumeration(".ELEMENT.").unwrap();
        assert_eq!(token.to_attribute_value(), AttributeValue::Enum("ELEMENT".into()));
        let (_, token) = enumeration(".T.").unwrap();
        assert_eq!(token.to_attribute_value(), AttributeValue::Bool(true));
        let (_, token) = enumeration(".F.").unwrap();
        assert_eq!(token.to_attribute_value(), AttributeValue::Bool(false));
        let (_, token) = enumeration(".U.").unwrap();
        assert_eq!(token.to_attribute_value(), AttributeValue::Enum("U".into()));
    }

    #[test]
    fn test_nested_list() {
        let (remaining, token) = token("(1, 2, (3,4))").unwrap();
        assert_eq!(remaining, "");
        let Token::List(items) = token else {
            panic!("Expected list")
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(items[2], Token::List(_)));
    }

    #[test]
    fn test_parse_typed_value() {
        let entity =
            parse_entity("#9=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);").unwrap();
        assert_eq!(
            entity.attributes[2],
            AttributeValue::TypedValue("IFCBOOLEAN".into(), vec![AttributeValue::Bool(true)])
        );
    }

    #[test]
    fn test_entity_with_comment_and_semicolon_in_string() {
        let entity = parse_entity("#1= IFCWALL('abc',$,#2, /* note */ 'x;y');").unwrap();
        assert_eq!(entity.id, EntityId(1));
        assert_eq!(entity.ifc_type, IfcType::IfcWall);
        assert_eq!(entity.attributes.len(), 4);
        assert_eq!(entity.get_string(3), Some("x;y"));
    }
}
