// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record scanner for the DATA section
//!
//! Finds instance boundaries with `memchr` without decoding attributes, so a
//! whole file can be indexed before anything is parsed.

use crate::header::data_section_start;
use memchr::{memchr2, memmem};
use rustc_hash::FxHashMap;

/// Instance name -> byte range of its record
pub type EntityIndex = FxHashMap<u32, (usize, usize)>;

/// One instance record located by the scanner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScannedEntity<'a> {
    pub id: u32,
    pub type_name: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Iterator over the simple instance records of a file
///
/// Records are separated by `;` outside quoted strings. Complex (multi-type)
/// instances and malformed records are stepped over.
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Content without a DATA section yields no entities
    pub fn new(content: &'a str) -> Self {
        let pos = data_section_start(content).unwrap_or(content.len());
        Self { content, pos }
    }

    pub fn next_entity(&mut self) -> Option<ScannedEntity<'a>> {
        let content: &'a str = self.content;
        let bytes = content.as_bytes();

        loop {
            self.skip_trivia();
            if self.pos >= bytes.len() || content[self.pos..].starts_with("ENDSEC") {
                return None;
            }

            let start = self.pos;
            if bytes[start] != b'#' {
                self.find_record_end()?;
                continue;
            }

            self.pos += 1;
            let id = self.take_while(|b| b.is_ascii_digit()).parse::<u32>().ok();

            self.skip_inline_space();
            if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
                self.find_record_end()?;
                continue;
            }
            self.pos += 1;
            self.skip_inline_space();

            let type_name = self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');

            let end = self.find_record_end()?;
            match id {
                Some(id) if !type_name.is_empty() => {
                    return Some(ScannedEntity {
                        id,
                        type_name,
                        start,
                        end,
                    })
                }
                _ => continue,
            }
        }
    }

    /// Skip whitespace and `/* */` comments between records
    fn skip_trivia(&mut self) {
        let bytes = self.content.as_bytes();
        loop {
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if bytes[self.pos..].starts_with(b"/*") {
                self.pos = memmem::find(&bytes[self.pos + 2..], b"*/")
                    .map(|offset| self.pos + 2 + offset + 2)
                    .unwrap_or(bytes.len());
            } else {
                return;
            }
        }
    }

    fn skip_inline_space(&mut self) {
        self.take_while(|b| b == b' ' || b == b'\t');
    }

    /// Consume bytes matching `pred`, returning them
    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let content: &'a str = self.content;
        let start = self.pos;
        let len = content.as_bytes()[start..]
            .iter()
            .take_while(|&&b| pred(b))
            .count();
        self.pos += len;
        &content[start..self.pos]
    }

    /// Offset just past the next `;` outside a string; `None` when truncated
    fn find_record_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            let offset = memchr2(b'\'', b';', &bytes[self.pos..])?;
            self.pos += offset;
            match bytes[self.pos] {
                b'\'' => {
                    if in_string && bytes.get(self.pos + 1) == Some(&b'\'') {
                        self.pos += 2;
                        continue;
                    }
                    in_string = !in_string;
                }
                _ if !in_string => {
                    self.pos += 1;
                    return Some(self.pos);
                }
                _ => {}
            }
            self.pos += 1;
        }

        None
    }
}

impl<'a> Iterator for EntityScanner<'a> {
    type Item = ScannedEntity<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0xScRe4drECQ4DMSqUjd6d',$,'Scan',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
  #3 = IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
/* a comment; with a semicolon */
#4=IFCWALL('guid',$,'Wall #5=IFCX();',$,$,#5,#6,$);
#7=(IFCREPRESENTATIONCONTEXT() IFCGEOMETRICREPRESENTATIONCONTEXT());
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_skips_comments_and_complex_instances() {
        let entities: Vec<(u32, &str)> = EntityScanner::new(TEST_IFC)
            .map(|e| (e.id, e.type_name))
            .collect();

        assert_eq!(
            entities,
            vec![
                (1, "IFCPROJECT"),
                (2, "IFCUNITASSIGNMENT"),
                (3, "IFCSIUNIT"),
                (4, "IFCWALL"),
            ]
        );
    }

    #[test]
    fn test_record_ranges_cover_whole_record() {
        let wall = EntityScanner::new(TEST_IFC).find(|e| e.id == 4).unwrap();
        let (start, end) = (wall.start, wall.end);
        assert!(TEST_IFC[start..end].starts_with("#4=IFCWALL("));
        assert!(TEST_IFC[start..end].ends_with("$);"));
    }

    #[test]
    fn test_missing_data_section() {
        assert_eq!(EntityScanner::new("ISO-10303-21;\nHEADER;\nENDSEC;\n").count(), 0);
    }
}
