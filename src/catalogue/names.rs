//! Tokenizer for packed name catalogues
//!
//! Effect and palette names are shipped as one encoded string such as
//! `["Default","* Random Cycle","Party"]`. Each name is a slice of that
//! string ending at its closing quote. The tokenizer records the start and
//! end of every name instead of copying them out.

use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogueError {
    #[error("catalogue does not start with '['")]
    MissingOpenBracket,

    #[error("name {index} has no closing quote")]
    Unterminated { index: usize },
}

/// Read-only list of names backed by the encoded catalogue string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameCatalogue {
    source: String,
    spans: Vec<Range<usize>>,
}

impl NameCatalogue {
    /// Tokenize an encoded catalogue.
    ///
    /// Separators and whitespace between names are skipped; anything after
    /// the closing `]` is ignored.
    pub fn parse(encoded: &str) -> Result<Self, CatalogueError> {
        let bytes = encoded.as_bytes();
        let open = match bytes.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) if bytes[pos] == b'[' => pos,
            _ => return Err(CatalogueError::MissingOpenBracket),
        };

        let mut spans = Vec::new();
        let mut start: Option<usize> = None;

        for (i, &byte) in bytes.iter().enumerate().skip(open + 1) {
            match (byte, start) {
                (b'"', None) => start = Some(i + 1),
                (b'"', Some(s)) => {
                    spans.push(s..i);
                    start = None;
                }
                (b']', None) => break,
                _ => {}
            }
        }

        if start.is_some() {
            return Err(CatalogueError::Unterminated { index: spans.len() });
        }

        Ok(Self {
            source: encoded.to_string(),
            spans,
        })
    }

    /// Build a catalogue from plain names.
    ///
    /// A name containing `"` is cut at that quote, as it would be in the
    /// encoded form.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut source = String::from("[");
        let mut spans = Vec::new();

        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                source.push(',');
            }
            let name = name.as_ref();
            let name = name.split('"').next().unwrap_or_default();
            source.push('"');
            let start = source.len();
            source.push_str(name);
            spans.push(start..source.len());
            source.push('"');
        }
        source.push(']');

        Self { source, spans }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.spans.get(id).map(|span| &self.source[span.clone()])
    }

    /// Raw bytes of a name; empty for an unknown id
    pub fn name_bytes(&self, id: usize) -> &[u8] {
        self.name(id).map(str::as_bytes).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|span| &self.source[span.clone()])
    }

    /// The encoded form this catalogue was built from
    pub fn encoded(&self) -> &str {
        &self.source
    }
}
