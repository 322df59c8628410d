//! Turning VOLT names into FEA identifiers.

use std::{collections::HashMap, fmt::Display};

use smol_str::{format_smolstr, SmolStr};

use crate::error::Error;

/// The kinds of names we write to FEA, each with its own namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NameKind {
    Lookup,
    Group,
}

impl NameKind {
    fn prefix(self) -> &'static str {
        match self {
            NameKind::Lookup => "l_",
            NameKind::Group => "@g_",
        }
    }
}

impl Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameKind::Lookup => f.write_str("lookup"),
            NameKind::Group => f.write_str("group"),
        }
    }
}

/// The FEA identifier for a VOLT name: spaces become underscores, plus a prefix.
///
/// Nothing else is rewritten; use [`is_fea_name`] to check the result.
pub fn sanitize(kind: NameKind, name: &str) -> SmolStr {
    format_smolstr!("{}{}", kind.prefix(), name.replace(' ', "_"))
}

/// Whether `name` lexes as a single FEA name.
///
/// FEA names are ASCII and may not contain whitespace, comment or string
/// delimiters, or any of ``' ( ) * + , ; < = > ? @ [ \ ] { }``. Hyphens are
/// allowed.
pub fn is_fea_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b == b'-' || (b.is_ascii_graphic() && !is_special(b)))
}

// [# " ' ( ) * + , - ; < = > ? @ [ \ ] { }]
fn is_special(byte: u8) -> bool {
    byte == b'#'
        || byte == b'"'
        || (39..=45).contains(&byte)
        || (59..=64).contains(&byte)
        || (91..=93).contains(&byte)
        || byte == b'{'
        || byte == b'}'
}

/// Sanitized names of one kind, refusing two sources that map to the same name.
#[derive(Clone, Debug)]
pub struct NameRegistry {
    kind: NameKind,
    by_source: HashMap<SmolStr, SmolStr>,
    by_sanitized: HashMap<SmolStr, SmolStr>,
}

impl NameRegistry {
    pub fn new(kind: NameKind) -> Self {
        NameRegistry {
            kind,
            by_source: Default::default(),
            by_sanitized: Default::default(),
        }
    }

    /// Register a source name, returning its sanitized form.
    ///
    /// Registering the same source name again is a no-op. A name that can not
    /// be written as a FEA name is an error.
    pub fn register(&mut self, source: &str) -> Result<SmolStr, Error> {
        if let Some(existing) = self.by_source.get(source) {
            return Ok(existing.clone());
        }
        let sanitized = sanitize(self.kind, source);
        if !is_fea_name(&sanitized[self.kind.prefix().len()..]) {
            return Err(Error::InvalidName {
                kind: self.kind,
                name: source.into(),
                sanitized,
            });
        }
        if let Some(first) = self.by_sanitized.get(&sanitized) {
            return Err(Error::Collision {
                kind: self.kind,
                sanitized,
                first: first.clone(),
                second: source.into(),
            });
        }
        self.by_source.insert(source.into(), sanitized.clone());
        self.by_sanitized.insert(sanitized.clone(), source.into());
        Ok(sanitized)
    }

    /// The sanitized form of a previously registered name.
    pub fn get(&self, source: &str) -> Option<&SmolStr> {
        self.by_source.get(source)
    }
}
