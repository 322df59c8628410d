//! The intermediate representation shared by the parser and the FEA writer.
//!
//! Everything here is built once by [`crate::parse_source`] and only read afterwards.

use std::fmt::{Debug, Display};

use bitflags::bitflags;
use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;
use write_fonts::types::Tag;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GlyphName(SmolStr);

impl GlyphName {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(SmolStr::new(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for GlyphName {
    fn from(value: &str) -> Self {
        GlyphName(value.into())
    }
}

impl From<SmolStr> for GlyphName {
    fn from(value: SmolStr) -> Self {
        GlyphName(value)
    }
}

impl Debug for GlyphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for GlyphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// this means if you have a map keyed by GlyphName you can use &str to look up
impl std::borrow::Borrow<str> for GlyphName {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq<&str> for GlyphName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// The GDEF class a glyph is assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum GlyphClass {
    Base,
    Ligature,
    Mark,
    /// Declared for GDEF, but no VOLT glyph type maps to it.
    Component,
}

impl GlyphClass {
    /// All classes, in the order they are written to GDEF.
    pub const ALL: [GlyphClass; 4] = [
        GlyphClass::Base,
        GlyphClass::Ligature,
        GlyphClass::Mark,
        GlyphClass::Component,
    ];

    /// The upper-case name, as used by VOLT and in our class names.
    pub fn name(self) -> &'static str {
        match self {
            GlyphClass::Base => "BASE",
            GlyphClass::Ligature => "LIGATURE",
            GlyphClass::Mark => "MARK",
            GlyphClass::Component => "COMPONENT",
        }
    }

    /// The class for a VOLT `TYPE` value.
    pub fn from_volt_type(word: &str) -> Option<GlyphClass> {
        match word {
            "BASE" => Some(GlyphClass::Base),
            "LIGATURE" => Some(GlyphClass::Ligature),
            "MARK" => Some(GlyphClass::Mark),
            _ => None,
        }
    }
}

impl Display for GlyphClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single `DEF_GLYPH` record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GlyphDefinition {
    pub name: GlyphName,
    pub id: u32,
    pub unicodes: Vec<u32>,
    pub class: Option<GlyphClass>,
    pub components: Option<u32>,
}

/// Glyph names per class, always iterated in [`GlyphClass::ALL`] order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GlyphClassTable(IndexMap<GlyphClass, Vec<GlyphName>>);

impl Default for GlyphClassTable {
    fn default() -> Self {
        Self(
            GlyphClass::ALL
                .iter()
                .map(|class| (*class, Vec::new()))
                .collect(),
        )
    }
}

impl GlyphClassTable {
    pub(crate) fn push(&mut self, class: GlyphClass, name: GlyphName) {
        self.0.entry(class).or_default().push(name);
    }

    pub fn get(&self, class: GlyphClass) -> &[GlyphName] {
        self.0.get(&class).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GlyphClass, &[GlyphName])> + '_ {
        self.0.iter().map(|(class, names)| (*class, names.as_slice()))
    }
}

/// A named, ordered list of glyphs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: SmolStr,
    pub members: Vec<GlyphName>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Script {
    pub tag: Tag,
    pub name: Option<SmolStr>,
    pub lang_systems: Vec<LangSys>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LangSys {
    pub tag: Tag,
    pub name: Option<SmolStr>,
    pub script: Tag,
    pub features: Vec<Feature>,
}

/// A feature as registered for a single script and language.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub tag: Tag,
    pub name: Option<SmolStr>,
    pub script: Tag,
    pub language: Tag,
    pub lookups: Vec<SmolStr>,
}

bitflags! {
    /// Lookup flags we can express, using the OpenType bit values.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
    pub struct LookupFlags: u16 {
        const RIGHT_TO_LEFT = 0x0001;
        const IGNORE_BASE_GLYPHS = 0x0002;
        const IGNORE_MARKS = 0x0008;
    }
}

impl LookupFlags {
    /// Map a VOLT lookup flag to the flags it sets.
    ///
    /// `DIRECTION` is expected to already be joined with its argument, e.g.
    /// `"DIRECTION RTL"`. Flags that describe the default behaviour map to the
    /// empty set; `None` means the flag is not known.
    pub fn from_volt(token: &str) -> Option<LookupFlags> {
        match token {
            "SKIP_MARKS" => Some(LookupFlags::IGNORE_MARKS),
            "SKIP_BASE" => Some(LookupFlags::IGNORE_BASE_GLYPHS),
            "DIRECTION RTL" => Some(LookupFlags::RIGHT_TO_LEFT),
            "PROCESS_BASE" | "PROCESS_MARKS" | "ALL" | "DIRECTION LTR" => {
                Some(LookupFlags::empty())
            }
            _ => None,
        }
    }

    /// The FEA keywords for the set flags, in bit order.
    pub fn fea_names(self) -> Vec<&'static str> {
        self.iter()
            .filter_map(|flag| match flag {
                LookupFlags::RIGHT_TO_LEFT => Some("RightToLeft"),
                LookupFlags::IGNORE_BASE_GLYPHS => Some("IgnoreBaseGlyphs"),
                LookupFlags::IGNORE_MARKS => Some("IgnoreMarks"),
                _ => None,
            })
            .collect()
    }
}

/// Replace `input` with `output`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubstitutionRule {
    pub input: Vec<GlyphName>,
    pub output: Vec<GlyphName>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubstitutionLookup {
    pub name: SmolStr,
    pub flags: LookupFlags,
    pub rules: Vec<SubstitutionRule>,
}

/// A construct we recognized but can not (yet) express in FEA.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Skipped {
    ContextualSubstitution {
        lookup: SmolStr,
        line: usize,
    },
    /// A substitution using group, range or enum references.
    ClassSubstitution {
        lookup: SmolStr,
        line: usize,
    },
    Positioning {
        lookup: SmolStr,
        line: usize,
    },
    Anchor {
        name: SmolStr,
        line: usize,
    },
    /// A feature's reference to a lookup that was itself skipped.
    LookupReference {
        feature: Tag,
        script: Tag,
        language: Tag,
        lookup: SmolStr,
    },
}

impl Skipped {
    /// The name of the lookup this record stands in for, if it is one.
    pub fn lookup_name(&self) -> Option<&SmolStr> {
        match self {
            Skipped::ContextualSubstitution { lookup, .. }
            | Skipped::ClassSubstitution { lookup, .. }
            | Skipped::Positioning { lookup, .. } => Some(lookup),
            Skipped::Anchor { .. } | Skipped::LookupReference { .. } => None,
        }
    }
}

impl Display for Skipped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Skipped::ContextualSubstitution { lookup, line } => {
                write!(f, "contextual substitution lookup '{lookup}' (line {line})")
            }
            Skipped::ClassSubstitution { lookup, line } => write!(
                f,
                "substitution lookup '{lookup}' with group references (line {line})"
            ),
            Skipped::Positioning { lookup, line } => {
                write!(f, "positioning lookup '{lookup}' (line {line})")
            }
            Skipped::Anchor { name, line } => write!(f, "anchor '{name}' (line {line})"),
            Skipped::LookupReference {
                feature,
                script,
                language,
                lookup,
            } => write!(
                f,
                "reference to lookup '{lookup}' in feature '{feature}' ({script}/{language})"
            ),
        }
    }
}

/// Everything we know about a VOLT source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VoltFont {
    pub glyphs: IndexMap<GlyphName, GlyphDefinition>,
    pub glyph_classes: GlyphClassTable,
    pub groups: IndexMap<SmolStr, Group>,
    pub scripts: Vec<Script>,
    pub lookups: IndexMap<SmolStr, SubstitutionLookup>,
    pub skipped: Vec<Skipped>,
}

impl VoltFont {
    /// All features, flattened in source order.
    pub fn features(&self) -> impl Iterator<Item = &Feature> + '_ {
        self.scripts
            .iter()
            .flat_map(|script| script.lang_systems.iter())
            .flat_map(|lang_sys| lang_sys.features.iter())
    }

    /// Every (script, language) pair, in source order.
    pub fn language_systems(&self) -> impl Iterator<Item = (Tag, Tag)> + '_ {
        self.scripts
            .iter()
            .flat_map(|script| script.lang_systems.iter())
            .map(|lang_sys| (lang_sys.script, lang_sys.tag))
    }
}
