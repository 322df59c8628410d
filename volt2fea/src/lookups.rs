//! Building substitution lookups from `DEF_LOOKUP ... AS_SUBSTITUTION` blocks.
//!
//! Positioning lookups, anchors, contextual substitutions and substitutions
//! over groups are recognized but not converted; they come back as
//! [`Skipped`] records so the caller can report them.

use indexmap::IndexMap;
use log::{debug, trace};
use smol_str::SmolStr;

use crate::{
    blocks::Block,
    error::Error,
    ir::{GlyphName, LookupFlags, Skipped, SubstitutionLookup, SubstitutionRule},
    parse::Parser,
};

/// The result of parsing a lookup we may not be able to convert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Parsed<T> {
    Lookup(T),
    Unsupported(Skipped),
}

/// Substitution lookups keyed by name, plus everything we had to skip.
pub(crate) fn build(
    substitutions: &[Block],
    positions: &[Block],
    anchors: &[Block],
) -> Result<(IndexMap<SmolStr, SubstitutionLookup>, Vec<Skipped>), Error> {
    let mut lookups = IndexMap::with_capacity(substitutions.len());
    let mut skipped = Vec::new();
    let mut skipped_names = Vec::new();
    for block in substitutions {
        match parse_substitution(block)? {
            Parsed::Lookup(lookup) => {
                if lookups.contains_key(&lookup.name) || skipped_names.contains(&lookup.name) {
                    return Err(duplicate(lookup.name, block));
                }
                lookups.insert(lookup.name.clone(), lookup);
            }
            Parsed::Unsupported(skip) => {
                if let Skipped::ContextualSubstitution { lookup, .. }
                | Skipped::ClassSubstitution { lookup, .. } = &skip
                {
                    if lookups.contains_key(lookup) || skipped_names.contains(lookup) {
                        return Err(duplicate(lookup.clone(), block));
                    }
                    skipped_names.push(lookup.clone());
                }
                skipped.push(skip);
            }
        }
    }
    for block in positions {
        let skip = parse_position(block)?;
        if let Some(lookup) = skip.lookup_name() {
            if lookups.contains_key(lookup) || skipped_names.contains(lookup) {
                return Err(duplicate(lookup.clone(), block));
            }
            skipped_names.push(lookup.clone());
        }
        skipped.push(skip);
    }
    for block in anchors {
        skipped.push(parse_anchor(block)?);
    }
    debug!(
        "{} substitution lookups, {} skipped constructs",
        lookups.len(),
        skipped.len()
    );
    Ok((lookups, skipped))
}

fn duplicate(name: SmolStr, block: &Block) -> Error {
    Error::DuplicateDefinition {
        kind: "lookup",
        name,
        line: block.line(),
    }
}

// DEF_LOOKUP "name" <flags> [IN_CONTEXT ... END_CONTEXT]* AS_SUBSTITUTION
//     [SUB <refs> WITH <refs> END_SUB]* END_SUBSTITUTION
pub(crate) fn parse_substitution(block: &Block) -> Result<Parsed<SubstitutionLookup>, Error> {
    let mut parser = block.parser();
    parser.expect("DEF_LOOKUP")?;
    let name = parser.expect_string("a quoted lookup name")?.clone();
    let flags = parse_flags(&mut parser, &name)?;

    let mut contextual = false;
    while parser.matches_any(&["IN_CONTEXT", "EXCEPT_CONTEXT"]) {
        parser.bump();
        while !parser.eat("END_CONTEXT") {
            if parser.bump().is_none() {
                return Err(parser.err(format!("lookup '{name}': context without END_CONTEXT")));
            }
            contextual = true;
        }
    }
    parser.expect("AS_SUBSTITUTION")?;

    if contextual {
        trace!("skipping contextual lookup '{name}'");
        return Ok(Parsed::Unsupported(Skipped::ContextualSubstitution {
            lookup: name,
            line: block.line(),
        }));
    }

    let mut rules = Vec::new();
    while parser.eat("SUB") {
        let Some(input) = parse_glyph_refs(&mut parser, "WITH")? else {
            return Ok(class_substitution(name, block));
        };
        parser.expect("WITH")?;
        let Some(output) = parse_glyph_refs(&mut parser, "END_SUB")? else {
            return Ok(class_substitution(name, block));
        };
        parser.expect("END_SUB")?;
        rules.push(SubstitutionRule { input, output });
    }
    parser.expect("END_SUBSTITUTION")?;
    parser.expect_end()?;

    Ok(Parsed::Lookup(SubstitutionLookup { name, flags, rules }))
}

fn class_substitution(lookup: SmolStr, block: &Block) -> Parsed<SubstitutionLookup> {
    trace!("skipping lookup '{lookup}' with class references");
    Parsed::Unsupported(Skipped::ClassSubstitution {
        lookup,
        line: block.line(),
    })
}

/// Collect flag words up to the context or the body, mapping each.
fn parse_flags(parser: &mut Parser, lookup: &SmolStr) -> Result<LookupFlags, Error> {
    let mut flags = LookupFlags::empty();
    while !parser.matches_any(&["IN_CONTEXT", "EXCEPT_CONTEXT", "AS_SUBSTITUTION"]) {
        let Some(token) = parser.bump() else {
            break;
        };
        let flag = if token.is_word("DIRECTION") {
            match parser.bump() {
                Some(direction) => format!("DIRECTION {direction}"),
                None => "DIRECTION".to_string(),
            }
        } else {
            token.to_string()
        };
        flags |= LookupFlags::from_volt(&flag).ok_or_else(|| Error::UnknownFlag {
            lookup: lookup.clone(),
            flag,
        })?;
    }
    Ok(flags)
}

/// A non-empty list of `GLYPH "name"` items, ending before `terminator`.
///
/// Returns `None` if the list contains a group, range or enum reference.
fn parse_glyph_refs(
    parser: &mut Parser,
    terminator: &str,
) -> Result<Option<Vec<GlyphName>>, Error> {
    let mut glyphs = Vec::new();
    while !parser.matches(0, terminator) {
        if parser.eat("GLYPH") {
            glyphs.push(GlyphName::new(parser.expect_string("a quoted glyph name")?));
        } else if parser.matches_any(&["GROUP", "RANGE", "ENUM"]) {
            return Ok(None);
        } else {
            return Err(match parser.nth(0) {
                Some(token) => {
                    parser.err(format!("expected GLYPH or {terminator}, found '{token}'"))
                }
                None => parser.err(format!("expected GLYPH or {terminator}, found end of block")),
            });
        }
    }
    if glyphs.is_empty() {
        return Err(parser.err(format!("expected at least one GLYPH before {terminator}")));
    }
    Ok(Some(glyphs))
}

fn parse_lookup_name(block: &Block) -> Result<SmolStr, Error> {
    let mut parser = block.parser();
    parser.expect("DEF_LOOKUP")?;
    Ok(parser.expect_string("a quoted lookup name")?.clone())
}

pub(crate) fn parse_position(block: &Block) -> Result<Skipped, Error> {
    let lookup = parse_lookup_name(block)?;
    trace!("skipping positioning lookup '{lookup}'");
    Ok(Skipped::Positioning {
        lookup,
        line: block.line(),
    })
}

pub(crate) fn parse_anchor(block: &Block) -> Result<Skipped, Error> {
    let mut parser = block.parser();
    parser.expect("DEF_ANCHOR")?;
    let name = parser.expect_string("a quoted anchor name")?.clone();
    Ok(Skipped::Anchor {
        name,
        line: block.line(),
    })
}
