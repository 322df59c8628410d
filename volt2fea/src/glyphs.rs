//! Building glyph records and the GDEF class table from `DEF_GLYPH` blocks.

use indexmap::IndexMap;
use log::debug;

use crate::{
    blocks::Block,
    error::Error,
    ir::{GlyphClass, GlyphClassTable, GlyphDefinition, GlyphName},
};

pub(crate) fn build(
    blocks: &[Block],
) -> Result<(IndexMap<GlyphName, GlyphDefinition>, GlyphClassTable), Error> {
    let mut glyphs = IndexMap::with_capacity(blocks.len());
    let mut classes = GlyphClassTable::default();
    for block in blocks {
        let glyph = parse_glyph(block)?;
        if glyphs.contains_key(&glyph.name) {
            return Err(Error::DuplicateDefinition {
                kind: "glyph",
                name: glyph.name.as_str().into(),
                line: block.line(),
            });
        }
        if let Some(class) = glyph.class {
            classes.push(class, glyph.name.clone());
        }
        glyphs.insert(glyph.name.clone(), glyph);
    }
    debug!("{} glyphs", glyphs.len());
    Ok((glyphs, classes))
}

// DEF_GLYPH "name" ID 1 [UNICODEVALUES "U+0041,U+0042" | UNICODE 65]
//     [TYPE BASE|LIGATURE|MARK] [COMPONENTS 2] END_GLYPH
fn parse_glyph(block: &Block) -> Result<GlyphDefinition, Error> {
    let mut parser = block.parser();
    parser.expect("DEF_GLYPH")?;
    let name = GlyphName::new(parser.expect_string("glyph name")?);
    parser.expect("ID")?;
    let id = parser.expect_uint("glyph id")?;

    let unicodes = if parser.eat("UNICODEVALUES") {
        let line = parser.line();
        let raw = parser.expect_string("a list of unicode values")?;
        parse_unicode_values(raw).map_err(|message| Error::parse(line, message))?
    } else if parser.eat("UNICODE") {
        vec![parser.expect_uint("unicode value")?]
    } else {
        Vec::new()
    };

    let class = if parser.eat("TYPE") {
        let line = parser.line();
        let word = parser.expect_word("glyph type")?;
        Some(
            GlyphClass::from_volt_type(word)
                .ok_or_else(|| Error::parse(line, format!("unknown glyph type '{word}'")))?,
        )
    } else {
        None
    };

    let components = if parser.eat("COMPONENTS") {
        Some(parser.expect_uint("component count")?)
    } else {
        None
    };

    parser.expect("END_GLYPH")?;
    parser.expect_end()?;

    Ok(GlyphDefinition {
        name,
        id,
        unicodes,
        class,
        components,
    })
}

/// Parse a comma separated list like `U+0041,U+00C1`.
fn parse_unicode_values(raw: &str) -> Result<Vec<u32>, String> {
    raw.split(',')
        .map(str::trim)
        .map(|value| {
            value
                .strip_prefix("U+")
                .or_else(|| value.strip_prefix("u+"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .ok_or_else(|| format!("invalid unicode value '{value}'"))
        })
        .collect()
}
