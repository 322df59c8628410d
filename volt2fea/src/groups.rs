//! Building named glyph groups from `DEF_GROUP` blocks.
//!
//! Group members may be single glyphs, ranges of glyphs (by glyph id) or
//! other groups. Everything is resolved to a flat list of glyph names, since
//! the groups are written out as simple FEA glyph classes.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace};
use smol_str::SmolStr;

use crate::{
    blocks::{extract, first_stray, Block, BlockKind},
    error::Error,
    ir::{GlyphDefinition, GlyphName, Group},
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Member {
    Glyph(GlyphName),
    Range(GlyphName, GlyphName),
    Group(SmolStr),
}

#[derive(Clone, Debug)]
struct RawGroup {
    name: SmolStr,
    line: usize,
    // each member with the line it was found on
    members: Vec<(Member, usize)>,
}

pub(crate) fn build(
    blocks: &[Block],
    glyphs: &IndexMap<GlyphName, GlyphDefinition>,
) -> Result<IndexMap<SmolStr, Group>, Error> {
    let mut raw_groups: IndexMap<SmolStr, RawGroup> = IndexMap::with_capacity(blocks.len());
    for block in blocks {
        let group = parse_group(block)?;
        if raw_groups.contains_key(&group.name) {
            return Err(Error::DuplicateDefinition {
                kind: "group",
                name: group.name,
                line: group.line,
            });
        }
        raw_groups.insert(group.name.clone(), group);
    }

    let resolver = Resolver {
        raw_groups: &raw_groups,
        glyphs,
    };
    let groups = raw_groups
        .values()
        .map(|raw| {
            let members = resolver.resolve(raw, &mut HashSet::new())?;
            trace!("group '{}' has {} members", raw.name, members.len());
            Ok((
                raw.name.clone(),
                Group {
                    name: raw.name.clone(),
                    members,
                },
            ))
        })
        .collect::<Result<IndexMap<_, _>, Error>>()?;
    debug!("{} groups", groups.len());
    Ok(groups)
}

// DEF_GROUP "name" [ENUM <member>* END_ENUM]* END_GROUP
fn parse_group(block: &Block) -> Result<RawGroup, Error> {
    let mut parser = block.parser();
    parser.expect("DEF_GROUP")?;
    let name = parser.expect_string("a quoted group name")?.clone();

    let rest = parser.rest();
    let enums = extract(rest, BlockKind::Enum)?;
    if let Some(token) = first_stray(rest, &enums) {
        return Err(Error::parse(
            token.line,
            format!("group '{name}' has content outside of ENUM ... END_ENUM: '{token}'"),
        ));
    }

    let mut members = Vec::new();
    for enum_block in &enums {
        let mut parser = enum_block.parser();
        parser.expect("ENUM")?;
        while !parser.matches(0, "END_ENUM") {
            let line = parser.line();
            let member = if parser.eat("GLYPH") {
                Member::Glyph(GlyphName::new(parser.expect_string("a quoted glyph name")?))
            } else if parser.eat("RANGE") {
                let first = GlyphName::new(parser.expect_string("a quoted glyph name")?);
                parser.expect("TO")?;
                let last = GlyphName::new(parser.expect_string("a quoted glyph name")?);
                Member::Range(first, last)
            } else if parser.eat("GROUP") {
                Member::Group(parser.expect_string("a quoted group name")?.clone())
            } else {
                return Err(parser.err(format!(
                    "expected GLYPH, RANGE or GROUP in group '{name}', found '{}'",
                    parser.nth(0).map(ToString::to_string).unwrap_or_default()
                )));
            };
            members.push((member, line));
        }
    }

    Ok(RawGroup {
        name,
        line: block.line(),
        members,
    })
}

struct Resolver<'a> {
    raw_groups: &'a IndexMap<SmolStr, RawGroup>,
    glyphs: &'a IndexMap<GlyphName, GlyphDefinition>,
}

impl Resolver<'_> {
    /// Flatten a group's members; `visiting` holds the groups on the current path.
    fn resolve(
        &self,
        group: &RawGroup,
        visiting: &mut HashSet<SmolStr>,
    ) -> Result<Vec<GlyphName>, Error> {
        if !visiting.insert(group.name.clone()) {
            return Err(Error::parse(
                group.line,
                format!("group '{}' contains itself", group.name),
            ));
        }
        let mut resolved = Vec::with_capacity(group.members.len());
        for (member, line) in &group.members {
            match member {
                Member::Glyph(name) => resolved.push(name.clone()),
                Member::Range(first, last) => resolved.extend(self.range(first, last, *line)?),
                Member::Group(name) => {
                    let inner = self.raw_groups.get(name).ok_or_else(|| {
                        Error::parse(*line, format!("reference to undefined group '{name}'"))
                    })?;
                    resolved.extend(self.resolve(inner, visiting)?);
                }
            }
        }
        visiting.remove(&group.name);
        Ok(resolved)
    }

    /// All glyphs with ids between those of `first` and `last`, in id order.
    fn range(
        &self,
        first: &GlyphName,
        last: &GlyphName,
        line: usize,
    ) -> Result<Vec<GlyphName>, Error> {
        let id_of = |name: &GlyphName| {
            self.glyphs
                .get(name)
                .map(|g| g.id)
                .ok_or_else(|| {
                    Error::parse(line, format!("range endpoint '{name}' is not a glyph"))
                })
        };
        let (start, end) = (id_of(first)?, id_of(last)?);
        if start > end {
            return Err(Error::parse(
                line,
                format!("range '{first}' to '{last}' is reversed"),
            ));
        }
        let mut in_range = self
            .glyphs
            .values()
            .filter(|g| (start..=end).contains(&g.id))
            .collect::<Vec<_>>();
        in_range.sort_by_key(|g| g.id);
        Ok(in_range.into_iter().map(|g| g.name.clone()).collect())
    }
}
