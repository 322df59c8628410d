//! Splitting a token stream into construct blocks.
//!
//! A block runs from its begin keyword to the nearest following end keyword.
//! Nested blocks (language systems in a script, features in a language system,
//! enumerations in a group) are found by running the same extraction over the
//! parent block's tokens.

use log::trace;

use crate::{error::Error, lexer::Token, parse::Parser};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum BlockKind {
    Glyph,
    Script,
    LangSys,
    Feature,
    Group,
    Enum,
    /// Either kind of lookup; see [`SourceBlocks`].
    Lookup,
    Anchor,
}

impl BlockKind {
    fn begin(self) -> &'static str {
        match self {
            BlockKind::Glyph => "DEF_GLYPH",
            BlockKind::Script => "DEF_SCRIPT",
            BlockKind::LangSys => "DEF_LANGSYS",
            BlockKind::Feature => "DEF_FEATURE",
            BlockKind::Group => "DEF_GROUP",
            BlockKind::Enum => "ENUM",
            BlockKind::Lookup => "DEF_LOOKUP",
            BlockKind::Anchor => "DEF_ANCHOR",
        }
    }

    fn ends(self) -> &'static [&'static str] {
        match self {
            BlockKind::Glyph => &["END_GLYPH"],
            BlockKind::Script => &["END_SCRIPT"],
            BlockKind::LangSys => &["END_LANGSYS"],
            BlockKind::Feature => &["END_FEATURE"],
            BlockKind::Group => &["END_GROUP"],
            BlockKind::Enum => &["END_ENUM"],
            BlockKind::Lookup => &["END_SUBSTITUTION", "END_POSITION"],
            BlockKind::Anchor => &["END_ANCHOR"],
        }
    }
}

/// The tokens of one construct, including its begin and end keywords.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Block<'a> {
    pub(crate) tokens: &'a [Token],
}

impl<'a> Block<'a> {
    /// The line the block starts on.
    pub(crate) fn line(&self) -> usize {
        self.tokens.first().map(|t| t.line).unwrap_or(1)
    }

    pub(crate) fn parser(&self) -> Parser<'a> {
        Parser::new(self.tokens)
    }

    fn contains(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| t.is_word(word))
    }
}

/// Find every block of `kind` in `tokens`, left to right.
pub(crate) fn extract(tokens: &[Token], kind: BlockKind) -> Result<Vec<Block<'_>>, Error> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some(start) = tokens[pos..]
        .iter()
        .position(|t| t.is_word(kind.begin()))
        .map(|i| pos + i)
    {
        let end = tokens[start + 1..]
            .iter()
            .position(|t| t.is_any_word(kind.ends()))
            .map(|i| start + 1 + i)
            .ok_or_else(|| {
                Error::parse(
                    tokens[start].line,
                    format!("{} without {}", kind.begin(), kind.ends().join(" or ")),
                )
            })?;
        blocks.push(Block {
            tokens: &tokens[start..=end],
        });
        pos = end + 1;
    }
    trace!("found {} {kind:?} blocks", blocks.len());
    Ok(blocks)
}

/// The first token of a parent body that is not part of any of `children`.
///
/// `rest` is the body after the parent's header, ending with its closing
/// keyword; `children` must have been extracted from `rest`.
pub(crate) fn first_stray<'a>(rest: &'a [Token], children: &[Block]) -> Option<&'a Token> {
    let mut pos = 0;
    for child in children {
        let Some(start) = child.tokens.first() else {
            continue;
        };
        if let Some(token) = rest.get(pos).filter(|t| !std::ptr::eq(*t, start)) {
            return Some(token);
        }
        pos += child.tokens.len();
    }
    rest[..rest.len().saturating_sub(1)].get(pos)
}

/// The top-level blocks of a VOLT source.
#[derive(Debug, Default)]
pub(crate) struct SourceBlocks<'a> {
    pub(crate) glyphs: Vec<Block<'a>>,
    pub(crate) scripts: Vec<Block<'a>>,
    pub(crate) groups: Vec<Block<'a>>,
    pub(crate) substitutions: Vec<Block<'a>>,
    pub(crate) positions: Vec<Block<'a>>,
    pub(crate) anchors: Vec<Block<'a>>,
}

impl<'a> SourceBlocks<'a> {
    pub(crate) fn extract(tokens: &'a [Token]) -> Result<Self, Error> {
        let mut substitutions = Vec::new();
        let mut positions = Vec::new();
        for lookup in extract(tokens, BlockKind::Lookup)? {
            let is_sub = lookup.tokens.last().is_some_and(|t| t.is_word("END_SUBSTITUTION"));
            match (is_sub, lookup.contains("AS_SUBSTITUTION"), lookup.contains("AS_POSITION")) {
                (true, true, _) => substitutions.push(lookup),
                (false, _, true) => positions.push(lookup),
                _ => {
                    return Err(Error::parse(
                        lookup.line(),
                        "lookup body does not match its END_SUBSTITUTION/END_POSITION",
                    ))
                }
            }
        }
        Ok(SourceBlocks {
            glyphs: extract(tokens, BlockKind::Glyph)?,
            scripts: extract(tokens, BlockKind::Script)?,
            groups: extract(tokens, BlockKind::Group)?,
            substitutions,
            positions,
            anchors: extract(tokens, BlockKind::Anchor)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn texts(block: &Block) -> Vec<String> {
        block.tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn extracts_in_order() {
        let tokens = tokenize(
            "DEF_GLYPH \"a\" ID 1 END_GLYPH junk DEF_GLYPH \"b\" ID 2 END_GLYPH",
        )
        .unwrap();
        let blocks = extract(&tokens, BlockKind::Glyph).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            texts(&blocks[1]),
            vec!["DEF_GLYPH", "\"b\"", "ID", "2", "END_GLYPH"]
        );
    }

    #[test]
    fn missing_end() {
        let tokens = tokenize("DEF_GLYPH \"a\" ID 1 END_GLYPH\nDEF_GLYPH \"b\" ID 2").unwrap();
        let err = extract(&tokens, BlockKind::Glyph).unwrap_err();
        assert_eq!(err.to_string(), "line 2: DEF_GLYPH without END_GLYPH");
    }

    #[test]
    fn nested_extraction_uses_parent_tokens() {
        let tokens = tokenize(
            "DEF_SCRIPT TAG \"latn\"
             DEF_LANGSYS TAG \"dflt\" END_LANGSYS
             DEF_LANGSYS TAG \"TRK \" END_LANGSYS
             END_SCRIPT
             DEF_LANGSYS TAG \"xxxx\" END_LANGSYS",
        )
        .unwrap();
        let scripts = extract(&tokens, BlockKind::Script).unwrap();
        assert_eq!(scripts.len(), 1);
        let lang_systems = extract(scripts[0].tokens, BlockKind::LangSys).unwrap();
        assert_eq!(lang_systems.len(), 2);
        assert_eq!(lang_systems[1].line(), 3);
    }

    #[test]
    fn lookups_are_split_by_kind() {
        let tokens = tokenize(
            "DEF_LOOKUP \"kern\" IN_CONTEXT END_CONTEXT AS_POSITION ADJUST_PAIR END_ADJUST END_POSITION
             DEF_LOOKUP \"liga\" IN_CONTEXT END_CONTEXT AS_SUBSTITUTION
             SUB GLYPH \"f\" GLYPH \"i\" WITH GLYPH \"fi\" END_SUB
             END_SUBSTITUTION",
        )
        .unwrap();
        let blocks = SourceBlocks::extract(&tokens).unwrap();
        assert_eq!(blocks.positions.len(), 1);
        assert_eq!(blocks.substitutions.len(), 1);
        assert_eq!(blocks.substitutions[0].line(), 2);
    }

    #[test]
    fn stray_tokens_between_children() {
        let tokens = tokenize(
            "DEF_SCRIPT TAG \"latn\"
             DEF_LANGSYS TAG \"dflt\" END_LANGSYS
             JUNK
             DEF_LANGSYS TAG \"TRK \" END_LANGSYS
             END_SCRIPT",
        )
        .unwrap();
        let script = extract(&tokens, BlockKind::Script).unwrap()[0];
        let rest = &script.tokens[3..];
        let children = extract(rest, BlockKind::LangSys).unwrap();
        let stray = first_stray(rest, &children).unwrap();
        assert_eq!((stray.to_string(), stray.line), ("JUNK".to_string(), 3));

        let tokens =
            tokenize("DEF_SCRIPT TAG \"latn\" DEF_LANGSYS TAG \"dflt\" END_LANGSYS END_SCRIPT")
                .unwrap();
        let rest = &tokens[3..];
        let children = extract(rest, BlockKind::LangSys).unwrap();
        assert!(first_stray(rest, &children).is_none());
    }

    #[test]
    fn stray_tokens_after_children() {
        let tokens = tokenize("DEF_GROUP \"g\" ENUM END_ENUM GLYPH \"a\" END_GROUP").unwrap();
        let rest = &tokens[2..];
        let children = extract(rest, BlockKind::Enum).unwrap();
        assert_eq!(first_stray(rest, &children).unwrap().to_string(), "GLYPH");
    }

    #[test]
    fn mismatched_lookup_end() {
        let tokens =
            tokenize("DEF_LOOKUP \"x\" AS_POSITION END_SUBSTITUTION").unwrap();
        assert!(SourceBlocks::extract(&tokens).is_err());
    }
}
