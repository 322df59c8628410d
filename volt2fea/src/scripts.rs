//! Building the script → language system → feature tree.

use log::debug;
use smol_str::SmolStr;
use write_fonts::types::Tag;

use crate::{
    blocks::{extract, first_stray, Block, BlockKind},
    error::Error,
    ir::{Feature, LangSys, Script},
    parse::Parser,
};

pub(crate) fn build(blocks: &[Block]) -> Result<Vec<Script>, Error> {
    let scripts = blocks.iter().map(parse_script).collect::<Result<Vec<_>, _>>()?;
    debug!(
        "{} scripts, {} language systems",
        scripts.len(),
        scripts.iter().map(|s| s.lang_systems.len()).sum::<usize>()
    );
    Ok(scripts)
}

/// `<keyword> [NAME "name"] TAG "tag"`
fn parse_header(parser: &mut Parser, keyword: &str) -> Result<(Option<SmolStr>, Tag), Error> {
    parser.expect(keyword)?;
    let name = if parser.eat("NAME") {
        Some(parser.expect_string("a quoted name")?.clone())
    } else {
        None
    };
    parser.expect("TAG")?;
    let tag = parser.expect_tag()?;
    Ok((name, tag))
}

fn parse_script(block: &Block) -> Result<Script, Error> {
    let mut parser = block.parser();
    let (name, tag) = parse_header(&mut parser, "DEF_SCRIPT")?;
    let rest = parser.rest();
    let children = extract(rest, BlockKind::LangSys)?;
    if let Some(token) = first_stray(rest, &children) {
        return Err(Error::parse(
            token.line,
            format!("expected DEF_LANGSYS or END_SCRIPT in script '{tag}', found '{token}'"),
        ));
    }
    let lang_systems = children
        .iter()
        .map(|block| parse_lang_sys(block, tag))
        .collect::<Result<_, _>>()?;
    Ok(Script {
        tag,
        name,
        lang_systems,
    })
}

fn parse_lang_sys(block: &Block, script: Tag) -> Result<LangSys, Error> {
    let mut parser = block.parser();
    let (name, tag) = parse_header(&mut parser, "DEF_LANGSYS")?;
    let rest = parser.rest();
    let children = extract(rest, BlockKind::Feature)?;
    if let Some(token) = first_stray(rest, &children) {
        let message = format!(
            "expected DEF_FEATURE or END_LANGSYS in language system '{tag}', found '{token}'"
        );
        return Err(Error::parse(token.line, message));
    }
    let features = children
        .iter()
        .map(|block| parse_feature(block, script, tag))
        .collect::<Result<_, _>>()?;
    Ok(LangSys {
        tag,
        name,
        script,
        features,
    })
}

fn parse_feature(block: &Block, script: Tag, language: Tag) -> Result<Feature, Error> {
    let mut parser = block.parser();
    let (name, tag) = parse_header(&mut parser, "DEF_FEATURE")?;
    let mut lookups = Vec::new();
    while parser.eat("LOOKUP") {
        lookups.push(parser.expect_string("a quoted lookup name")?.clone());
    }
    parser.expect("END_FEATURE")?;
    parser.expect_end()?;
    Ok(Feature {
        tag,
        name,
        script,
        language,
        lookups,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lexer::tokenize;

    fn build_from(volt: &str) -> Result<Vec<Script>, Error> {
        let tokens = tokenize(volt)?;
        build(&extract(&tokens, BlockKind::Script)?)
    }

    const TWO_LANGUAGES: &str = r#"
DEF_SCRIPT NAME "Latin" TAG "latn"
DEF_LANGSYS NAME "Default" TAG "dflt"
DEF_FEATURE NAME "Standard Ligatures" TAG "liga"
LOOKUP "liga ff"
LOOKUP "liga fi"
END_FEATURE
DEF_FEATURE NAME "Small Capitals" TAG "smcp"
LOOKUP "smcp"
END_FEATURE
END_LANGSYS
DEF_LANGSYS NAME "Turkish" TAG "TRK "
DEF_FEATURE NAME "Standard Ligatures" TAG "liga"
LOOKUP "liga ff"
END_FEATURE
END_LANGSYS
END_SCRIPT
"#;

    #[test]
    fn one_feature_per_language() {
        let scripts = build_from(TWO_LANGUAGES).unwrap();
        assert_eq!(scripts.len(), 1);
        let latn = &scripts[0];
        assert_eq!(latn.tag, Tag::new(b"latn"));
        assert_eq!(latn.name.as_deref(), Some("Latin"));
        assert_eq!(latn.lang_systems.len(), 2);

        let features = latn
            .lang_systems
            .iter()
            .flat_map(|l| l.features.iter())
            .map(|f| {
                (
                    f.tag.to_string(),
                    f.script.to_string(),
                    f.language.to_string(),
                    f.lookups.iter().map(|l| l.to_string()).collect::<Vec<_>>(),
                )
            })
            .collect::<Vec<_>>();
        assert_eq!(
            features,
            vec![
                (
                    "liga".to_string(),
                    "latn".to_string(),
                    "dflt".to_string(),
                    vec!["liga ff".to_string(), "liga fi".to_string()]
                ),
                (
                    "smcp".to_string(),
                    "latn".to_string(),
                    "dflt".to_string(),
                    vec!["smcp".to_string()]
                ),
                (
                    "liga".to_string(),
                    "latn".to_string(),
                    "TRK ".to_string(),
                    vec!["liga ff".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn name_is_optional() {
        let scripts = build_from(
            "DEF_SCRIPT TAG \"arab\" DEF_LANGSYS TAG \"dflt\" END_LANGSYS END_SCRIPT",
        )
        .unwrap();
        assert_eq!(scripts[0].name, None);
        assert_eq!(scripts[0].lang_systems[0].name, None);
        assert_eq!(scripts[0].lang_systems[0].script, Tag::new(b"arab"));
        assert!(scripts[0].lang_systems[0].features.is_empty());
    }

    #[test]
    fn feature_with_junk() {
        let err = build_from(
            "DEF_SCRIPT TAG \"latn\"
             DEF_LANGSYS TAG \"dflt\"
             DEF_FEATURE TAG \"liga\" LOOKUP \"a\" GLYPH \"b\" END_FEATURE
             END_LANGSYS END_SCRIPT",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "line 3: expected END_FEATURE, found 'GLYPH'");
    }

    #[test]
    fn feature_directly_under_script() {
        let err = build_from(
            "DEF_SCRIPT TAG \"latn\"
             DEF_FEATURE TAG \"liga\" LOOKUP \"x\" END_FEATURE
             DEF_LANGSYS TAG \"dflt\" END_LANGSYS
             END_SCRIPT",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 2: expected DEF_LANGSYS or END_SCRIPT in script 'latn', found 'DEF_FEATURE'"
        );
    }

    #[test]
    fn stray_token_in_language_system() {
        let err = build_from(
            "DEF_SCRIPT TAG \"latn\"
             DEF_LANGSYS TAG \"dflt\"
             JUNK
             DEF_FEATURE TAG \"smcp\" END_FEATURE
             END_LANGSYS
             END_SCRIPT",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 3: expected DEF_FEATURE or END_LANGSYS in language system 'dflt', found 'JUNK'"
        );
    }

    #[test]
    fn stray_string_after_language_systems() {
        let err = build_from(
            "DEF_SCRIPT TAG \"latn\" DEF_LANGSYS TAG \"dflt\" END_LANGSYS \"stuff\" END_SCRIPT",
        )
        .unwrap_err();
        assert!(err.to_string().ends_with("found '\"stuff\"'"), "{err}");
    }

    #[test]
    fn missing_tag() {
        let err = build_from("DEF_SCRIPT NAME \"Latin\" END_SCRIPT").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{err:?}");
    }

    #[test]
    fn unterminated_language_system() {
        let err = build_from(
            "DEF_SCRIPT TAG \"latn\" DEF_LANGSYS TAG \"dflt\" END_SCRIPT",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "line 1: DEF_LANGSYS without END_LANGSYS");
    }
}
