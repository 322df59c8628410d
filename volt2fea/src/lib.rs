//! Convert VOLT layout sources to OpenType feature files.
//!
//! Microsoft VOLT keeps its project source in a private `TSIV` table. This
//! crate reads that source (or a `.vtp` export of it), builds a small
//! intermediate representation ([`VoltFont`]) and writes it back out as FEA.
//! Glyph classes, groups, scripts, features and simple substitution lookups
//! are converted; everything else is reported as [`Skipped`].

#[cfg(feature = "cli")]
pub mod args;
mod blocks;
mod emit;
mod error;
mod glyphs;
mod groups;
pub mod ir;
mod lexer;
mod lookups;
pub mod names;
mod parse;
mod scripts;
pub mod source;

use std::collections::HashSet;

use bitflags::bitflags;
use log::debug;
use smol_str::SmolStr;

#[cfg(feature = "cli")]
pub use args::Args;
pub use emit::to_fea;
pub use error::Error;
pub use ir::{Skipped, VoltFont};

use blocks::SourceBlocks;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Flags: u32 {
        /// Fail instead of dropping constructs we can not convert
        const STRICT = 0b0001;
        /// Start the output with a comment listing what was not converted
        const ANNOTATE_SKIPPED = 0b0010;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::ANNOTATE_SKIPPED
    }
}

/// Build the intermediate representation of a VOLT source.
pub fn parse_source(source: &str) -> Result<VoltFont, Error> {
    let source = source::normalize_newlines(source);
    let tokens = lexer::tokenize(&source)?;
    let blocks = SourceBlocks::extract(&tokens)?;

    let (glyphs, glyph_classes) = glyphs::build(&blocks.glyphs)?;
    let groups = groups::build(&blocks.groups, &glyphs)?;
    let scripts = scripts::build(&blocks.scripts)?;
    let (lookups, skipped) =
        lookups::build(&blocks.substitutions, &blocks.positions, &blocks.anchors)?;

    let mut font = VoltFont {
        glyphs,
        glyph_classes,
        groups,
        scripts,
        lookups,
        skipped,
    };
    resolve_lookup_references(&mut font)?;
    Ok(font)
}

/// Drop feature references to lookups we skipped, recording each one.
///
/// A reference to a lookup that was never defined at all is an error.
fn resolve_lookup_references(font: &mut VoltFont) -> Result<(), Error> {
    let skipped_lookups = font
        .skipped
        .iter()
        .filter_map(Skipped::lookup_name)
        .cloned()
        .collect::<HashSet<SmolStr>>();

    let mut dropped = Vec::new();
    for feature in font
        .scripts
        .iter_mut()
        .flat_map(|script| script.lang_systems.iter_mut())
        .flat_map(|lang_sys| lang_sys.features.iter_mut())
    {
        let mut kept = Vec::with_capacity(feature.lookups.len());
        for lookup in feature.lookups.drain(..) {
            if font.lookups.contains_key(&lookup) {
                kept.push(lookup);
            } else if skipped_lookups.contains(&lookup) {
                debug!(
                    "dropping reference to skipped lookup '{lookup}' from '{}'",
                    feature.tag
                );
                dropped.push(Skipped::LookupReference {
                    feature: feature.tag,
                    script: feature.script,
                    language: feature.language,
                    lookup,
                });
            } else {
                return Err(Error::UndefinedLookup {
                    feature: feature.tag,
                    lookup,
                });
            }
        }
        feature.lookups = kept;
    }
    font.skipped.extend(dropped);
    Ok(())
}

/// A converted font: the representation and the FEA written from it.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub font: VoltFont,
    pub fea: String,
}

impl Conversion {
    pub fn from_font(font: VoltFont, flags: Flags) -> Result<Self, Error> {
        if flags.contains(Flags::STRICT) && !font.skipped.is_empty() {
            return Err(Error::Unsupported(font.skipped));
        }
        let fea = to_fea(&font, flags)?;
        Ok(Conversion { font, fea })
    }

    /// Everything in the source that did not make it into the output.
    pub fn skipped(&self) -> &[Skipped] {
        &self.font.skipped
    }
}

/// Convert VOLT source text to FEA.
pub fn convert(source: &str, flags: Flags) -> Result<Conversion, Error> {
    Conversion::from_font(parse_source(source)?, flags)
}

/// Run a conversion as described by command line arguments.
///
/// Nothing is written, not even the IR dump, unless the conversion succeeds.
#[cfg(feature = "cli")]
pub fn run(args: &Args) -> Result<Conversion, Error> {
    let source = source::load(&args.input, args.index)?;
    let font = parse_source(&source)?;
    let ir = match &args.emit_ir {
        Some(ir_path) => Some((ir_path, serde_yaml::to_string(&font)?)),
        None => None,
    };
    let conversion = Conversion::from_font(font, args.flags())?;
    if let Some((ir_path, yaml)) = ir {
        std::fs::write(ir_path, yaml).map_err(|inner| Error::FileWrite {
            path: ir_path.clone(),
            inner,
        })?;
        debug!("wrote IR to {}", ir_path.display());
    }
    std::fs::write(&args.output, &conversion.fea).map_err(|inner| Error::FileWrite {
        path: args.output.clone(),
        inner,
    })?;
    log::info!(
        "wrote {} lookups and {} features to {}",
        conversion.font.lookups.len(),
        conversion.font.features().count(),
        args.output.display()
    );
    Ok(conversion)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use write_fonts::types::Tag;

    use super::*;

    const LIGA: &str = r#"DEF_GLYPH "f" ID 1 TYPE BASE END_GLYPH
DEF_GLYPH "f_f" ID 2 TYPE LIGATURE COMPONENTS 2 END_GLYPH
DEF_SCRIPT NAME "Latin" TAG "latn"
DEF_LANGSYS NAME "Default" TAG "dflt"
DEF_FEATURE NAME "Standard Ligatures" TAG "liga"
LOOKUP "liga ff"
LOOKUP "calt a"
END_FEATURE
END_LANGSYS
END_SCRIPT
DEF_LOOKUP "liga ff" PROCESS_BASE PROCESS_MARKS ALL DIRECTION LTR
IN_CONTEXT
END_CONTEXT
AS_SUBSTITUTION
SUB GLYPH "f" GLYPH "f"
WITH GLYPH "f_f"
END_SUB
END_SUBSTITUTION
DEF_LOOKUP "calt a" PROCESS_BASE PROCESS_MARKS ALL DIRECTION LTR
IN_CONTEXT
LEFT GLYPH "f"
END_CONTEXT
AS_SUBSTITUTION
SUB GLYPH "f" WITH GLYPH "f_f" END_SUB
END_SUBSTITUTION
"#;

    #[test]
    fn skipped_lookups_are_not_referenced() {
        let font = parse_source(LIGA).unwrap();
        let feature = font.features().next().unwrap();
        assert_eq!(feature.lookups, vec![SmolStr::from("liga ff")]);
        assert_eq!(
            font.skipped,
            vec![
                Skipped::ContextualSubstitution {
                    lookup: "calt a".into(),
                    line: 19
                },
                Skipped::LookupReference {
                    feature: Tag::new(b"liga"),
                    script: Tag::new(b"latn"),
                    language: Tag::new(b"dflt"),
                    lookup: "calt a".into(),
                },
            ]
        );
    }

    #[test]
    fn undefined_lookup_reference() {
        let source = LIGA.replace("LOOKUP \"calt a\"\n", "LOOKUP \"nope\"\n");
        let err = parse_source(&source).unwrap_err();
        assert_eq!(
            err.to_string(),
            "feature 'liga' references undefined lookup 'nope'"
        );
    }

    #[test]
    fn strict_refuses_skipped() {
        let err = convert(LIGA, Flags::STRICT).unwrap_err();
        let Error::Unsupported(skipped) = err else {
            panic!("expected unsupported, got {err:?}");
        };
        assert_eq!(skipped.len(), 2);
    }

    #[test]
    fn crlf_source() {
        let unix = convert(LIGA, Flags::default()).unwrap();
        let windows = convert(&LIGA.replace('\n', "\r\n"), Flags::default()).unwrap();
        assert_eq!(unix.fea, windows.fea);
    }

    #[test]
    fn conversion_is_deterministic() {
        let first = convert(LIGA, Flags::default()).unwrap();
        let second = convert(LIGA, Flags::default()).unwrap();
        assert_eq!(first.fea, second.fea);
    }

    #[cfg(feature = "cli")]
    mod cli {
        use std::path::Path;

        use clap::Parser;
        use pretty_assertions::assert_eq;
        use tempfile::tempdir;
        use write_fonts::FontBuilder;

        use super::*;
        use crate::source::TSIV;

        fn args(input: &Path, output: &Path, extra: &[&str]) -> Args {
            let mut argv = vec![
                "volt2fea".to_string(),
                input.display().to_string(),
                output.display().to_string(),
            ];
            argv.extend(extra.iter().map(|s| s.to_string()));
            Args::parse_from(argv)
        }

        #[test]
        fn converts_font() {
            let _ = env_logger::builder().is_test(true).try_init();
            let temp_dir = tempdir().unwrap();
            let font_path = temp_dir.path().join("font.ttf");
            let fea_path = temp_dir.path().join("font.fea");
            let font = FontBuilder::new()
                .add_raw(TSIV, LIGA.as_bytes())
                .build();
            std::fs::write(&font_path, font).unwrap();

            let conversion = run(&args(&font_path, &fea_path, &[])).unwrap();
            let written = std::fs::read_to_string(&fea_path).unwrap();
            assert_eq!(conversion.fea, written);
            assert!(written.contains("sub f f by f_f;"), "{written}");
            assert_eq!(conversion.skipped().len(), 2);
        }

        #[test]
        fn emits_ir() {
            let temp_dir = tempdir().unwrap();
            let vtp_path = temp_dir.path().join("font.vtp");
            let fea_path = temp_dir.path().join("font.fea");
            let ir_path = temp_dir.path().join("font.yml");
            std::fs::write(&vtp_path, LIGA).unwrap();

            run(&args(
                &vtp_path,
                &fea_path,
                &["--emit-ir", &ir_path.display().to_string()],
            ))
            .unwrap();
            let ir = std::fs::read_to_string(&ir_path).unwrap();
            assert!(ir.contains("liga ff"), "{ir}");
        }

        #[test]
        fn nothing_written_on_failure() {
            let temp_dir = tempdir().unwrap();
            let vtp_path = temp_dir.path().join("font.vtp");
            let fea_path = temp_dir.path().join("font.fea");
            std::fs::write(
                &vtp_path,
                LIGA.replace("DIRECTION LTR\nIN_CONTEXT\nEND_CONTEXT", "BOGUS"),
            )
            .unwrap();

            let err = run(&args(&vtp_path, &fea_path, &[])).unwrap_err();
            assert!(matches!(err, Error::UnknownFlag { .. }), "{err:?}");
            assert!(!fea_path.exists());
        }

        #[test]
        fn strict_writes_nothing() {
            let temp_dir = tempdir().unwrap();
            let vtp_path = temp_dir.path().join("font.vtp");
            let fea_path = temp_dir.path().join("font.fea");
            let ir_path = temp_dir.path().join("font.yml");
            std::fs::write(&vtp_path, LIGA).unwrap();

            let err = run(&args(
                &vtp_path,
                &fea_path,
                &["--strict", "--emit-ir", &ir_path.display().to_string()],
            ))
            .unwrap_err();
            assert!(matches!(err, Error::Unsupported(_)), "{err:?}");
            assert!(!fea_path.exists());
            assert!(!ir_path.exists());
        }

        #[test]
        fn missing_input() {
            let temp_dir = tempdir().unwrap();
            let err = run(&args(
                &temp_dir.path().join("nope.ttf"),
                &temp_dir.path().join("out.fea"),
                &[],
            ))
            .unwrap_err();
            assert!(matches!(err, Error::Load { .. }), "{err:?}");
        }
    }
}
