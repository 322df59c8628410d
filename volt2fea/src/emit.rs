//! Writing a [`VoltFont`] as an OpenType feature file.
//!
//! FEA requires things to be defined before they are used, so the output is
//! always laid out as: language systems, lookups, groups, features, and
//! finally the GDEF glyph classes.

use std::fmt::Write;

use indexmap::IndexSet;
use write_fonts::types::Tag;

use crate::{
    error::Error,
    ir::{GlyphName, VoltFont},
    names::{NameKind, NameRegistry},
    Flags,
};

const INDENT: &str = "    ";

/// Generate FEA for `font`.
///
/// All names are registered before anything is written, so name collisions
/// are found before any output exists.
pub fn to_fea(font: &VoltFont, flags: Flags) -> Result<String, Error> {
    let mut lookup_names = NameRegistry::new(NameKind::Lookup);
    for name in font.lookups.keys() {
        lookup_names.register(name)?;
    }
    let mut group_names = NameRegistry::new(NameKind::Group);
    for name in font.groups.keys() {
        group_names.register(name)?;
    }

    let mut out = String::new();
    if flags.contains(Flags::ANNOTATE_SKIPPED) && !font.skipped.is_empty() {
        writeln!(out, "# Not converted:")?;
        for skipped in &font.skipped {
            writeln!(out, "#   {skipped}")?;
        }
        writeln!(out)?;
    }
    write_language_systems(&mut out, font)?;
    write_lookups(&mut out, font, &mut lookup_names)?;
    write_groups(&mut out, font, &mut group_names)?;
    write_features(&mut out, font, &lookup_names)?;
    write_gdef(&mut out, font)?;
    Ok(out)
}

/// A tag as written in FEA, without trailing padding.
fn fea_tag(tag: Tag) -> String {
    tag.to_string().trim_end().to_string()
}

fn join(glyphs: &[GlyphName]) -> String {
    glyphs
        .iter()
        .map(GlyphName::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_language_systems(out: &mut String, font: &VoltFont) -> Result<(), Error> {
    let systems = font.language_systems().collect::<IndexSet<_>>();
    for (script, language) in &systems {
        writeln!(
            out,
            "languagesystem {} {};",
            fea_tag(*script),
            fea_tag(*language)
        )?;
    }
    if !systems.is_empty() {
        writeln!(out)?;
    }
    Ok(())
}

fn write_lookups(out: &mut String, font: &VoltFont, names: &mut NameRegistry) -> Result<(), Error> {
    for lookup in font.lookups.values() {
        let name = names.register(&lookup.name)?;
        let flags = lookup.flags.fea_names();
        let flags = if flags.is_empty() {
            "0".to_string()
        } else {
            flags.join(" ")
        };
        writeln!(out, "lookup {name} {{")?;
        writeln!(out, "{INDENT}lookupflag {flags};")?;
        for rule in &lookup.rules {
            writeln!(
                out,
                "{INDENT}sub {} by {};",
                join(&rule.input),
                join(&rule.output)
            )?;
        }
        writeln!(out, "}} {name};")?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_groups(out: &mut String, font: &VoltFont, names: &mut NameRegistry) -> Result<(), Error> {
    for group in font.groups.values() {
        let name = names.register(&group.name)?;
        writeln!(out, "{name} = [{}];", join(&group.members))?;
    }
    if !font.groups.is_empty() {
        writeln!(out)?;
    }
    Ok(())
}

fn write_features(out: &mut String, font: &VoltFont, names: &NameRegistry) -> Result<(), Error> {
    for feature in font.features() {
        let tag = fea_tag(feature.tag);
        writeln!(out, "feature {tag} {{")?;
        writeln!(out, "{INDENT}script {};", fea_tag(feature.script))?;
        writeln!(out, "{INDENT}language {};", fea_tag(feature.language))?;
        for lookup in &feature.lookups {
            // lookups are all written above, so any name we know is defined
            let name = names.get(lookup).ok_or_else(|| Error::UndefinedLookup {
                feature: feature.tag,
                lookup: lookup.clone(),
            })?;
            writeln!(out, "{INDENT}lookup {name};")?;
        }
        writeln!(out, "}} {tag};")?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_gdef(out: &mut String, font: &VoltFont) -> Result<(), Error> {
    let mut class_names = Vec::new();
    for (class, glyphs) in font.glyph_classes.iter() {
        let name = format!("@GDEF_{class}");
        writeln!(out, "{name} = [{}];", join(glyphs))?;
        class_names.push(name);
    }
    writeln!(out, "table GDEF {{")?;
    writeln!(out, "{INDENT}GlyphClassDef {};", class_names.join(", "))?;
    writeln!(out, "}} GDEF;")?;
    Ok(())
}
