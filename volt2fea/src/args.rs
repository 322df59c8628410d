//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::Flags;

/// Convert the VOLT source in a font to an OpenType feature file
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct Args {
    /// A font with a TSIV table, or a .vtp VOLT project export
    pub input: PathBuf,

    /// Where to write the feature file
    pub output: PathBuf,

    /// Index of font to read, if input is a font collection
    #[arg(short, long)]
    pub index: Option<u32>,

    /// Fail if anything in the source can not be converted.
    #[arg(long)]
    pub strict: bool,

    /// Do not list unconverted constructs in a comment at the top of the output
    #[arg(long)]
    pub no_annotate: bool,

    /// Also write the parsed source, as YAML, to this path
    #[arg(long)]
    pub emit_ir: Option<PathBuf>,
}

impl Args {
    /// Collect various relevant flags into a [`Flags`] object.
    pub fn flags(&self) -> Flags {
        let mut flags = Flags::default();

        flags.set(Flags::STRICT, self.strict);
        flags.set(Flags::ANNOTATE_SKIPPED, !self.no_annotate);

        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags() {
        let args = Args::parse_from(["volt2fea", "in.ttf", "out.fea"]);
        assert_eq!(args.flags(), Flags::ANNOTATE_SKIPPED);
        assert_eq!(args.index, None);
        assert_eq!(args.emit_ir, None);
    }

    #[test]
    fn all_flags() {
        let args = Args::parse_from([
            "volt2fea",
            "in.ttc",
            "out.fea",
            "-i",
            "2",
            "--strict",
            "--no-annotate",
            "--emit-ir",
            "ir.yml",
        ]);
        assert_eq!(args.flags(), Flags::STRICT);
        assert_eq!(args.index, Some(2));
        assert_eq!(args.emit_ir, Some(PathBuf::from("ir.yml")));
    }
}
