use std::{io, path::PathBuf};

use smol_str::SmolStr;
use thiserror::Error;
use write_fonts::{read::ReadError, types::Tag};

use crate::{ir::Skipped, names::NameKind};

#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("lookup '{lookup}' has unknown flag '{flag}'")]
    UnknownFlag { lookup: SmolStr, flag: String },
    #[error("{} unsupported construct(s): {}", .0.len(), describe(.0))]
    Unsupported(Vec<Skipped>),
    #[error("{kind} names '{first}' and '{second}' are both written as '{sanitized}'")]
    Collision {
        kind: NameKind,
        sanitized: SmolStr,
        first: SmolStr,
        second: SmolStr,
    },
    #[error("{kind} name '{name}' is written as '{sanitized}', which is not a valid FEA name")]
    InvalidName {
        kind: NameKind,
        name: SmolStr,
        sanitized: SmolStr,
    },
    #[error("line {line}: {kind} '{name}' is defined more than once")]
    DuplicateDefinition {
        kind: &'static str,
        name: SmolStr,
        line: usize,
    },
    #[error("feature '{feature}' references undefined lookup '{lookup}'")]
    UndefinedLookup { feature: Tag, lookup: SmolStr },
    #[error("could not read path '{path}': '{inner}'")]
    Load { path: PathBuf, inner: io::Error },
    #[error("could not create file '{path}': '{inner}'")]
    FileWrite { path: PathBuf, inner: io::Error },
    #[error("could not read font data: '{0}'")]
    FontRead(#[from] ReadError),
    #[error("missing table '{0}'")]
    MissingTable(Tag),
    #[error("source is not valid UTF-8: '{0}'")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    YamlSerError(#[from] serde_yaml::Error),
    #[error("failed to format output")]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

fn describe(skipped: &[Skipped]) -> String {
    skipped
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
