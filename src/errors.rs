// errors.rs - Error taxonomy

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions. Any of these aborts a batch run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no files found with extension '{extension}' in {}", dir.display())]
    NoInputFiles { dir: PathBuf, extension: String },
    #[error("locus {locus} has an alternative-model fit but no null-model log-likelihood")]
    MissingPair { locus: String },
    #[error("invalid argument: {msg}")]
    InvalidArgument { msg: String },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write table {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Error::Csv {
            path: path.into(),
            source,
        }
    }
}

/// A section of an estimator output that could not be interpreted.
///
/// Recoverable: the offending row or block is dropped and scanning goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedSection {
    /// 1-based line number in the source file
    pub line: usize,
    /// Name of the extraction rule that rejected the line
    pub rule: &'static str,
    pub detail: String,
}

impl fmt::Display for MalformedSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} [{}]: {}", self.line, self.rule, self.detail)
    }
}

/// Fields whose absence makes a locus incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MissingField {
    Kappa,
    Omega,
    BranchRows,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::Kappa => write!(f, "kappa"),
            MissingField::Omega => write!(f, "omega"),
            MissingField::BranchRows => write!(f, "branch rows"),
        }
    }
}

/// A locus excluded from the summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteLocus {
    pub locus_id: String,
    pub missing: Vec<MissingField>,
}

impl fmt::Display for IncompleteLocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing: Vec<String> = self.missing.iter().map(|m| m.to_string()).collect();
        write!(f, "{} (missing: {})", self.locus_id, missing.join(", "))
    }
}
