//! Reading of BDD archives in the (text) DDDMP format.
//!
//! An archive stores one or more BDD roots, together with enough information about the
//! variables of the manager which wrote it to bind them again later: the names of the
//! support variables, their indices and their levels (the "permutation ids"). Roots can
//! carry labels, e.g. `TRANS` for a transition relation.
//!
//! We support the ASCII variant (`.mode A`) of DDDMP 2.0 with complemented else-edges:
//!
//! ```text
//! .ver DDDMP-2.0
//! .mode A
//! .varinfo 3
//! .nnodes 3
//! .nvars 2
//! .nsuppvars 2
//! .suppvarnames a b
//! .ids 0 1
//! .permids 0 1
//! .nroots 1
//! .rootids 3
//! .rootnames TRANS
//! .nodes
//! 1 T 1 0 0
//! 2 b 1 1 -1
//! 3 a 0 2 -1
//! .end
//! ```
//!
//! Every node line is `<id> <info> <support position> <then id> <else id>`, where a negative
//! `else id` (or root id) denotes a complemented edge. The `info` field depends on
//! `.varinfo`: the stored index (`0`), the stored level (`1`), an auxiliary id (`2`) or the
//! name (`3`) of the variable. With `.varinfo 4`, or without the header, the field is
//! omitted. The only terminal is the constant `1` node written as `<id> T 1 0 0`. Nodes
//! always refer to nodes with smaller ids.
//!
//! Which roots are loaded and how stored variables are mapped to the variables of a live
//! manager is decided by the caller through `RootMatch` and `VarMatch`.

use crate::{BddRef, NameTable, VarIndex};
use std::path::{Path, PathBuf};

/// **(internal)** Parsing of the text format into a `DddmpArchive`.
mod _impl_parser;

/// **(internal)** Reconstruction of archived roots inside a `BddManager`.
mod _impl_reader;

/// The root label under which transition relations are stored.
pub const TRANSITION_RELATION_LABEL: &str = "TRANS";

/// Selects which of the stored roots are loaded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RootMatch {
    /// Load the roots with the given labels, in this order. Every label must exist.
    Names(Vec<String>),
    /// Load all stored roots in archive order.
    All,
}

/// Selects how stored variables are bound to the variables of the live manager.
#[derive(Clone, Copy, Debug)]
pub enum VarMatch<'a> {
    /// A stored variable is placed at the level whose slot in the table carries its name.
    Names(&'a NameTable),
    /// A stored variable keeps its stored index.
    Ids,
    /// A stored variable is placed at its stored level.
    PermIds,
    /// The stored index `i` of a variable is mapped to the live index at position `i`.
    ComposeIds(&'a [VarIndex]),
}

/// Optional hooks of the loading protocol. The default uses none of them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadOptions {
    /// Applied to the raw file contents before parsing, e.g. to decompress an archive.
    pub decode: Option<fn(Vec<u8>) -> std::io::Result<Vec<u8>>>,
}

/// Errors raised while reading an archive. None of them leaves any root in the manager.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("cannot read archive `{}`: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error while reading archive: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive is not valid UTF-8")]
    Encoding,
    #[error("archive ended before {0}")]
    UnexpectedEof(&'static str),
    #[error("archive header `.{0}` is missing")]
    MissingHeader(&'static str),
    #[error("invalid archive header on line {line}: {reason}")]
    InvalidHeader { line: usize, reason: String },
    #[error("inconsistent archive header: {0}")]
    Inconsistent(String),
    #[error("unsupported archive mode `{0}`")]
    UnsupportedMode(String),
    #[error("invalid node on line {line}: {reason}")]
    InvalidNode { line: usize, reason: String },
    #[error("root `{0}` does not exist in the archive")]
    RootNotFound(String),
    #[error("archive variable `{0}` does not match any variable of the manager")]
    VariableNotFound(String),
    #[error("archive variable {variable} maps outside of the {num_vars} manager variables")]
    VariableOutOfRange { variable: String, num_vars: usize },
}

/// The protocol for loading archived roots into a manager of type `M`.
pub trait ArchiveReader<M: ?Sized> {
    /// Load the roots selected by `roots` from the archive at `path`, binding stored
    /// variables according to `vars`.
    ///
    /// On success, the result contains one root per selected label (in the same order) and
    /// every returned `BddRef` carries one reference owned by the caller. On failure, no
    /// root is added to the manager.
    fn load(
        &self,
        manager: &mut M,
        roots: &RootMatch,
        vars: VarMatch<'_>,
        options: &LoadOptions,
        path: &Path,
    ) -> Result<Vec<BddRef>, ArchiveError>;
}

/// A parsed, but not yet loaded, DDDMP archive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DddmpArchive {
    dd_name: Option<String>,
    num_vars: usize,
    support_names: Option<Vec<String>>,
    support_ids: Vec<u32>,
    support_perm_ids: Vec<u32>,
    root_ids: Vec<i64>,
    root_names: Option<Vec<String>>,
    nodes: Vec<DddmpNode>,
}

/// **(internal)** One node of a parsed archive. Node `i` of the node list has id `i + 1`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DddmpNode {
    One,
    Decision {
        support: usize,
        then_id: usize,
        else_id: i64,
    },
}

/// Reads DDDMP text archives into a `BddManager`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DddmpReader;

impl RootMatch {
    /// Match a single root labelled `TRANS`.
    pub fn transition_relation() -> RootMatch {
        RootMatch::Names(vec![TRANSITION_RELATION_LABEL.to_string()])
    }

    /// Match roots with the given labels.
    pub fn names(labels: &[&str]) -> RootMatch {
        RootMatch::Names(labels.iter().map(|it| it.to_string()).collect())
    }
}
