//! # Biodivine/BddImport
//!
//! This crate restores archived [binary decision diagrams](https://en.wikipedia.org/wiki/Binary_decision_diagram)
//! (BDDs) into a live BDD manager. The archive stores its own variable ordering and variable
//! names, while the manager may have been reordered any number of times since the archive was
//! written. Loading therefore re-establishes the correspondence between stored variables and
//! the manager's *current* levels by matching variable names.
//!
//! The process has two steps:
//!
//!  - A `NameTable` is built from the manager and a naming subsystem (`VariableNaming`). It has
//!    one slot per current level, slot `0` is always empty and next-state variables are never
//!    named, so that the archive cannot bind them by accident.
//!  - The archive reader (`dddmp::DddmpReader`) selects roots by label and binds each stored
//!    variable to the level whose slot carries the same name. Every loaded root is registered
//!    in the manager and handed to the caller as an owned `BddRef`.
//!
//! ```rust
//! use biodivine_bdd_import::*;
//! use biodivine_bdd_import::dddmp::DddmpReader;
//!
//! let mut builder = VariableEncodingBuilder::new();
//! let a = builder.make_variable("a");
//! let _a_next = builder.make_next_variable(a);
//! let b = builder.make_variable("b");
//! let encoding = builder.build();
//! let mut manager = BddManager::new(encoding.num_vars());
//!
//! let table = NameTable::build(&manager, &encoding).unwrap();
//! assert_eq!(Some("a"), table.get(1));
//! assert_eq!(None, table.get(2));
//! assert_eq!(Some("b"), table.get(3));
//!
//! let archive = "\
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
//! ";
//! let roots = DddmpReader::new()
//!     .read_from(
//!         &mut manager,
//!         &RootMatch::transition_relation(),
//!         VarMatch::Names(&table),
//!         &mut archive.as_bytes(),
//!     )
//!     .unwrap();
//! assert_eq!(1, roots.len());
//! assert_eq!(Some(true), manager.eval(roots[0], |v| v == a || v == b));
//! assert_eq!(Some(false), manager.eval(roots[0], |v| v == a));
//! ```
//!

use fxhash::FxBuildHasher;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub mod dddmp;
pub mod import;

pub use dddmp::{ArchiveError, ArchiveReader, LoadOptions, RootMatch, VarMatch};
pub use import::{ImportError, LoaderConfig, VarMatchMode};

/// **(internal)** Implementations for the `Bdd` struct.
mod _impl_bdd;

/// **(internal)** Implementation of the `BddNode` and `BddPointer`.
mod _impl_bdd_node;

/// **(internal)** Implementation of the `BddBuilder`.
mod _impl_bdd_builder;

/// **(internal)** Implementation of the `BddLevel` and `VarIndex`.
mod _impl_bdd_level;

/// **(internal)** Implementation of the `VariableOrder`.
mod _impl_variable_order;

/// **(internal)** Implementation of the `BddManager`.
mod _impl_bdd_manager;

/// **(internal)** Implementation of the `VarName` and `VariableEncoding`.
mod _impl_variable_encoding;

/// **(internal)** Implementation of the `VariableEncodingBuilder`.
mod _impl_variable_encoding_builder;

/// **(internal)** Implementation of the `NameTable`.
mod _impl_name_table;

/// Several basic utility methods for testing.
#[cfg(test)]
mod _test_util;

/// **(internal)** Characters that cannot appear in a variable name, because the archive
/// format separates names by whitespace and `'` marks next-state variables.
const NOT_IN_VAR_NAME: [char; 4] = [' ', '\t', '\n', '\''];

/// An array-based encoding of the binary decision diagram over the levels of a `BddManager`.
///
/// Nodes are ordered so that children always precede their parents, the root is the last
/// node, and decision levels strictly increase along every path. The two terminal nodes
/// store the level count of the manager which created the `Bdd`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Bdd(Vec<BddNode>);

/// A position in the current variable ordering of a `BddManager`.
///
/// Levels are only meaningful with respect to one particular ordering: once the manager is
/// reordered, the same variable can sit at a different level.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BddLevel(u16);

/// A stable identifier of a manager variable. Unlike `BddLevel`, an index never changes
/// when the manager is reordered.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VarIndex(pub u16);

/// A type-safe index into the `Bdd` node array representation.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BddPointer(u32);

/// **(internal)** Representation of individual vertices of the `Bdd` directed acyclic graph.
///
/// Terminal nodes use the same structure with cyclic pointers, and instead of a level they
/// store the number of levels of the manager.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct BddNode {
    pub level: BddLevel,
    pub low_link: BddPointer,
    pub high_link: BddPointer,
}

/// **(internal)** A node store shared by many diagrams over the same levels.
///
/// Every decision node is stored exactly once, so functions built in one builder share
/// their common sub-diagrams. Results are copied out as standalone `Bdd`s by `extract`.
struct BddBuilder {
    nodes: Bdd,
    unique: HashMap<BddNode, BddPointer, FxBuildHasher>,
    decisions: HashMap<(BddLevel, BddPointer, BddPointer), BddPointer, FxBuildHasher>,
}

/// Bijection between the levels of a manager and its variable indices.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariableOrder {
    /// `index_to_level[i]` is the level of variable `i`.
    index_to_level: Vec<u16>,
    /// The inverse of `index_to_level`.
    level_to_index: Vec<u16>,
}

/// A handle to a root registered in a `BddManager`.
///
/// The handle does not own anything by itself. Whoever obtained it from an operation that
/// returns a new reference is responsible for a matching `BddManager::dec_ref`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BddRef(u32);

/// A decision diagram manager: it fixes the current variable ordering and keeps
/// reference-counted roots which are rebuilt whenever the ordering changes.
///
/// The manager is not synchronised. All mutating operations take `&mut self`, so concurrent
/// access has to be serialised by the caller (e.g. through a `Mutex`).
#[derive(Clone, Debug)]
pub struct BddManager {
    order: VariableOrder,
    roots: Vec<Option<RootSlot>>,
    free_slots: Vec<u32>,
}

/// **(internal)** One registered root of a `BddManager`.
#[derive(Clone, Debug)]
struct RootSlot {
    bdd: Bdd,
    ref_count: usize,
}

/// Errors raised by `BddManager` operations.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ManagerError {
    #[error("invalid variable order: {0}")]
    InvalidOrder(String),
    #[error("{0:?} is not a live root of this manager")]
    UnknownRef(BddRef),
}

/// Distinguishes ordinary variables from the next-state copies used in transition relations.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NameKind {
    Current,
    Next,
}

/// A semantic variable name, as known to the naming subsystem.
///
/// The text is shared, so rendering a name into a `NameTable` does not copy it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct VarName {
    text: Arc<str>,
    kind: NameKind,
}

/// Maintains the names of manager variables. Every `VarIndex` below `num_vars` has a slot,
/// which may be empty.
#[derive(Clone, Debug)]
pub struct VariableEncoding {
    names: Vec<Option<VarName>>,
}

/// Used to safely initialize `VariableEncoding`.
///
/// Index `0` is reserved and never carries a name. Names must be unique and cannot contain
/// whitespace or `'`.
#[derive(Clone, Debug)]
pub struct VariableEncodingBuilder {
    names: Vec<Option<VarName>>,
    used_names: HashSet<String>,
}

/// Positional table of variable names, one slot per level of a manager.
///
/// Slot `0` never holds a name and neither do slots of unnamed or next-state variables.
/// The table reflects the ordering at the moment it was built, so it has to be rebuilt
/// for every load.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NameTable(Vec<Option<Arc<str>>>);

/// Read access to the variable ordering of a decision diagram manager.
pub trait DiagramManager {
    /// Number of levels (and variables) of this manager.
    fn variable_count(&self) -> usize;

    /// The variable index placed at the given `level`.
    ///
    /// *Panics:* `level` must be smaller than `variable_count`.
    fn index_at_level(&self, level: usize) -> VarIndex;
}

/// Resolves variable indices to their semantic names.
pub trait VariableNaming {
    /// The name bound to `index`, if any. An unnamed variable is not an error.
    fn name_of(&self, index: VarIndex) -> Option<&VarName>;
}
