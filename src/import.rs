//! Loading archived roots into a live manager, binding variables by name.
//!
//! The loader first builds a `NameTable` for the *current* ordering of the manager, then
//! asks an `ArchiveReader` for the roots with the configured labels. The table only lives
//! for the duration of one call: it is dropped on every exit path, whether the archive was
//! loaded or not.
//!
//! For the common case of restoring a transition relation, see `load_transition_relation`.

use crate::dddmp::{
    ArchiveError, ArchiveReader, DddmpReader, LoadOptions, RootMatch, VarMatch,
    TRANSITION_RELATION_LABEL,
};
use crate::{BddManager, BddRef, DiagramManager, NameTable, VarIndex, VariableNaming};
use std::collections::TryReserveError;
use std::path::Path;
use tracing::{info, warn};

/// How stored variables are bound to manager variables.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum VarMatchMode {
    /// By name, through a `NameTable` built for the current ordering.
    #[default]
    Names,
    /// By stored variable index.
    Ids,
    /// By stored level.
    PermIds,
    /// Stored index `i` becomes the manager variable at position `i`.
    ComposeIds(Vec<VarIndex>),
}

/// Configuration of one load: which roots and how variables are matched.
///
/// The default loads the single root labelled `TRANS` and matches variables by name.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    root_labels: Vec<String>,
    var_match: VarMatchMode,
    options: LoadOptions,
}

/// Errors raised by the loader.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("cannot allocate memory for variable names")]
    NameTableAllocation(#[source] TryReserveError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            root_labels: vec![TRANSITION_RELATION_LABEL.to_string()],
            var_match: VarMatchMode::Names,
            options: LoadOptions::default(),
        }
    }
}

impl LoaderConfig {
    pub fn new() -> LoaderConfig {
        LoaderConfig::default()
    }

    /// Load the roots with these labels (in this order) instead of `TRANS`.
    pub fn with_root_labels(mut self, labels: &[&str]) -> LoaderConfig {
        self.root_labels = labels.iter().map(|it| it.to_string()).collect();
        self
    }

    pub fn with_var_match(mut self, var_match: VarMatchMode) -> LoaderConfig {
        self.var_match = var_match;
        self
    }

    pub fn with_options(mut self, options: LoadOptions) -> LoaderConfig {
        self.options = options;
        self
    }

    pub fn root_labels(&self) -> &[String] {
        &self.root_labels
    }

    pub fn var_match(&self) -> &VarMatchMode {
        &self.var_match
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }
}

/// Load the transition relation (the root labelled `TRANS`) stored in the DDDMP archive at
/// `path`, matching variables by name.
///
/// The returned root carries one reference owned by the caller.
pub fn load_transition_relation<N>(
    manager: &mut BddManager,
    naming: &N,
    path: impl AsRef<Path>,
) -> Result<BddRef, ImportError>
where
    N: VariableNaming + ?Sized,
{
    let roots = load_bdds(
        &DddmpReader::new(),
        manager,
        naming,
        path.as_ref(),
        &LoaderConfig::default(),
    )?;
    // One label was requested, so the reader returned exactly one root.
    Ok(roots[0])
}

/// Load the roots selected by `config` from the archive at `path` using `reader`.
///
/// When variables are matched by name, a fresh `NameTable` is built from `manager` and
/// `naming` first. On success, the roots are returned in the order of the configured labels
/// and each carries one reference owned by the caller. On failure no roots are loaded.
pub fn load_bdds<M, N, R>(
    reader: &R,
    manager: &mut M,
    naming: &N,
    path: &Path,
    config: &LoaderConfig,
) -> Result<Vec<BddRef>, ImportError>
where
    M: DiagramManager + ?Sized,
    N: VariableNaming + ?Sized,
    R: ArchiveReader<M> + ?Sized,
{
    match &config.var_match {
        VarMatchMode::Names => {
            let table = NameTable::build(&*manager, naming)?;
            load_with_table(reader, manager, table, path, config)
        }
        VarMatchMode::Ids => load_with(reader, manager, VarMatch::Ids, path, config),
        VarMatchMode::PermIds => load_with(reader, manager, VarMatch::PermIds, path, config),
        VarMatchMode::ComposeIds(map) => {
            load_with(reader, manager, VarMatch::ComposeIds(map), path, config)
        }
    }
}

/// Load the roots selected by `config`, matching variables through the given `table`.
///
/// The table is consumed: it is released when this call returns, on every path.
pub fn load_with_table<M, R>(
    reader: &R,
    manager: &mut M,
    table: NameTable,
    path: &Path,
    config: &LoaderConfig,
) -> Result<Vec<BddRef>, ImportError>
where
    M: ?Sized,
    R: ArchiveReader<M> + ?Sized,
{
    load_with(reader, manager, VarMatch::Names(&table), path, config)
}

fn load_with<M, R>(
    reader: &R,
    manager: &mut M,
    vars: VarMatch<'_>,
    path: &Path,
    config: &LoaderConfig,
) -> Result<Vec<BddRef>, ImportError>
where
    M: ?Sized,
    R: ArchiveReader<M> + ?Sized,
{
    let roots = RootMatch::Names(config.root_labels.clone());
    info!("Loading BDDs from {}...", path.display());
    match reader.load(manager, &roots, vars, &config.options, path) {
        Ok(loaded) => {
            info!(roots = loaded.len(), "Done");
            Ok(loaded)
        }
        Err(e) => {
            warn!(error = %e, "Cannot load BDDs from {}.", path.display());
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::_test_util::{
        init_logging, load_test_archive, mk_archive, mk_scenario_a_encoding,
        mk_transition_encoding, truth_table, write_archive,
    };
    use crate::{VarName, VariableEncodingBuilder};
    use rand::prelude::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::sync::Arc;

    /// A manager that only reports its size, e.g. an impossibly large one.
    struct SizeOnlyManager(usize);

    impl DiagramManager for SizeOnlyManager {
        fn variable_count(&self) -> usize {
            self.0
        }

        fn index_at_level(&self, level: usize) -> VarIndex {
            VarIndex(level as u16)
        }
    }

    /// Records every call instead of reading anything.
    #[derive(Default)]
    struct RecordingReader {
        calls: RefCell<Vec<(RootMatch, Option<NameTable>)>>,
        fail: bool,
    }

    impl<M: DiagramManager + ?Sized> ArchiveReader<M> for RecordingReader {
        fn load(
            &self,
            _manager: &mut M,
            roots: &RootMatch,
            vars: VarMatch<'_>,
            _options: &LoadOptions,
            path: &Path,
        ) -> Result<Vec<BddRef>, ArchiveError> {
            let table = match vars {
                VarMatch::Names(table) => Some(table.clone()),
                _ => None,
            };
            self.calls.borrow_mut().push((roots.clone(), table));
            if self.fail {
                Err(ArchiveError::Open {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn shared_name(naming: &impl VariableNaming, index: VarIndex) -> Arc<str> {
        naming
            .name_of(index)
            .map(|name: &VarName| name.shared_text().clone())
            .unwrap()
    }

    #[test]
    fn load_transition_relation_round_trip() {
        init_logging();
        let encoding = mk_transition_encoding();
        let x = encoding.var_by_name("x").unwrap();
        let y = encoding.var_by_name("y").unwrap();
        let file = write_archive(&load_test_archive("trans_xy.dddmp"));
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            let mut order: Vec<VarIndex> = (0..encoding.num_vars()).map(VarIndex).collect();
            order.shuffle(&mut rng);
            let mut manager = BddManager::with_order(&order).unwrap();
            // Level 0 is never named, so keep a named variable away from it.
            let level_zero = manager.index_at_level(0);
            if level_zero == x || level_zero == y {
                continue;
            }

            let root = load_transition_relation(&mut manager, &encoding, file.path()).unwrap();
            assert_eq!(Some(1), manager.ref_count(root));
            assert_eq!(1, manager.live_roots());
            assert_eq!(
                vec![false, true, true, false],
                truth_table(&manager, root, &[x, y])
            );

            let table = NameTable::build(&manager, &encoding).unwrap();
            let mut named: Vec<&str> = table.iter().flatten().collect();
            named.sort_unstable();
            assert_eq!(vec!["x", "y"], named);

            manager.dec_ref(root).unwrap();
            assert_eq!(0, manager.live_roots());
        }
    }

    #[test]
    fn load_missing_archive() {
        init_logging();
        let encoding = mk_transition_encoding();
        let x = encoding.var_by_name("x").unwrap();
        let mut manager = BddManager::new(encoding.num_vars());
        let before = Arc::strong_count(&shared_name(&encoding, x));
        let dir = tempfile::tempdir().unwrap();

        let result = load_transition_relation(&mut manager, &encoding, dir.path().join("gone"));
        assert!(matches!(
            result,
            Err(ImportError::Archive(ArchiveError::Open { .. }))
        ));
        assert_eq!(0, manager.live_roots());
        assert_eq!(before, Arc::strong_count(&shared_name(&encoding, x)));
    }

    #[test]
    fn load_archive_with_unknown_variable() {
        init_logging();
        let encoding = mk_transition_encoding();
        let mut manager = BddManager::new(encoding.num_vars());
        let archive = mk_archive(
            &["x", "q"],
            &[1, 2],
            &[1, 2],
            &[("TRANS", 3)],
            &["1 T 1 0 0", "2 1 1 -1", "3 0 2 -1"],
        );
        let file = write_archive(&archive);
        let result = load_transition_relation(&mut manager, &encoding, file.path());
        assert!(matches!(
            result,
            Err(ImportError::Archive(ArchiveError::VariableNotFound(name))) if name == "q"
        ));
        assert_eq!(0, manager.live_roots());
    }

    #[test]
    fn load_releases_name_table() {
        let encoding = mk_transition_encoding();
        let x = encoding.var_by_name("x").unwrap();
        let mut manager = BddManager::new(encoding.num_vars());
        let before = Arc::strong_count(&shared_name(&encoding, x));

        let file = write_archive(&load_test_archive("trans_xy.dddmp"));
        let root = load_transition_relation(&mut manager, &encoding, file.path()).unwrap();
        assert_eq!(before, Arc::strong_count(&shared_name(&encoding, x)));

        let broken = write_archive(".ver DDDMP-2.0\n.mode A\n");
        assert!(load_transition_relation(&mut manager, &encoding, broken.path()).is_err());
        assert_eq!(before, Arc::strong_count(&shared_name(&encoding, x)));
        assert_eq!(Some(1), manager.ref_count(root));
    }

    #[test]
    fn load_into_empty_manager() {
        init_logging();
        let encoding = VariableEncodingBuilder::new().build();
        let mut manager = BddManager::new(0);
        assert!(NameTable::build(&manager, &encoding).unwrap().is_empty());

        let constant = mk_archive(&[], &[], &[], &[("TRANS", -1)], &["1 T 1 0 0"]);
        let file = write_archive(&constant);
        let root = load_transition_relation(&mut manager, &encoding, file.path()).unwrap();
        assert_eq!(Some(true), manager.get(root).map(|it| it.is_false()));

        let file = write_archive(&load_test_archive("and_ab.dddmp"));
        let result = load_transition_relation(&mut manager, &encoding, file.path());
        assert!(matches!(
            result,
            Err(ImportError::Archive(ArchiveError::VariableNotFound(_)))
        ));
        assert_eq!(1, manager.live_roots());
    }

    #[test]
    fn load_passes_fresh_table_and_labels_to_reader() {
        let encoding = mk_scenario_a_encoding();
        let mut manager = BddManager::new(encoding.num_vars());
        let reader = RecordingReader::default();
        let path = Path::new("relation.dddmp");

        load_bdds(&reader, &mut manager, &encoding, path, &LoaderConfig::default()).unwrap();
        manager
            .set_order(&[VarIndex(0), VarIndex(2), VarIndex(1)])
            .unwrap();
        let config = LoaderConfig::new().with_root_labels(&["INIT", "TRANS"]);
        load_bdds(&reader, &mut manager, &encoding, path, &config).unwrap();

        let calls = reader.calls.borrow();
        assert_eq!(2, calls.len());
        assert_eq!(RootMatch::transition_relation(), calls[0].0);
        assert_eq!(
            Some(NameTable::from_slots(vec![None, Some("a"), None])),
            calls[0].1
        );
        assert_eq!(RootMatch::names(&["INIT", "TRANS"]), calls[1].0);
        assert_eq!(
            Some(NameTable::from_slots(vec![None, None, Some("a")])),
            calls[1].1
        );
    }

    #[test]
    fn load_reports_allocation_failure() {
        init_logging();
        let encoding = mk_scenario_a_encoding();
        let mut manager = SizeOnlyManager(usize::MAX);
        let reader = RecordingReader::default();
        let result = load_bdds(
            &reader,
            &mut manager,
            &encoding,
            Path::new("relation.dddmp"),
            &LoaderConfig::default(),
        );
        assert!(matches!(result, Err(ImportError::NameTableAllocation(_))));
        assert!(reader.calls.borrow().is_empty());
    }

    #[test]
    fn load_propagates_reader_failure() {
        let encoding = mk_scenario_a_encoding();
        let mut manager = SizeOnlyManager(3);
        let reader = RecordingReader {
            fail: true,
            ..Default::default()
        };
        let result = load_bdds(
            &reader,
            &mut manager,
            &encoding,
            Path::new("relation.dddmp"),
            &LoaderConfig::default(),
        );
        assert!(matches!(result, Err(ImportError::Archive(_))));
        assert_eq!(1, reader.calls.borrow().len());
    }

    #[test]
    fn load_without_names_skips_table() {
        let encoding = mk_transition_encoding();
        let reader = RecordingReader::default();
        let mut manager = SizeOnlyManager(usize::MAX);
        let config = LoaderConfig::new().with_var_match(VarMatchMode::PermIds);
        load_bdds(&reader, &mut manager, &encoding, Path::new("a"), &config).unwrap();
        assert_eq!(None, reader.calls.borrow()[0].1);
    }

    #[test]
    fn load_with_config_modes() {
        let encoding = mk_transition_encoding();
        let x = encoding.var_by_name("x").unwrap();
        let y = encoding.var_by_name("y").unwrap();
        let file = write_archive(&load_test_archive("trans_xy.dddmp"));
        let mut manager = BddManager::new(encoding.num_vars());
        let reader = DddmpReader::new();

        let config = LoaderConfig::new()
            .with_root_labels(&["TRANS", "INIT"])
            .with_var_match(VarMatchMode::Ids);
        assert_eq!(2, config.root_labels().len());
        let roots = load_bdds(&reader, &mut manager, &encoding, file.path(), &config).unwrap();
        assert_eq!(
            vec![false, true, true, false],
            truth_table(&manager, roots[0], &[x, y])
        );
        assert_eq!(
            vec![true, false, false, false],
            truth_table(&manager, roots[1], &[x, y])
        );

        let table = NameTable::build(&manager, &encoding).unwrap();
        let by_table = load_with_table(
            &reader,
            &mut manager,
            table,
            file.path(),
            &LoaderConfig::default(),
        )
        .unwrap();
        assert_eq!(manager.get(roots[0]), manager.get(by_table[0]));
        assert_eq!(3, manager.live_roots());
    }
}
