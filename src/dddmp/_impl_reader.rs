use super::*;
use crate::{Bdd, BddBuilder, BddLevel, BddManager, BddPointer};
use fxhash::FxBuildHasher;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, trace};

impl DddmpReader {
    pub fn new() -> DddmpReader {
        DddmpReader
    }

    /// Read an archive from `input` and load the selected roots into `manager`.
    ///
    /// Same as `ArchiveReader::load`, but the archive does not have to be a file.
    pub fn read_from(
        &self,
        manager: &mut BddManager,
        roots: &RootMatch,
        vars: VarMatch<'_>,
        input: &mut dyn Read,
    ) -> Result<Vec<BddRef>, ArchiveError> {
        let archive = DddmpArchive::read(input)?;
        self.load_archive(manager, &archive, roots, vars)
    }

    /// Load the selected roots of an already parsed `archive` into `manager`.
    pub fn load_archive(
        &self,
        manager: &mut BddManager,
        archive: &DddmpArchive,
        roots: &RootMatch,
        vars: VarMatch<'_>,
    ) -> Result<Vec<BddRef>, ArchiveError> {
        let selected = select_roots(archive, roots)?;
        let levels = bind_variables(archive, manager, vars)?;
        let bdds = rebuild_roots(archive, manager.num_vars(), &levels, &selected);
        if cfg!(feature = "shields_up") {
            for bdd in &bdds {
                if let Err(e) = bdd.validate() {
                    panic!("Archive produced an invalid BDD: {}", e);
                }
            }
        }
        // Nothing below can fail, so either every selected root is registered, or none.
        let refs: Vec<BddRef> = bdds.into_iter().map(|bdd| manager.register(bdd)).collect();
        debug!(roots = refs.len(), "Loaded archived roots.");
        Ok(refs)
    }
}

impl ArchiveReader<BddManager> for DddmpReader {
    fn load(
        &self,
        manager: &mut BddManager,
        roots: &RootMatch,
        vars: VarMatch<'_>,
        options: &LoadOptions,
        path: &Path,
    ) -> Result<Vec<BddRef>, ArchiveError> {
        let mut data = std::fs::read(path).map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(decode) = options.decode {
            data = decode(data)?;
        }
        self.read_from(manager, roots, vars, &mut &data[..])
    }
}

/// **(internal)** Resolve the root ids selected by `roots`, in the requested order.
fn select_roots(archive: &DddmpArchive, roots: &RootMatch) -> Result<Vec<i64>, ArchiveError> {
    match roots {
        RootMatch::All => Ok(archive.root_ids.clone()),
        RootMatch::Names(labels) => {
            let names = archive
                .root_names
                .as_ref()
                .ok_or(ArchiveError::MissingHeader("rootnames"))?;
            labels
                .iter()
                .map(|label| {
                    names
                        .iter()
                        .position(|name| name == label)
                        .map(|i| archive.root_ids[i])
                        .ok_or_else(|| ArchiveError::RootNotFound(label.clone()))
                })
                .collect()
        }
    }
}

/// **(internal)** Compute the current manager level of every support variable of `archive`.
fn bind_variables(
    archive: &DddmpArchive,
    manager: &BddManager,
    vars: VarMatch<'_>,
) -> Result<Vec<BddLevel>, ArchiveError> {
    let num_vars = manager.num_vars() as usize;
    let out_of_range = |variable: String| ArchiveError::VariableOutOfRange { variable, num_vars };
    let level_of_index = |index: usize| {
        if index < num_vars {
            Some(manager.level_of_index(VarIndex(index as u16)))
        } else {
            None
        }
    };

    let by_name = match vars {
        VarMatch::Names(table) if !archive.support_ids.is_empty() => {
            let names = archive
                .support_names
                .as_ref()
                .ok_or(ArchiveError::MissingHeader("suppvarnames"))?;
            Some((names, table.levels_by_name()))
        }
        _ => None,
    };

    let mut levels = Vec::with_capacity(archive.support_ids.len());
    for (position, stored_id) in archive.support_ids.iter().enumerate() {
        let stored_id = *stored_id as usize;
        let level = match vars {
            VarMatch::Names(_) => {
                let (names, table) = by_name
                    .as_ref()
                    .unwrap_or_else(|| unreachable!("Support names are indexed."));
                let name = &names[position];
                let level = table
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| ArchiveError::VariableNotFound(name.clone()))?;
                if level.to_index() >= num_vars {
                    return Err(out_of_range(name.clone()));
                }
                level
            }
            VarMatch::Ids => level_of_index(stored_id)
                .ok_or_else(|| out_of_range(describe_variable(archive, position)))?,
            VarMatch::PermIds => {
                let stored_level = archive.support_perm_ids[position] as usize;
                if stored_level >= num_vars {
                    return Err(out_of_range(describe_variable(archive, position)));
                }
                BddLevel::from_index(stored_level)
            }
            VarMatch::ComposeIds(map) => map
                .get(stored_id)
                .and_then(|index| level_of_index(index.to_index()))
                .ok_or_else(|| out_of_range(describe_variable(archive, position)))?,
        };
        trace!(position, %level, "Bound archive variable.");
        levels.push(level);
    }
    Ok(levels)
}

/// **(internal)** Rebuild the selected roots bottom-up over the current manager levels.
///
/// Only nodes reachable from the selected roots are rebuilt. A stored node can be reached
/// both directly and through complemented edges, so each `(node id, complemented)` edge is
/// translated once, as a decision on the level bound to its variable. The stored ordering
/// does not have to agree with the live one.
fn rebuild_roots(
    archive: &DddmpArchive,
    num_levels: u16,
    levels: &[BddLevel],
    roots: &[i64],
) -> Vec<Bdd> {
    let edge = |id: i64| (id.unsigned_abs() as usize, id < 0);
    let mut builder = BddBuilder::new(num_levels);
    let mut built: HashMap<(usize, bool), BddPointer, FxBuildHasher> = HashMap::default();
    let mut stack: Vec<(usize, bool)> = roots.iter().map(|id| edge(*id)).collect();
    while let Some(&(id, complemented)) = stack.last() {
        if built.contains_key(&(id, complemented)) {
            stack.pop();
            continue;
        }
        let result = match archive.nodes[id - 1] {
            DddmpNode::One => Some(BddPointer::from_bool(!complemented)),
            DddmpNode::Decision {
                support,
                then_id,
                else_id,
            } => {
                // A complemented node is the same decision over complemented children.
                let (else_id, else_complemented) = edge(else_id);
                let then_edge = (then_id, complemented);
                let else_edge = (else_id, else_complemented != complemented);
                let high = built.get(&then_edge).copied();
                let low = built.get(&else_edge).copied();
                if high.is_none() {
                    stack.push(then_edge);
                }
                if low.is_none() {
                    stack.push(else_edge);
                }
                high.zip(low)
                    .map(|(high, low)| builder.mk_decision(levels[support], high, low))
            }
        };
        if let Some(result) = result {
            built.insert((id, complemented), result);
            stack.pop();
        }
    }
    trace!(
        edges = built.len(),
        nodes = builder.size(),
        "Rebuilt archived nodes."
    );
    roots
        .iter()
        .map(|id| builder.extract(built[&edge(*id)]))
        .collect()
}

fn describe_variable(archive: &DddmpArchive, position: usize) -> String {
    match &archive.support_names {
        Some(names) => names[position].clone(),
        None => format!("#{}", archive.support_ids[position]),
    }
}
