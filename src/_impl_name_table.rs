use super::*;
use crate::import::ImportError;
use fxhash::FxBuildHasher;
use std::collections::HashMap;
use tracing::{error, trace};

impl NameTable {
    /// Build the name table for the current variable ordering of `manager`.
    ///
    /// The table has exactly `manager.variable_count()` slots. Slot `0` is always empty.
    /// Every other slot `i` holds the name of the variable at level `i`, unless that variable
    /// has no name or it is a next-state variable. Next-state variables are excluded so that
    /// the archive never binds a stored variable to the wrong copy of a state variable.
    pub fn build<M, N>(manager: &M, naming: &N) -> Result<NameTable, ImportError>
    where
        M: DiagramManager + ?Sized,
        N: VariableNaming + ?Sized,
    {
        let level_count = manager.variable_count();
        let mut slots: Vec<Option<Arc<str>>> = Vec::new();
        if let Err(e) = slots.try_reserve_exact(level_count) {
            error!(level_count, "Cannot allocate memory for variable names.");
            return Err(ImportError::NameTableAllocation(e));
        }
        if level_count > 0 {
            // Level 0 is reserved and never matched against.
            slots.push(None);
        }
        for level in 1..level_count {
            let index = manager.index_at_level(level);
            let name = naming
                .name_of(index)
                .filter(|name| !name.is_next())
                .map(|name| name.shared_text().clone());
            slots.push(name);
        }
        let table = NameTable(slots);
        trace!(
            levels = table.len(),
            named = table.named_levels(),
            "Built variable name table."
        );
        Ok(table)
    }

    /// Create a table directly from a list of slots (one per level).
    pub fn from_slots(slots: Vec<Option<&str>>) -> NameTable {
        NameTable(slots.into_iter().map(|it| it.map(Arc::from)).collect())
    }

    /// Number of slots (equal to the level count of the manager at build time).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The name in the slot of `level`, or `None` if the slot is empty or out of range.
    pub fn get(&self, level: usize) -> Option<&str> {
        self.0.get(level).and_then(|it| it.as_deref())
    }

    /// Iterate over all slots in level order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.0.iter().map(|it| it.as_deref())
    }

    /// The first level whose slot holds `name`.
    pub fn level_of(&self, name: &str) -> Option<BddLevel> {
        self.0
            .iter()
            .position(|it| it.as_deref() == Some(name))
            .map(BddLevel::from_index)
    }

    /// Index of all names, each mapped to the first level whose slot holds it.
    pub fn levels_by_name(&self) -> HashMap<&str, BddLevel, FxBuildHasher> {
        let mut levels: HashMap<&str, BddLevel, FxBuildHasher> =
            HashMap::with_capacity_and_hasher(self.named_levels(), FxBuildHasher::default());
        for (level, name) in self.iter().enumerate() {
            if let Some(name) = name {
                levels.entry(name).or_insert(BddLevel::from_index(level));
            }
        }
        levels
    }

    /// Number of non-empty slots.
    pub fn named_levels(&self) -> usize {
        self.0.iter().filter(|it| it.is_some()).count()
    }
}
