use super::*;

impl VariableOrder {
    /// Create the identity order with `num_vars` variables, i.e. variable `i` sits at level `i`.
    pub fn identity(num_vars: u16) -> VariableOrder {
        VariableOrder {
            index_to_level: (0..num_vars).collect(),
            level_to_index: (0..num_vars).collect(),
        }
    }

    /// Create a new order from a list of variable indices: the variable that occurs first in
    /// `order` is placed at level `0`, and so on.
    ///
    /// Fails when `order` is not a permutation of `0..order.len()`.
    pub fn new(order: &[VarIndex]) -> Result<VariableOrder, ManagerError> {
        if order.len() > u16::MAX as usize {
            return Err(ManagerError::InvalidOrder(format!(
                "There can be at most {} variables, got {}.",
                u16::MAX,
                order.len()
            )));
        }
        let mut index_to_level = vec![None; order.len()];
        for (level, index) in order.iter().enumerate() {
            match index_to_level.get_mut(index.to_index()) {
                None => {
                    return Err(ManagerError::InvalidOrder(format!(
                        "Variable {} out of range for {} variables.",
                        index,
                        order.len()
                    )))
                }
                Some(Some(_)) => {
                    return Err(ManagerError::InvalidOrder(format!(
                        "Variable {} appears more than once.",
                        index
                    )))
                }
                Some(slot) => *slot = Some(level as u16),
            }
        }
        Ok(VariableOrder {
            // Every slot is filled: `order` has exactly `len` distinct in-range indices.
            index_to_level: index_to_level.into_iter().flatten().collect(),
            level_to_index: order.iter().map(|it| it.0).collect(),
        })
    }

    /// Gives the number of variables in the order.
    pub fn num_vars(&self) -> u16 {
        self.level_to_index.len() as u16
    }

    /// Get the level of variable `index`.
    ///
    /// *Panics:* `index` must be a valid variable of this order.
    pub fn level_of(&self, index: VarIndex) -> BddLevel {
        BddLevel(self.index_to_level[index.to_index()])
    }

    /// Fetch the variable that is placed at the given `level`.
    ///
    /// *Panics:* `level` must be a valid level of this order.
    pub fn index_at(&self, level: BddLevel) -> VarIndex {
        VarIndex(self.level_to_index[level.to_index()])
    }

    /// The variable indices ordered by their level.
    pub fn as_indices(&self) -> Vec<VarIndex> {
        self.level_to_index.iter().cloned().map(VarIndex).collect()
    }

    /// **(internal)** Check that the two arrays are mutually inverse.
    pub(crate) fn is_consistent(&self) -> bool {
        self.index_to_level.len() == self.level_to_index.len()
            && self
                .level_to_index
                .iter()
                .enumerate()
                .all(|(level, index)| {
                    self.index_to_level.get(*index as usize) == Some(&(level as u16))
                })
    }
}
