use super::*;
use tracing::{debug, trace};

impl BddManager {
    /// Create a manager with `num_vars` variables in the identity order.
    pub fn new(num_vars: u16) -> BddManager {
        BddManager {
            order: VariableOrder::identity(num_vars),
            roots: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    /// Create a manager whose initial ordering is given by `order` (see `VariableOrder::new`).
    pub fn with_order(order: &[VarIndex]) -> Result<BddManager, ManagerError> {
        Ok(BddManager {
            order: VariableOrder::new(order)?,
            roots: Vec::new(),
            free_slots: Vec::new(),
        })
    }

    /// Number of variables (and levels) of this manager.
    pub fn num_vars(&self) -> u16 {
        self.order.num_vars()
    }

    /// The current variable ordering.
    pub fn order(&self) -> &VariableOrder {
        &self.order
    }

    /// The current level of variable `index`.
    ///
    /// *Panics:* `index` must be a valid variable of this manager.
    pub fn level_of_index(&self, index: VarIndex) -> BddLevel {
        self.order.level_of(index)
    }

    /// Create a `Bdd` corresponding to the `true` formula.
    pub fn mk_true(&self) -> Bdd {
        Bdd::mk_true(self.num_vars())
    }

    /// Create a `Bdd` corresponding to the `false` formula.
    pub fn mk_false(&self) -> Bdd {
        Bdd::mk_false(self.num_vars())
    }

    /// Create a `Bdd` corresponding to the $v$ formula where `v` is a variable of this manager.
    ///
    /// *Panics:* `index` must be a valid variable of this manager.
    pub fn mk_var(&self, index: VarIndex) -> Bdd {
        Bdd::mk_var(self.num_vars(), self.order.level_of(index))
    }

    /// Create a `Bdd` corresponding to the $\neg v$ formula where `v` is a variable of this
    /// manager.
    ///
    /// *Panics:* `index` must be a valid variable of this manager.
    pub fn mk_not_var(&self, index: VarIndex) -> Bdd {
        self.mk_var(index).not()
    }

    /// Register `bdd` as a new root of this manager. The returned handle carries one reference.
    ///
    /// *Panics:* `bdd` must be created for the current level count of this manager.
    pub fn register(&mut self, bdd: Bdd) -> BddRef {
        assert_eq!(
            self.num_vars(),
            bdd.num_levels(),
            "Cannot register a BDD with an incompatible level count."
        );
        let slot = RootSlot { bdd, ref_count: 1 };
        let root = if let Some(free) = self.free_slots.pop() {
            self.roots[free as usize] = Some(slot);
            BddRef(free)
        } else {
            self.roots.push(Some(slot));
            BddRef((self.roots.len() - 1) as u32)
        };
        trace!(%root, "Registered root.");
        root
    }

    /// Add one reference to a live root.
    pub fn inc_ref(&mut self, root: BddRef) -> Result<(), ManagerError> {
        let slot = self.slot_mut(root)?;
        slot.ref_count += 1;
        Ok(())
    }

    /// Drop one reference of a live root. The root is released once no references remain,
    /// after which the handle is no longer valid.
    pub fn dec_ref(&mut self, root: BddRef) -> Result<(), ManagerError> {
        let slot = self.slot_mut(root)?;
        slot.ref_count -= 1;
        if slot.ref_count == 0 {
            self.roots[root.0 as usize] = None;
            self.free_slots.push(root.0);
            trace!(%root, "Released root.");
        }
        Ok(())
    }

    /// Number of references held on `root`, or `None` if the handle is not live.
    pub fn ref_count(&self, root: BddRef) -> Option<usize> {
        self.slot(root).map(|slot| slot.ref_count)
    }

    /// The `Bdd` of a live root.
    pub fn get(&self, root: BddRef) -> Option<&Bdd> {
        self.slot(root).map(|slot| &slot.bdd)
    }

    /// Number of live roots in this manager.
    pub fn live_roots(&self) -> usize {
        self.roots.iter().filter(|it| it.is_some()).count()
    }

    /// Evaluate a live root, reading the value of each variable (by index) from `valuation`.
    pub fn eval<F>(&self, root: BddRef, valuation: F) -> Option<bool>
    where
        F: Fn(VarIndex) -> bool,
    {
        let bdd = self.get(root)?;
        Some(bdd.eval_in(|level| valuation(self.order.index_at(level))))
    }

    /// Change the variable ordering of this manager.
    ///
    /// Every live root is rebuilt so that it keeps representing the same function of the
    /// variable indices. Handles and reference counts are unaffected.
    pub fn set_order(&mut self, order: &[VarIndex]) -> Result<(), ManagerError> {
        if order.len() != self.num_vars() as usize {
            return Err(ManagerError::InvalidOrder(format!(
                "Expected {} variables, got {}.",
                self.num_vars(),
                order.len()
            )));
        }
        let new_order = VariableOrder::new(order)?;
        if cfg!(feature = "shields_up") && !new_order.is_consistent() {
            panic!("Inconsistent variable order {:?}.", new_order);
        }
        let old_order = std::mem::replace(&mut self.order, new_order);
        let rebuilt = self.live_roots();
        // All roots share one builder, so common sub-diagrams are translated only once.
        let mut builder = BddBuilder::new(self.num_vars());
        for slot in self.roots.iter_mut().flatten() {
            slot.bdd = rebuild_in_order(&mut builder, &slot.bdd, &old_order, &self.order);
        }
        debug!(
            roots = rebuilt,
            nodes = builder.size(),
            "Variable order changed."
        );
        Ok(())
    }

    fn slot(&self, root: BddRef) -> Option<&RootSlot> {
        self.roots.get(root.0 as usize).and_then(|it| it.as_ref())
    }

    fn slot_mut(&mut self, root: BddRef) -> Result<&mut RootSlot, ManagerError> {
        self.roots
            .get_mut(root.0 as usize)
            .and_then(|it| it.as_mut())
            .ok_or(ManagerError::UnknownRef(root))
    }
}

impl DiagramManager for BddManager {
    fn variable_count(&self) -> usize {
        self.num_vars() as usize
    }

    fn index_at_level(&self, level: usize) -> VarIndex {
        self.order.index_at(BddLevel::from_index(level))
    }
}

/// **(internal)** Translate `bdd` from the levels of `old_order` into the levels of
/// `new_order`. Nodes are visited bottom-up and each one becomes a decision on the new level
/// of its variable.
fn rebuild_in_order(
    builder: &mut BddBuilder,
    bdd: &Bdd,
    old_order: &VariableOrder,
    new_order: &VariableOrder,
) -> Bdd {
    if let Some(value) = bdd.as_bool() {
        return builder.extract(BddPointer::from_bool(value));
    }
    let mut rebuilt: Vec<BddPointer> = Vec::with_capacity(bdd.size());
    rebuilt.push(BddPointer::zero());
    rebuilt.push(BddPointer::one());
    for pointer in bdd.pointers().skip(2) {
        let index = old_order.index_at(bdd.level_of(pointer));
        let node = builder.mk_decision(
            new_order.level_of(index),
            rebuilt[bdd.high_link_of(pointer).to_index()],
            rebuilt[bdd.low_link_of(pointer).to_index()],
        );
        rebuilt.push(node);
    }
    let result = builder.extract(rebuilt[bdd.root_pointer().to_index()]);
    if cfg!(feature = "shields_up") {
        if let Err(e) = result.validate() {
            panic!("Reordering produced an invalid BDD: {}", e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_basic_ref_counting() {
        let mut manager = BddManager::new(3);
        let root = manager.register(manager.mk_var(VarIndex(1)));
        assert_eq!(Some(1), manager.ref_count(root));
        assert_eq!(1, manager.live_roots());
        manager.inc_ref(root).unwrap();
        assert_eq!(Some(2), manager.ref_count(root));
        manager.dec_ref(root).unwrap();
        manager.dec_ref(root).unwrap();
        assert_eq!(None, manager.ref_count(root));
        assert_eq!(0, manager.live_roots());
        assert_eq!(Err(ManagerError::UnknownRef(root)), manager.dec_ref(root));
        assert_eq!(Err(ManagerError::UnknownRef(root)), manager.inc_ref(root));
    }

    #[test]
    fn manager_reuses_free_slots() {
        let mut manager = BddManager::new(2);
        let first = manager.register(manager.mk_true());
        manager.dec_ref(first).unwrap();
        let second = manager.register(manager.mk_false());
        assert_eq!(first, second);
        assert_eq!(Some(true), manager.get(second).map(|it| it.is_false()));
    }

    #[test]
    fn manager_diagram_interface() {
        let manager =
            BddManager::with_order(&[VarIndex(0), VarIndex(2), VarIndex(1)]).unwrap();
        assert_eq!(3, manager.variable_count());
        assert_eq!(VarIndex(2), manager.index_at_level(1));
        assert_eq!(BddLevel(2), manager.level_of_index(VarIndex(1)));
    }

    #[test]
    fn manager_reorder_preserves_function() {
        let mut manager = BddManager::new(4);
        let v: Vec<Bdd> = (0..4).map(|i| manager.mk_var(VarIndex(i))).collect();
        // (v0 & !v3) | (v1 & !v2) | (!v1 & v2)
        let f = v[0]
            .and(&manager.mk_not_var(VarIndex(3)))
            .or(&v[1].and(&v[2].not()))
            .or(&v[1].not().and(&v[2]));
        let root = manager.register(f);
        let shared = manager.register(v[1].and(&v[2].not()));
        let constant = manager.register(manager.mk_false());
        let table = |manager: &BddManager, root: BddRef| -> Vec<Option<bool>> {
            (0..16u16)
                .map(|bits| manager.eval(root, |v| (bits >> v.0) & 1 == 1))
                .collect()
        };
        let expected = table(&manager, root);
        let expected_shared = table(&manager, shared);

        manager
            .set_order(&[VarIndex(3), VarIndex(1), VarIndex(0), VarIndex(2)])
            .unwrap();
        assert_eq!(BddLevel(0), manager.level_of_index(VarIndex(3)));
        let bdd = manager.get(root).unwrap();
        assert!(bdd.validate().is_ok());
        assert_eq!(
            BddLevel(0),
            bdd.level_of(bdd.root_pointer()),
            "Variable 3 is now the top level."
        );
        assert_eq!(expected, table(&manager, root));
        assert_eq!(expected_shared, table(&manager, shared));
        assert!(manager.get(shared).unwrap().validate().is_ok());
        assert_eq!(Some(true), manager.get(constant).map(|it| it.is_false()));
        assert_eq!(3, manager.live_roots());
    }

    #[test]
    fn manager_reorder_long_chain() {
        // A conjunction of all variables, moved to the reversed order and back.
        let n = 300;
        let mut manager = BddManager::new(n);
        let chain = (0..n).fold(manager.mk_true(), |acc, i| acc.and(&manager.mk_var(VarIndex(i))));
        let root = manager.register(chain);
        let reversed: Vec<VarIndex> = (0..n).rev().map(VarIndex).collect();
        manager.set_order(&reversed).unwrap();
        let bdd = manager.get(root).unwrap();
        assert_eq!(n as usize + 2, bdd.size());
        assert!(bdd.validate().is_ok());
        assert_eq!(Some(true), manager.eval(root, |_| true));
        assert_eq!(Some(false), manager.eval(root, |v| v != VarIndex(7)));

        let identity: Vec<VarIndex> = (0..n).map(VarIndex).collect();
        manager.set_order(&identity).unwrap();
        assert_eq!(
            Some(&(0..n).fold(manager.mk_true(), |acc, i| acc.and(&manager.mk_var(VarIndex(i))))),
            manager.get(root)
        );
    }

    #[test]
    fn manager_reorder_rejects_invalid_order() {
        let mut manager = BddManager::new(3);
        assert!(manager.set_order(&[VarIndex(0), VarIndex(1)]).is_err());
        assert!(manager
            .set_order(&[VarIndex(0), VarIndex(1), VarIndex(1)])
            .is_err());
        assert_eq!(VariableOrder::identity(3), *manager.order());
    }

    #[test]
    #[should_panic]
    fn manager_register_incompatible() {
        let mut manager = BddManager::new(3);
        manager.register(Bdd::mk_true(4));
    }
}
