use crate::*;
use std::iter::Map;
use std::ops::Range;

/// Several useful (mostly internal) low-level utility methods for `Bdd`s.
impl Bdd {
    /// The number of nodes in this `Bdd`. (Do not confuse with cardinality)
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Number of levels of the `BddManager` this `Bdd` belongs to.
    pub fn num_levels(&self) -> u16 {
        // Assert: every BDD is not empty - it has at least the terminal zero node.
        self.0[0].level.0
    }

    /// If this `Bdd` is a constant, convert it to `bool`, otherwise return `None`.
    pub fn as_bool(&self) -> Option<bool> {
        if self.is_true() {
            Some(true)
        } else if self.is_false() {
            Some(false)
        } else {
            None
        }
    }

    /// True if this `Bdd` is exactly the `true` formula.
    pub fn is_true(&self) -> bool {
        self.0.len() == 2
    }

    /// True if this `Bdd` is exactly the `false` formula.
    pub fn is_false(&self) -> bool {
        self.0.len() == 1
    }

    /// Evaluate this `Bdd`, reading the value of each decision level from `valuation`.
    pub fn eval_in<F>(&self, valuation: F) -> bool
    where
        F: Fn(BddLevel) -> bool,
    {
        let mut node = self.root_pointer();
        while !node.is_terminal() {
            node = if valuation(self.level_of(node)) {
                self.high_link_of(node)
            } else {
                self.low_link_of(node)
            }
        }
        node.is_one()
    }

    /// Pointer to the root of the decision diagram.
    pub fn root_pointer(&self) -> BddPointer {
        BddPointer::from_index(self.0.len() - 1)
    }

    /// Get the low link of the node at a specified location.
    pub fn low_link_of(&self, node: BddPointer) -> BddPointer {
        self.0[node.to_index()].low_link
    }

    /// Get the high link of the node at a specified location.
    pub fn high_link_of(&self, node: BddPointer) -> BddPointer {
        self.0[node.to_index()].high_link
    }

    /// Get the decision level of the node at a specified location.
    ///
    /// Note that this also technically works for terminals, but the returned `BddLevel` is
    /// not valid in this `Bdd`.
    pub fn level_of(&self, node: BddPointer) -> BddLevel {
        self.0[node.to_index()].level
    }

    /// **(internal)** The low and high successor of `node` when deciding `level`. A node on
    /// any other level does not depend on `level`, so it is its own successor.
    pub(crate) fn cofactors(&self, node: BddPointer, level: BddLevel) -> (BddPointer, BddPointer) {
        if self.level_of(node) == level {
            (self.low_link_of(node), self.high_link_of(node))
        } else {
            (node, node)
        }
    }

    /// **(internal)** Create a new `Bdd` for the `false` formula.
    pub(crate) fn mk_false(num_levels: u16) -> Bdd {
        Bdd(vec![BddNode::mk_zero(num_levels)])
    }

    /// **(internal)** Create a new `Bdd` for the `true` formula.
    pub(crate) fn mk_true(num_levels: u16) -> Bdd {
        Bdd(vec![BddNode::mk_zero(num_levels), BddNode::mk_one(num_levels)])
    }

    /// **(internal)** Create a new `Bdd` which is `true` exactly when `level` is `true`.
    pub(crate) fn mk_var(num_levels: u16, level: BddLevel) -> Bdd {
        let mut bdd = Self::mk_true(num_levels);
        bdd.push_node(BddNode::mk_node(level, BddPointer::zero(), BddPointer::one()));
        bdd
    }

    /// **(internal)** Add a new node to the end of this `Bdd`, making it the new root.
    pub(crate) fn push_node(&mut self, node: BddNode) {
        self.0.push(node);
    }

    /// **(internal)** Create an iterator over all pointers of the `Bdd` (including terminals!).
    ///
    /// The iteration order is the same as the underlying representation, so you can expect
    /// terminals to be the first two nodes.
    pub(crate) fn pointers(&self) -> Map<Range<usize>, fn(usize) -> BddPointer> {
        (0..self.size()).map(BddPointer::from_index)
    }

    /// Check that this `Bdd` is structurally sound: children precede their parents, every
    /// decision level is valid, and levels strictly increase from parents to children.
    pub fn validate(&self) -> Result<(), String> {
        let num_levels = self.num_levels();
        if self.size() > 2 && self.0[1] != BddNode::mk_one(num_levels) {
            return Err("Second node is not the `one` terminal.".to_string());
        }
        for pointer in self.pointers().skip(2) {
            let level = self.level_of(pointer);
            if level.0 >= num_levels {
                return Err(format!("Node {} uses invalid level {}.", pointer, level));
            }
            for child in [self.low_link_of(pointer), self.high_link_of(pointer)] {
                if child >= pointer {
                    return Err(format!("Node {} points forward to {}.", pointer, child));
                }
                if self.level_of(child) <= level {
                    return Err(format!(
                        "Node {} at level {} has child {} at level {}.",
                        pointer,
                        level,
                        child,
                        self.level_of(child)
                    ));
                }
            }
            if self.low_link_of(pointer) == self.high_link_of(pointer) {
                return Err(format!("Node {} is redundant.", pointer));
            }
        }
        Ok(())
    }
}
