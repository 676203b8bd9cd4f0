use super::*;
use fxhash::FxBuildHasher;
use std::cmp::min;
use std::collections::{HashMap, HashSet};

impl BddBuilder {
    /// An empty store for diagrams over `num_levels` levels.
    pub fn new(num_levels: u16) -> BddBuilder {
        BddBuilder {
            nodes: Bdd::mk_true(num_levels),
            unique: HashMap::default(),
            decisions: HashMap::default(),
        }
    }

    pub fn num_levels(&self) -> u16 {
        self.nodes.num_levels()
    }

    /// Number of stored nodes, including both terminals.
    pub fn size(&self) -> usize {
        self.nodes.size()
    }

    /// The reduced node deciding `level` between `low_link` and `high_link`.
    ///
    /// Both links must already be stored and must only depend on levels below `level`.
    pub fn mk_node(
        &mut self,
        level: BddLevel,
        low_link: BddPointer,
        high_link: BddPointer,
    ) -> BddPointer {
        if low_link == high_link {
            return low_link;
        }
        let node = BddNode::mk_node(level, low_link, high_link);
        if let Some(pointer) = self.unique.get(&node) {
            return *pointer;
        }
        self.nodes.push_node(node);
        let pointer = self.nodes.root_pointer();
        self.unique.insert(node, pointer);
        pointer
    }

    /// The function "if `level` then `high` else `low`".
    ///
    /// Unlike `mk_node`, the stored functions `high` and `low` can depend on any level,
    /// including levels above `level`. Results are memoised for the lifetime of the builder.
    pub fn mk_decision(
        &mut self,
        level: BddLevel,
        high: BddPointer,
        low: BddPointer,
    ) -> BddPointer {
        let mut stack = vec![(high, low)];
        while let Some(&(high, low)) = stack.last() {
            if self.find_decision(level, high, low).is_some() {
                stack.pop();
                continue;
            }
            let top = min(level, min(self.nodes.level_of(high), self.nodes.level_of(low)));
            let (high_0, high_1) = self.nodes.cofactors(high, top);
            let (low_0, low_1) = self.nodes.cofactors(low, top);
            let result = if top == level {
                Some(self.mk_node(level, low_0, high_1))
            } else {
                let on_0 = self.find_decision(level, high_0, low_0);
                let on_1 = self.find_decision(level, high_1, low_1);
                if on_0.is_none() {
                    stack.push((high_0, low_0));
                }
                if on_1.is_none() {
                    stack.push((high_1, low_1));
                }
                on_0.zip(on_1).map(|(on_0, on_1)| self.mk_node(top, on_0, on_1))
            };
            if let Some(result) = result {
                self.decisions.insert((level, high, low), result);
                stack.pop();
            }
        }
        self.find_decision(level, high, low)
            .unwrap_or_else(|| unreachable!("Decision is resolved once the stack is empty."))
    }

    /// Copy the diagram rooted in `root` into a standalone `Bdd`.
    pub fn extract(&self, root: BddPointer) -> Bdd {
        let num_levels = self.num_levels();
        match root.as_bool() {
            Some(true) => return Bdd::mk_true(num_levels),
            Some(false) => return Bdd::mk_false(num_levels),
            None => {}
        }
        let mut reachable = Vec::new();
        let mut seen: HashSet<BddPointer, FxBuildHasher> = HashSet::default();
        let mut stack = vec![root];
        while let Some(pointer) = stack.pop() {
            if !pointer.is_terminal() && seen.insert(pointer) {
                reachable.push(pointer);
                stack.push(self.nodes.low_link_of(pointer));
                stack.push(self.nodes.high_link_of(pointer));
            }
        }
        // Stored children always precede their parents, so the root ends up last.
        reachable.sort_unstable();
        let mut moved: HashMap<BddPointer, BddPointer, FxBuildHasher> = HashMap::default();
        moved.insert(BddPointer::zero(), BddPointer::zero());
        moved.insert(BddPointer::one(), BddPointer::one());
        let mut result = Bdd::mk_true(num_levels);
        for pointer in reachable {
            result.push_node(BddNode::mk_node(
                self.nodes.level_of(pointer),
                moved[&self.nodes.low_link_of(pointer)],
                moved[&self.nodes.high_link_of(pointer)],
            ));
            moved.insert(pointer, result.root_pointer());
        }
        result
    }

    fn find_decision(
        &self,
        level: BddLevel,
        high: BddPointer,
        low: BddPointer,
    ) -> Option<BddPointer> {
        if high == low {
            Some(high)
        } else {
            self.decisions.get(&(level, high, low)).copied()
        }
    }
}
