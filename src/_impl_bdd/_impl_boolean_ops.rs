use crate::*;
use fxhash::FxBuildHasher;
use std::cmp::min;
use std::collections::HashMap;

/// Basic boolean logical operations for `Bdd`s: $\neg, \land, \lor$.
impl Bdd {
    /// Create a `Bdd` corresponding to the $\neg \phi$ formula, where $\phi$ is this `Bdd`.
    pub fn not(&self) -> Bdd {
        if self.is_true() {
            Bdd::mk_false(self.num_levels())
        } else if self.is_false() {
            Bdd::mk_true(self.num_levels())
        } else {
            // Only terminals are flipped, so the node order stays valid.
            let mut result_vector = self.0.clone();
            for node in result_vector.iter_mut().skip(2) {
                node.high_link.flip_if_terminal();
                node.low_link.flip_if_terminal();
            }
            Bdd(result_vector)
        }
    }

    /// Create a `Bdd` corresponding to the $\phi \land \psi$ formula, where $\phi$ and $\psi$
    /// are the two given `Bdd`s.
    pub fn and(&self, right: &Bdd) -> Bdd {
        apply(self, right, |l, r| match (l, r) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        })
    }

    /// Create a `Bdd` corresponding to the $\phi \lor \psi$ formula, where $\phi$ and $\psi$
    /// are the two given `Bdd`s.
    pub fn or(&self, right: &Bdd) -> Bdd {
        apply(self, right, |l, r| match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        })
    }
}

/// **(internal)** Combine two `Bdd`s over the same levels node by node.
///
/// `terminal_lookup` receives the values of the two current nodes (`None` for a decision
/// node) and returns the result if it is already determined, e.g. `false` for `and` as soon
/// as one side is `false`. Pairs of nodes are explored from the roots down, always splitting
/// on the smaller of their two levels, and every resolved pair is memoised.
fn apply<T>(left: &Bdd, right: &Bdd, terminal_lookup: T) -> Bdd
where
    T: Fn(Option<bool>, Option<bool>) -> Option<bool>,
{
    let num_levels = left.num_levels();
    if right.num_levels() != num_levels {
        panic!(
            "Level count mismatch: BDDs are not compatible. {} != {}",
            num_levels,
            right.num_levels()
        );
    }
    let mut builder = BddBuilder::new(num_levels);
    type Finished = HashMap<(BddPointer, BddPointer), BddPointer, FxBuildHasher>;
    let mut finished: Finished = HashMap::default();
    let resolve = |finished: &Finished, (l, r): (BddPointer, BddPointer)| {
        terminal_lookup(l.as_bool(), r.as_bool())
            .map(BddPointer::from_bool)
            .or_else(|| finished.get(&(l, r)).copied())
    };

    let root = (left.root_pointer(), right.root_pointer());
    let mut stack = vec![root];
    while let Some(&(l, r)) = stack.last() {
        if resolve(&finished, (l, r)).is_some() {
            stack.pop();
            continue;
        }
        let level = min(left.level_of(l), right.level_of(r));
        let (l_low, l_high) = left.cofactors(l, level);
        let (r_low, r_high) = right.cofactors(r, level);
        let new_low = resolve(&finished, (l_low, r_low));
        let new_high = resolve(&finished, (l_high, r_high));
        if let (Some(new_low), Some(new_high)) = (new_low, new_high) {
            finished.insert((l, r), builder.mk_node(level, new_low, new_high));
            stack.pop();
        } else {
            if new_low.is_none() {
                stack.push((l_low, r_low));
            }
            if new_high.is_none() {
                stack.push((l_high, r_high));
            }
        }
    }

    let result = resolve(&finished, root)
        .unwrap_or_else(|| unreachable!("Root task is resolved once the stack is empty."));
    builder.extract(result)
}
