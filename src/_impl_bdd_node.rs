use super::*;
use std::fmt::{Display, Error, Formatter};

impl BddNode {
    /// The `false` terminal of a diagram over `num_levels` levels.
    pub fn mk_zero(num_levels: u16) -> BddNode {
        BddNode {
            level: BddLevel(num_levels),
            low_link: BddPointer::zero(),
            high_link: BddPointer::zero(),
        }
    }

    /// The `true` terminal of a diagram over `num_levels` levels.
    pub fn mk_one(num_levels: u16) -> BddNode {
        BddNode {
            level: BddLevel(num_levels),
            low_link: BddPointer::one(),
            high_link: BddPointer::one(),
        }
    }

    /// A decision node on `level`. Both links must point into the `Bdd` which will receive
    /// the node, and they must refer to nodes below `level`.
    pub fn mk_node(level: BddLevel, low_link: BddPointer, high_link: BddPointer) -> BddNode {
        BddNode {
            level,
            low_link,
            high_link,
        }
    }
}

impl Display for BddPointer {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "@{}", self.0)
    }
}

impl BddPointer {
    pub fn zero() -> BddPointer {
        BddPointer(0)
    }

    pub fn one() -> BddPointer {
        BddPointer(1)
    }

    pub fn is_one(&self) -> bool {
        self.0 == 1
    }

    pub fn is_terminal(&self) -> bool {
        self.0 < 2
    }

    pub fn to_index(&self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> BddPointer {
        BddPointer(index as u32)
    }

    pub fn from_bool(value: bool) -> BddPointer {
        if value {
            BddPointer::one()
        } else {
            BddPointer::zero()
        }
    }

    /// The value of a terminal pointer, `None` for decision nodes.
    pub fn as_bool(&self) -> Option<bool> {
        match self.0 {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    /// Swap `0` and `1`. Decision node pointers stay unchanged.
    pub fn flip_if_terminal(&mut self) {
        if let Some(value) = self.as_bool() {
            *self = BddPointer::from_bool(!value);
        }
    }
}
