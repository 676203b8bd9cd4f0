use super::*;
use std::fmt::{Display, Error, Formatter};

impl Display for BddLevel {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        f.write_fmt(format_args!("{}", self.0))
    }
}

impl BddLevel {
    /// Cast this level to a standard usize index.
    pub fn to_index(&self) -> usize {
        self.0 as usize
    }

    /// Create a level from an usize index.
    ///
    /// *Panics:* There can be at most `u16::MAX` levels.
    pub fn from_index(index: usize) -> BddLevel {
        debug_assert!(index <= u16::MAX as usize, "Level {} out of range.", index);
        BddLevel(index as u16)
    }
}

impl Display for VarIndex {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        f.write_fmt(format_args!("v{}", self.0))
    }
}

impl VarIndex {
    /// Cast this index to a standard usize index.
    pub fn to_index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for BddRef {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        f.write_fmt(format_args!("#{}", self.0))
    }
}
