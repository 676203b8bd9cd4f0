use super::*;
use std::fmt::{Display, Formatter};

impl VarName {
    /// A name of an ordinary (current-state) variable.
    pub fn current(text: &str) -> VarName {
        VarName {
            text: Arc::from(text),
            kind: NameKind::Current,
        }
    }

    /// The next-state variant of the variable called `base`. It renders as `base'`.
    pub fn next(base: &str) -> VarName {
        VarName {
            text: Arc::from(format!("{}'", base)),
            kind: NameKind::Next,
        }
    }

    pub fn kind(&self) -> NameKind {
        self.kind
    }

    /// True if this is the next-state variant of another variable.
    pub fn is_next(&self) -> bool {
        self.kind == NameKind::Next
    }

    /// The textual form of this name.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// **(internal)** The shared textual form, so that name tables can reference it without
    /// copying.
    pub(crate) fn shared_text(&self) -> &Arc<str> {
        &self.text
    }
}

impl Display for VarName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_str(&self.text)
    }
}

impl VariableEncoding {
    /// Number of variables known to this encoding, including the reserved index `0`.
    ///
    /// A `BddManager` for this encoding should be created with the same number of variables.
    pub fn num_vars(&self) -> u16 {
        self.names.len() as u16
    }

    /// Find the variable with the given textual name.
    pub fn var_by_name(&self, name: &str) -> Option<VarIndex> {
        self.names
            .iter()
            .position(|it| it.as_ref().map(|n| n.text()) == Some(name))
            .map(|i| VarIndex(i as u16))
    }
}

impl VariableNaming for VariableEncoding {
    fn name_of(&self, index: VarIndex) -> Option<&VarName> {
        self.names.get(index.to_index()).and_then(|it| it.as_ref())
    }
}

impl Display for VariableEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "[")?;
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match name {
                Some(name) => write!(f, "{}", name)?,
                None => write!(f, "_")?,
            }
        }
        write!(f, "]")
    }
}
