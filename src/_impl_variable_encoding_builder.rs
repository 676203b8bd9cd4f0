use super::*;

impl VariableEncodingBuilder {
    /// Create a new builder with only the reserved, unnamed variable `0`.
    pub fn new() -> VariableEncodingBuilder {
        VariableEncodingBuilder {
            names: vec![None],
            used_names: HashSet::new(),
        }
    }

    /// Create a new current-state variable with the given `name`.
    ///
    /// *Panics*:
    ///  - Each variable name has to be unique.
    ///  - Currently, there can be at most 65535 variables.
    ///  - The name must not be empty or contain whitespace or `'`.
    pub fn make_variable(&mut self, name: &str) -> VarIndex {
        if name.is_empty() || name.chars().any(|c| NOT_IN_VAR_NAME.contains(&c)) {
            panic!(
                "Variable name `{}` is invalid. Cannot use {:?}",
                name, NOT_IN_VAR_NAME
            );
        }
        self.push_name(Some(VarName::current(name)))
    }

    /// Create the next-state variant of the existing current-state variable `of`.
    ///
    /// *Panics:* `of` must be a named current-state variable of this builder, and its
    /// next-state variant must not exist yet.
    pub fn make_next_variable(&mut self, of: VarIndex) -> VarIndex {
        let base = match self.names.get(of.to_index()) {
            Some(Some(name)) if !name.is_next() => name.text().to_string(),
            _ => panic!("Variable {} is not a named current-state variable.", of),
        };
        self.push_name(Some(VarName::next(&base)))
    }

    /// Create a variable without any name.
    pub fn make_unnamed(&mut self) -> VarIndex {
        self.push_name(None)
    }

    /// Convert this builder to an actual encoding.
    pub fn build(self) -> VariableEncoding {
        VariableEncoding { names: self.names }
    }

    fn push_name(&mut self, name: Option<VarName>) -> VarIndex {
        let new_index = self.names.len();
        if new_index >= u16::MAX as usize {
            panic!(
                "Too many variables. There can be at most {} variables.",
                u16::MAX
            )
        }
        if let Some(name) = &name {
            if !self.used_names.insert(name.text().to_string()) {
                panic!("Variable {} already exists.", name);
            }
        }
        self.names.push(name);
        VarIndex(new_index as u16)
    }
}

impl Default for VariableEncodingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
