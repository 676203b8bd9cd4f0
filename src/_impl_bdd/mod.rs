/// **(internal)** Implementation of basic logical operators for `Bdd`s using the `apply` function.
pub mod _impl_boolean_ops;

/// **(internal)** Implementation of some basic internal utility methods for `Bdd`s.
pub mod _impl_util;
