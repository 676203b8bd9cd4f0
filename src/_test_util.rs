use super::*;
use std::io::Write;

/// Variables `_`, `a` and `a'`, where `a'` is the next-state variant of `a`.
pub fn mk_scenario_a_encoding() -> VariableEncoding {
    let mut builder = VariableEncodingBuilder::new();
    let a = builder.make_variable("a");
    builder.make_next_variable(a);
    builder.build()
}

/// Variables `_`, `x`, `x'`, `y`, `y'` and one unnamed variable.
pub fn mk_transition_encoding() -> VariableEncoding {
    let mut builder = VariableEncodingBuilder::new();
    let x = builder.make_variable("x");
    builder.make_next_variable(x);
    let y = builder.make_variable("y");
    builder.make_next_variable(y);
    builder.make_unnamed();
    builder.build()
}

pub fn load_test_archive(name: &str) -> String {
    std::fs::read_to_string(format!("res/test_archives/{name}"))
        .expect("Cannot open archive file.")
}

/// Assemble an archive text. The number of stored variables is derived from the largest
/// index or level in `ids` and `perm_ids`.
pub fn mk_archive(
    support_names: &[&str],
    ids: &[u32],
    perm_ids: &[u32],
    roots: &[(&str, i64)],
    nodes: &[&str],
) -> String {
    let num_vars = ids
        .iter()
        .chain(perm_ids.iter())
        .max()
        .map(|it| *it as usize + 1)
        .unwrap_or(0);
    let join = |items: Vec<String>| items.join(" ");
    let mut text = String::new();
    text.push_str(".ver DDDMP-2.0\n.mode A\n.varinfo 4\n");
    text.push_str(&format!(".nnodes {}\n", nodes.len()));
    text.push_str(&format!(".nvars {}\n", num_vars));
    text.push_str(&format!(".nsuppvars {}\n", ids.len()));
    text.push_str(&format!(".suppvarnames {}\n", support_names.join(" ")));
    text.push_str(&format!(".ids {}\n", join(ids.iter().map(|it| it.to_string()).collect())));
    text.push_str(&format!(
        ".permids {}\n",
        join(perm_ids.iter().map(|it| it.to_string()).collect())
    ));
    text.push_str(&format!(".nroots {}\n", roots.len()));
    text.push_str(&format!(
        ".rootids {}\n",
        join(roots.iter().map(|(_, id)| id.to_string()).collect())
    ));
    text.push_str(&format!(
        ".rootnames {}\n",
        join(roots.iter().map(|(name, _)| name.to_string()).collect())
    ));
    text.push_str(".nodes\n");
    for node in nodes {
        text.push_str(node);
        text.push('\n');
    }
    text.push_str(".end\n");
    text
}

/// Write `text` into a fresh temporary file.
pub fn write_archive(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Cannot create temporary file.");
    file.write_all(text.as_bytes())
        .expect("Cannot write temporary file.");
    file
}

/// Evaluate `root` in all valuations of `vars` (other variables are `false`). The valuation
/// number `i` assigns bit `k` of `i` to `vars[k]`.
pub fn truth_table(manager: &BddManager, root: BddRef, vars: &[VarIndex]) -> Vec<bool> {
    (0..(1usize << vars.len()))
        .map(|bits| {
            manager
                .eval(root, |v| {
                    vars.iter()
                        .position(|it| *it == v)
                        .map(|k| (bits >> k) & 1 == 1)
                        .unwrap_or(false)
                })
                .expect("Root is not live.")
        })
        .collect()
}

/// Route `tracing` output of a test into the test harness.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
