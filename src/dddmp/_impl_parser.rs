use super::*;
use std::io::Read;
use std::str::FromStr;
use tracing::debug;

/// **(internal)** Header values collected before the `.nodes` section.
#[derive(Default)]
struct Header {
    version: Option<String>,
    mode: Option<String>,
    varinfo: Option<u8>,
    dd_name: Option<String>,
    num_nodes: Option<usize>,
    num_vars: Option<usize>,
    num_support: Option<usize>,
    support_names: Option<Vec<String>>,
    support_ids: Option<Vec<u32>>,
    support_perm_ids: Option<Vec<u32>>,
    num_roots: Option<usize>,
    root_ids: Option<Vec<i64>>,
    root_names: Option<Vec<String>>,
}

impl DddmpArchive {
    /// Read and parse a whole archive from the given `input` reader.
    pub fn read(input: &mut dyn Read) -> Result<DddmpArchive, ArchiveError> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        let text = String::from_utf8(data).map_err(|_| ArchiveError::Encoding)?;
        text.parse()
    }

    /// Name of the stored diagram family (the `.dd` header), if any.
    pub fn dd_name(&self) -> Option<&str> {
        self.dd_name.as_deref()
    }

    /// Number of variables of the manager that wrote the archive.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of stored nodes, including the constant node.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored roots.
    pub fn num_roots(&self) -> usize {
        self.root_ids.len()
    }

    /// Labels of the stored roots, if the archive has them.
    pub fn root_names(&self) -> Option<&[String]> {
        self.root_names.as_deref()
    }

    /// Names of the support variables, if the archive has them.
    pub fn support_names(&self) -> Option<&[String]> {
        self.support_names.as_deref()
    }

    /// Stored indices of the support variables.
    pub fn support_ids(&self) -> &[u32] {
        &self.support_ids
    }

    /// Stored levels of the support variables.
    pub fn support_perm_ids(&self) -> &[u32] {
        &self.support_perm_ids
    }
}

impl FromStr for DddmpArchive {
    type Err = ArchiveError;

    fn from_str(text: &str) -> Result<DddmpArchive, ArchiveError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let mut header = Header::default();
        loop {
            let (line, content) = lines
                .next()
                .ok_or(ArchiveError::UnexpectedEof("the `.nodes` section"))?;
            let mut tokens = content.split_whitespace();
            let Some(key) = tokens.next().and_then(|it| it.strip_prefix('.')) else {
                return Err(invalid_header(line, format!("expected a header, found `{content}`")));
            };
            let values: Vec<&str> = tokens.collect();
            match key {
                "ver" => {
                    let version = single_value(line, key, &values)?;
                    if !version.starts_with("DDDMP-") {
                        return Err(invalid_header(line, format!("unknown version `{version}`")));
                    }
                    header.version = Some(version.to_string());
                }
                "mode" => {
                    let mode = single_value(line, key, &values)?;
                    if mode != "A" {
                        return Err(ArchiveError::UnsupportedMode(mode.to_string()));
                    }
                    header.mode = Some(mode.to_string());
                }
                "varinfo" => {
                    let info: u8 = parse_value(line, single_value(line, key, &values)?)?;
                    if info > 4 {
                        return Err(invalid_header(line, format!("unknown varinfo `{info}`")));
                    }
                    header.varinfo = Some(info);
                }
                "dd" => header.dd_name = Some(single_value(line, key, &values)?.to_string()),
                "nnodes" => header.num_nodes = Some(parse_count(line, key, &values)?),
                "nvars" => header.num_vars = Some(parse_count(line, key, &values)?),
                "nsuppvars" => header.num_support = Some(parse_count(line, key, &values)?),
                "nroots" => header.num_roots = Some(parse_count(line, key, &values)?),
                "suppvarnames" => header.support_names = Some(to_strings(&values)),
                "rootnames" => header.root_names = Some(to_strings(&values)),
                "ids" => header.support_ids = Some(parse_values(line, &values)?),
                "permids" => header.support_perm_ids = Some(parse_values(line, &values)?),
                "rootids" => header.root_ids = Some(parse_values(line, &values)?),
                "orderedvarnames" | "auxids" => {}
                "nodes" => break,
                _ => return Err(invalid_header(line, format!("unknown header `.{key}`"))),
            }
        }

        header.version.as_ref().ok_or(ArchiveError::MissingHeader("ver"))?;
        header.mode.as_ref().ok_or(ArchiveError::MissingHeader("mode"))?;
        let num_nodes = header.num_nodes.ok_or(ArchiveError::MissingHeader("nnodes"))?;
        let num_vars = header.num_vars.ok_or(ArchiveError::MissingHeader("nvars"))?;
        let num_support = header.num_support.ok_or(ArchiveError::MissingHeader("nsuppvars"))?;
        let num_roots = header.num_roots.ok_or(ArchiveError::MissingHeader("nroots"))?;
        let support_ids = header.support_ids.ok_or(ArchiveError::MissingHeader("ids"))?;
        let support_perm_ids = header
            .support_perm_ids
            .ok_or(ArchiveError::MissingHeader("permids"))?;
        let root_ids = header.root_ids.ok_or(ArchiveError::MissingHeader("rootids"))?;

        check_length("ids", support_ids.len(), num_support)?;
        check_length("permids", support_perm_ids.len(), num_support)?;
        if let Some(names) = &header.support_names {
            check_length("suppvarnames", names.len(), num_support)?;
        }
        check_length("rootids", root_ids.len(), num_roots)?;
        if let Some(names) = &header.root_names {
            check_length("rootnames", names.len(), num_roots)?;
        }
        for id in support_ids.iter().chain(support_perm_ids.iter()) {
            if *id as usize >= num_vars {
                return Err(ArchiveError::Inconsistent(format!(
                    "variable {id} is out of range for {num_vars} variables"
                )));
            }
        }
        for root in &root_ids {
            if *root == 0 || root.unsigned_abs() as usize > num_nodes {
                return Err(ArchiveError::Inconsistent(format!(
                    "root id {root} is not a node id"
                )));
            }
        }

        let info = match header.varinfo.unwrap_or(4) {
            0 => NodeInfo::Ids(&support_ids),
            1 => NodeInfo::PermIds(&support_perm_ids),
            2 => NodeInfo::AuxIds,
            3 => NodeInfo::Names(header.support_names.as_deref()),
            _ => NodeInfo::Default,
        };
        let mut nodes = Vec::new();
        for expected_id in 1..=num_nodes {
            let (line, content) = lines
                .next()
                .ok_or(ArchiveError::UnexpectedEof("all nodes were read"))?;
            nodes.push(parse_node(line, content, expected_id, num_support, &info)?);
        }
        match lines.next() {
            Some((_, ".end")) => {}
            Some((line, content)) => {
                return Err(ArchiveError::InvalidNode {
                    line,
                    reason: format!("expected `.end`, found `{content}`"),
                })
            }
            None => return Err(ArchiveError::UnexpectedEof("`.end`")),
        }

        debug!(
            nodes = num_nodes,
            roots = num_roots,
            support = num_support,
            "Parsed DDDMP archive."
        );

        Ok(DddmpArchive {
            dd_name: header.dd_name,
            num_vars,
            support_names: header.support_names,
            support_ids,
            support_perm_ids,
            root_ids,
            root_names: header.root_names,
            nodes,
        })
    }
}

/// **(internal)** The variable info which `.varinfo` adds to every decision node line.
enum NodeInfo<'a> {
    /// Stored index of the variable (`.varinfo 0`).
    Ids(&'a [u32]),
    /// Stored level of the variable (`.varinfo 1`).
    PermIds(&'a [u32]),
    /// Auxiliary id of the variable (`.varinfo 2`). Not checked.
    AuxIds,
    /// Name of the variable (`.varinfo 3`). Checked when the archive has support names.
    Names(Option<&'a [String]>),
    /// No extra field (`.varinfo 4`, or no `.varinfo` at all).
    Default,
}

impl NodeInfo<'_> {
    fn extra_fields(&self) -> usize {
        match self {
            NodeInfo::Default => 0,
            _ => 1,
        }
    }

    /// True if `value` is the info of the support variable at position `support`.
    fn matches(&self, support: usize, value: &str) -> bool {
        match self {
            NodeInfo::Ids(ids) | NodeInfo::PermIds(ids) => value.parse::<u32>().ok() == Some(ids[support]),
            NodeInfo::Names(Some(names)) => names[support] == value,
            NodeInfo::AuxIds | NodeInfo::Names(None) | NodeInfo::Default => true,
        }
    }
}

/// **(internal)** Parse one line of the `.nodes` section.
///
/// A decision node is `<id> [<info>] <support position> <then id> <else id>`, where `info`
/// is present unless the archive uses the default `.varinfo`.
fn parse_node(
    line: usize,
    content: &str,
    expected_id: usize,
    num_support: usize,
    info: &NodeInfo,
) -> Result<DddmpNode, ArchiveError> {
    let invalid = |reason: String| ArchiveError::InvalidNode { line, reason };
    let tokens: Vec<&str> = content.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(invalid(format!("expected a node, found `{content}`")));
    }
    let id: usize = tokens[0]
        .parse()
        .map_err(|_| invalid(format!("invalid node id `{}`", tokens[0])))?;
    if id != expected_id {
        return Err(invalid(format!("expected node {expected_id}, found {id}")));
    }
    if tokens[1] == "T" {
        return Ok(DddmpNode::One);
    }
    let extra = info.extra_fields();
    if tokens.len() != 4 + extra {
        let shape = if extra == 0 {
            "<id> <var> <then> <else>"
        } else {
            "<id> <info> <var> <then> <else>"
        };
        return Err(invalid(format!("expected `{shape}`, found `{content}`")));
    }
    let (stored, edges) = tokens[1..].split_at(extra);
    let support: usize = edges[0]
        .parse()
        .map_err(|_| invalid(format!("invalid variable `{}`", edges[0])))?;
    if support >= num_support {
        return Err(invalid(format!(
            "variable {support} is out of range for {num_support} support variables"
        )));
    }
    if let Some(value) = stored.first() {
        if !info.matches(support, value) {
            return Err(invalid(format!(
                "variable info `{value}` does not match support variable {support}"
            )));
        }
    }
    let then_id: usize = edges[1]
        .parse()
        .map_err(|_| invalid(format!("invalid then-edge `{}`", edges[1])))?;
    let else_id: i64 = edges[2]
        .parse()
        .map_err(|_| invalid(format!("invalid else-edge `{}`", edges[2])))?;
    if then_id == 0 || then_id >= id {
        return Err(invalid(format!("then-edge {then_id} must point to an earlier node")));
    }
    if else_id == 0 || else_id.unsigned_abs() as usize >= id {
        return Err(invalid(format!("else-edge {else_id} must point to an earlier node")));
    }
    Ok(DddmpNode::Decision {
        support,
        then_id,
        else_id,
    })
}

fn invalid_header(line: usize, reason: String) -> ArchiveError {
    ArchiveError::InvalidHeader { line, reason }
}

fn single_value<'a>(line: usize, key: &str, values: &[&'a str]) -> Result<&'a str, ArchiveError> {
    match values {
        [value] => Ok(*value),
        _ => Err(invalid_header(
            line,
            format!("`.{key}` expects exactly one value"),
        )),
    }
}

fn parse_count(line: usize, key: &str, values: &[&str]) -> Result<usize, ArchiveError> {
    parse_value(line, single_value(line, key, values)?)
}

fn parse_value<T: FromStr>(line: usize, value: &str) -> Result<T, ArchiveError> {
    value
        .parse()
        .map_err(|_| invalid_header(line, format!("invalid number `{value}`")))
}

fn parse_values<T: FromStr>(line: usize, values: &[&str]) -> Result<Vec<T>, ArchiveError> {
    values.iter().map(|it| parse_value(line, it)).collect()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|it| it.to_string()).collect()
}

fn check_length(key: &'static str, actual: usize, expected: usize) -> Result<(), ArchiveError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ArchiveError::Inconsistent(format!(
            "`.{key}` has {actual} entries, expected {expected}"
        )))
    }
}
