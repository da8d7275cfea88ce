//! Exhaustive depth-first enumeration of label-to-root paths.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::hierarchy::{LabelPath, ROOT};

/// Enumerate every simple path from `start` up to [`ROOT`] by following
/// child -> parent links.
///
/// Each call owns its visited set; a label is marked on entry and unmarked
/// on backtrack so that sibling branches may revisit it. Parents are visited
/// in sorted order, which makes the output deterministic.
pub(crate) fn enumerate_paths(
    start: &str,
    parents: &BTreeMap<String, BTreeSet<String>>,
) -> Vec<LabelPath> {
    let mut paths = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    walk(start, parents, &mut current, &mut visited, &mut paths);
    paths
}

fn walk<'a>(
    node: &'a str,
    parents: &'a BTreeMap<String, BTreeSet<String>>,
    current: &mut Vec<&'a str>,
    visited: &mut HashSet<&'a str>,
    paths: &mut Vec<LabelPath>,
) {
    if !visited.insert(node) {
        return;
    }
    current.push(node);

    if node == ROOT {
        paths.push(current.iter().map(|l| (*l).to_string()).collect());
    } else if let Some(ups) = parents.get(node) {
        for up in ups {
            walk(up.as_str(), parents, current, visited, paths);
        }
    }

    current.pop();
    visited.remove(node);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parents(pairs: &[(&str, &str)]) -> BTreeMap<String, BTreeSet<String>> {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (p, c) in pairs {
            map.entry(c.to_string()).or_default().insert(p.to_string());
        }
        map
    }

    #[test]
    fn diamond_yields_two_paths() {
        let ups = parents(&[("root", "A"), ("root", "B"), ("A", "C"), ("B", "C")]);
        let paths = enumerate_paths("C", &ups);
        assert_eq!(
            paths,
            vec![vec!["C", "A", "root"], vec!["C", "B", "root"]]
        );
    }

    #[test]
    fn cycle_above_label_terminates() {
        // X <-> Y cycle with Y also hanging off root.
        let ups = parents(&[("root", "Y"), ("Y", "X"), ("X", "Y")]);
        let paths = enumerate_paths("X", &ups);
        assert_eq!(paths, vec![vec!["X", "Y", "root"]]);
    }

    #[test]
    fn orphan_yields_no_path() {
        let ups = parents(&[("root", "A")]);
        assert!(enumerate_paths("Z", &ups).is_empty());
    }
}
