use std::collections::{HashSet, VecDeque};
use crate::schema::DependencyMap;

/// Direct dependents of `field`, in declaration order, without duplicates.
pub fn direct_dependents(field: &str, map: &DependencyMap) -> Vec<String> {
    let mut seen = HashSet::new();
    map.get(field)
        .map(|deps| {
            deps.iter()
                .filter(|d| d.as_str() != field && seen.insert(d.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Every field reachable from `field`, breadth-first. `field` itself is never
/// included. A cycle ends the walk at the first revisited node.
pub fn transitive_dependents(field: &str, map: &DependencyMap) -> Vec<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(field);

    let mut order = Vec::new();
    let mut queue = VecDeque::from([field]);

    while let Some(current) = queue.pop_front() {
        let Some(deps) = map.get(current) else { continue };
        for dep in deps {
            if visited.insert(dep.as_str()) {
                order.push(dep.clone());
                queue.push_back(dep.as_str());
            }
        }
    }
    order
}

/// Returns one cycle (first node repeated at the end) if the map has any.
pub fn find_cycle(map: &DependencyMap) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        node: &'a str,
        map: &'a DependencyMap,
        marks: &mut std::collections::HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(node.to_string());
                return Some(cycle);
            }
            None => {}
        }

        marks.insert(node, Mark::Visiting);
        path.push(node);
        if let Some(deps) = map.get(node) {
            for dep in deps {
                if let Some(cycle) = visit(dep, map, marks, path) {
                    return Some(cycle);
                }
            }
        }
        path.pop();
        marks.insert(node, Mark::Done);
        None
    }

    // Sorted roots keep the reported cycle stable across runs
    let mut roots: Vec<&String> = map.keys().collect();
    roots.sort();

    let mut marks = std::collections::HashMap::new();
    for root in roots {
        let mut path = Vec::new();
        if let Some(cycle) = visit(root, map, &mut marks, &mut path) {
            return Some(cycle);
        }
    }
    None
}
