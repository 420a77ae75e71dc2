// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph helpers over the `name -> inputs` edges of installed manifolds.
//!
//! Inputs may name manifolds that are not installed (yet); such edges are
//! simply dangling and never take part in a cycle.

use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Reverses `name -> inputs` into `name -> dependents`.
///
/// Every key of `edges` appears in the result, possibly with no dependents.
pub fn dependents_of(edges: &BTreeMap<String, Vec<String>>) -> BTreeMap<String, BTreeSet<String>> {
    let mut dependents: BTreeMap<String, BTreeSet<String>> = edges
        .keys()
        .map(|name| (name.clone(), BTreeSet::new()))
        .collect();
    for (name, inputs) in edges {
        for input in inputs {
            if let Some(set) = dependents.get_mut(input) {
                set.insert(name.clone());
            }
        }
    }
    dependents
}

/// Finds a dependency cycle, returning its path with the first node repeated
/// at the end (`a -> b -> a`).
///
/// Depth-first search with a recursion stack: reaching a node that is still on
/// the stack closes a cycle.
pub fn find_cycle(edges: &BTreeMap<String, Vec<String>>) -> Option<Vec<String>> {
    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();
    let mut path = Vec::new();

    for name in edges.keys() {
        if !visited.contains(name.as_str()) {
            if let Some(cycle) = visit(name, edges, &mut visited, &mut on_stack, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit<'a>(
    node: &'a str,
    edges: &'a BTreeMap<String, Vec<String>>,
    visited: &mut HashSet<&'a str>,
    on_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    on_stack.insert(node);
    path.push(node);

    if let Some(inputs) = edges.get(node) {
        for input in inputs {
            let input = input.as_str();
            if !edges.contains_key(input) {
                continue;
            }
            if on_stack.contains(input) {
                let start = path.iter().position(|n| *n == input).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(input.to_string());
                return Some(cycle);
            }
            if !visited.contains(input) {
                if let Some(cycle) = visit(input, edges, visited, on_stack, path) {
                    return Some(cycle);
                }
            }
        }
    }

    on_stack.remove(node);
    path.pop();
    None
}

/// Orders names so that every manifold comes after all of its installed
/// inputs. Names caught in a cycle are appended in name order.
pub fn start_order(edges: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut remaining: BTreeMap<&str, usize> = edges
        .iter()
        .map(|(name, inputs)| {
            let installed = inputs.iter().filter(|i| edges.contains_key(*i)).count();
            (name.as_str(), installed)
        })
        .collect();
    let dependents = dependents_of(edges);
    let mut order = Vec::with_capacity(edges.len());
    let mut ready: Vec<&str> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| *name)
        .collect();

    while let Some(name) = ready.pop() {
        remaining.remove(name);
        order.push(name.to_string());
        if let Some(set) = dependents.get(name) {
            for dependent in set.iter().rev() {
                if let Some(count) = remaining.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(dependent.as_str());
                    }
                }
            }
        }
    }
    order.extend(remaining.keys().map(|name| name.to_string()));
    order
}
