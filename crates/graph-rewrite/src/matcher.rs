// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Backtracking subgraph matcher.
//!
//! Pattern nodes are bound in declaration order. Candidates for a label
//! come from the neighbours of an already-bound label when a pattern edge
//! links them, and from every node otherwise; either way they are tried in
//! node insertion order, so the sequence of matches is deterministic.
//! Bindings are injective. Graph edges and nodes the pattern does not
//! mention never prevent a match.

use crate::pattern::{Match, Pattern, PatternEdge};
use graph_ir::{Graph, NodeId};

/// Lazily enumerates every occurrence of `pattern` in `graph`.
///
/// An invalid pattern (see [`Pattern::validate`]) or an empty one yields
/// nothing.
///
/// # Example
/// ```
/// use graph_ir::GraphBuilder;
/// use graph_rewrite::{find_matches, NodeMatcher, Pattern};
///
/// let graph = GraphBuilder::new("g")
///     .data("x").shape(&[2, 3])
///     .op("relu", "Relu")
///     .data("y")
///     .chain(&["x", "relu", "y"])
///     .build()
///     .unwrap();
/// let pattern = Pattern::new()
///     .node("op", NodeMatcher::op("Relu"))
///     .node("in", NodeMatcher::data())
///     .edge("in", "op");
/// let matches: Vec<_> = find_matches(&graph, &pattern).collect();
/// assert_eq!(matches.len(), 1);
/// assert_eq!(matches[0].get("in"), graph.find_by_name("x"));
/// ```
pub fn find_matches<'a>(graph: &'a Graph, pattern: &'a Pattern) -> Matches<'a> {
    Matches::new(graph, pattern)
}

/// Returns `true` if `m` still binds a valid occurrence of `pattern`.
///
/// Used to re-check earlier matches after other rewrites touched the graph.
pub fn match_holds(graph: &Graph, pattern: &Pattern, m: &Match) -> bool {
    let ids: Vec<NodeId> = match pattern
        .labels()
        .map(|label| m.get(label))
        .collect::<Option<Vec<_>>>()
    {
        Some(ids) => ids,
        None => return false,
    };
    let matcher = Matches {
        graph,
        pattern,
        frames: Vec::new(),
        bound: Vec::new(),
    };
    (0..ids.len()).all(|level| matcher.accepts(&ids[..level], ids[level]))
}

struct Frame {
    candidates: Vec<NodeId>,
    cursor: usize,
}

/// Iterator returned by [`find_matches`].
pub struct Matches<'a> {
    graph: &'a Graph,
    pattern: &'a Pattern,
    frames: Vec<Frame>,
    bound: Vec<NodeId>,
}

impl<'a> Matches<'a> {
    fn new(graph: &'a Graph, pattern: &'a Pattern) -> Self {
        let mut matches = Self {
            graph,
            pattern,
            frames: Vec::new(),
            bound: Vec::new(),
        };
        match pattern.validate() {
            Ok(()) if !pattern.is_empty() => {
                let candidates = matches.candidates(0);
                matches.frames.push(Frame { candidates, cursor: 0 });
            }
            Ok(()) => {}
            Err(e) => tracing::warn!("{e}; no matches"),
        }
        matches
    }

    /// Candidate nodes for pattern position `level`, in insertion order.
    ///
    /// `self.bound` holds the bindings of positions `0..level`.
    fn candidates(&self, level: usize) -> Vec<NodeId> {
        let label = &self.pattern.nodes[level].0;
        let linked = self.pattern.edges.iter().find_map(|e| {
            let src = self.pattern.index_of(&e.src)?;
            let dst = self.pattern.index_of(&e.dst)?;
            if &e.dst == label && src < level {
                Some(self.graph.successors(self.bound[src]))
            } else if &e.src == label && dst < level {
                Some(self.graph.predecessors(self.bound[dst]))
            } else {
                None
            }
        });
        match linked {
            Some(Ok(mut ids)) => {
                ids.sort_unstable();
                ids
            }
            Some(Err(_)) => Vec::new(),
            None => self.graph.node_ids(),
        }
    }

    /// Tests binding `candidate` at position `bound.len()`.
    fn accepts(&self, bound: &[NodeId], candidate: NodeId) -> bool {
        let level = bound.len();
        if bound.contains(&candidate) {
            return false;
        }
        let Ok(node) = self.graph.node(candidate) else {
            return false;
        };
        if !self.pattern.nodes[level].1.matches(&node) {
            return false;
        }
        let resolve = |index: usize| if index == level { Some(candidate) } else { bound.get(index).copied() };
        self.pattern.edges.iter().all(|edge| {
            let (Some(src), Some(dst)) = (self.pattern.index_of(&edge.src), self.pattern.index_of(&edge.dst)) else {
                return false;
            };
            // Only edges whose endpoints are both bound are checked here.
            if src.max(dst) != level {
                return true;
            }
            match (resolve(src), resolve(dst)) {
                (Some(s), Some(d)) => self.edge_exists(s, d, edge),
                _ => false,
            }
        })
    }

    fn edge_exists(&self, src: NodeId, dst: NodeId, edge: &PatternEdge) -> bool {
        self.graph.out_edges(src).map_or(false, |edges| {
            edges.iter().any(|(_, e)| {
                e.dst == dst
                    && edge.src_port.map_or(true, |p| p == e.src_port)
                    && edge.dst_port.map_or(true, |p| p == e.dst_port)
            })
        })
    }
}

impl Iterator for Matches<'_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        // Invariant at the top of the loop: bound.len() + 1 == frames.len().
        while let Some(frame) = self.frames.last_mut() {
            if frame.cursor >= frame.candidates.len() {
                self.frames.pop();
                self.bound.pop();
                continue;
            }
            let candidate = frame.candidates[frame.cursor];
            frame.cursor += 1;

            if !self.accepts(&self.bound, candidate) {
                continue;
            }
            let level = self.bound.len();
            if level + 1 == self.pattern.len() {
                let bindings = self
                    .pattern
                    .labels()
                    .map(str::to_string)
                    .zip(self.bound.iter().copied().chain(std::iter::once(candidate)))
                    .collect();
                return Some(Match::new(bindings));
            }
            self.bound.push(candidate);
            let candidates = self.candidates(level + 1);
            self.frames.push(Frame { candidates, cursor: 0 });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeMatcher;
    use graph_ir::GraphBuilder;

    /// x -> add(0), y -> add(1), add -> z; plus an independent relu chain.
    fn sample() -> Graph {
        GraphBuilder::new("sample")
            .data("x")
            .data("y")
            .op("add", "Add")
            .data("z")
            .op("relu", "Relu")
            .data("r")
            .edge_ports("x", "add", 0, 0)
            .edge_ports("y", "add", 0, 1)
            .edge("add", "z")
            .chain(&["z", "relu", "r"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_single_node_pattern_in_insertion_order() {
        let g = sample();
        let pattern = Pattern::new().node("d", NodeMatcher::data());
        let names: Vec<String> = find_matches(&g, &pattern)
            .map(|m| g.node(m.node("d").unwrap()).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["x", "y", "z", "r"]);
    }

    #[test]
    fn test_port_constraints() {
        let g = sample();
        let pattern = Pattern::new()
            .node("op", NodeMatcher::op("Add"))
            .node("rhs", NodeMatcher::data())
            .edge_ports("rhs", "op", None, Some(1));
        let all: Vec<Match> = find_matches(&g, &pattern).collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("rhs"), g.find_by_name("y"));
    }

    #[test]
    fn test_injective_bindings() {
        let g = sample();
        // Two distinct inputs of the same op.
        let pattern = Pattern::new()
            .node("op", NodeMatcher::op("Add"))
            .node("a", NodeMatcher::data())
            .node("b", NodeMatcher::data())
            .edge("a", "op")
            .edge("b", "op");
        let pairs: Vec<(NodeId, NodeId)> = find_matches(&g, &pattern)
            .map(|m| (m.get("a").unwrap(), m.get("b").unwrap()))
            .collect();
        let x = g.find_by_name("x").unwrap();
        let y = g.find_by_name("y").unwrap();
        assert_eq!(pairs, vec![(x, y), (y, x)]);
    }

    #[test]
    fn test_chain_pattern_and_extra_edges() {
        let g = sample();
        // z also feeds relu; the pattern only asks for add -> z -> relu.
        let pattern = Pattern::new()
            .node("add", NodeMatcher::op("Add"))
            .node("mid", NodeMatcher::data())
            .node("relu", NodeMatcher::op("Relu"))
            .edge("add", "mid")
            .edge("mid", "relu");
        let all: Vec<Match> = find_matches(&g, &pattern).collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("mid"), g.find_by_name("z"));
    }

    #[test]
    fn test_no_match_and_invalid_pattern() {
        let g = sample();
        let missing = Pattern::new().node("w", NodeMatcher::op("Where"));
        assert_eq!(find_matches(&g, &missing).count(), 0);

        let invalid = Pattern::new().node("a", NodeMatcher::any()).edge("a", "nope");
        assert_eq!(find_matches(&g, &invalid).count(), 0);
        assert_eq!(find_matches(&g, &Pattern::new()).count(), 0);
    }

    #[test]
    fn test_match_holds_after_edit() {
        let mut g = sample();
        let pattern = Pattern::new()
            .node("relu", NodeMatcher::op("Relu"))
            .node("in", NodeMatcher::data())
            .edge("in", "relu");
        let m = find_matches(&g, &pattern).next().unwrap();
        assert!(match_holds(&g, &pattern, &m));

        let relu = m.node("relu").unwrap();
        g.disconnect_input(relu, 0).unwrap();
        assert!(!match_holds(&g, &pattern, &m));

        g.remove_node(relu, true).unwrap();
        assert!(!match_holds(&g, &pattern, &m));
    }
}
