//! Circular-dependency detection via Tarjan's strongly-connected-components
//! algorithm, over the file-level import graph. Each non-trivial SCC is one
//! minimal cycle report; a self-loop (a file importing itself) and
//! singleton SCCs with no self-edge are not cycles.

use std::collections::HashMap;

pub struct Graph {
    pub nodes: Vec<String>,
    node_index: HashMap<String, usize>,
    edges: Vec<Vec<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_index: HashMap::new(),
            edges: Vec::new(),
        }
    }

    fn index_of(&mut self, name: &str) -> usize {
        if let Some(&i) = self.node_index.get(name) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(name.to_string());
        self.edges.push(Vec::new());
        self.node_index.insert(name.to_string(), i);
        i
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let f = self.index_of(from);
        let t = self.index_of(to);
        if !self.edges[f].contains(&t) {
            self.edges[f].push(t);
        }
    }

    /// Returns one vertex set per strongly-connected component containing
    /// more than one node (the cycles a caller cares about).
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let n = self.nodes.len();
        let mut index = vec![None; n];
        let mut lowlink = vec![0; n];
        let mut on_stack = vec![false; n];
        let mut stack = Vec::new();
        let mut counter = 0;
        let mut sccs = Vec::new();

        for v in 0..n {
            if index[v].is_none() {
                self.strongconnect(
                    v,
                    &mut index,
                    &mut lowlink,
                    &mut on_stack,
                    &mut stack,
                    &mut counter,
                    &mut sccs,
                );
            }
        }

        sccs.into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| scc.into_iter().map(|i| self.nodes[i].clone()).collect())
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn strongconnect(
        &self,
        v: usize,
        index: &mut Vec<Option<usize>>,
        lowlink: &mut Vec<usize>,
        on_stack: &mut Vec<bool>,
        stack: &mut Vec<usize>,
        counter: &mut usize,
        sccs: &mut Vec<Vec<usize>>,
    ) {
        index[v] = Some(*counter);
        lowlink[v] = *counter;
        *counter += 1;
        stack.push(v);
        on_stack[v] = true;

        for &w in &self.edges[v] {
            if index[w].is_none() {
                self.strongconnect(w, index, lowlink, on_stack, stack, counter, sccs);
                lowlink[v] = lowlink[v].min(lowlink[w]);
            } else if on_stack[w] {
                lowlink[v] = lowlink[v].min(index[w].unwrap());
            }
        }

        if lowlink[v] == index[v].unwrap() {
            let mut scc = Vec::new();
            loop {
                let w = stack.pop().unwrap();
                on_stack[w] = false;
                scc.push(w);
                if w == v {
                    break;
                }
            }
            sccs.push(scc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_three_node_cycle() {
        let mut g = Graph::new();
        g.add_edge("a.py", "b.py");
        g.add_edge("b.py", "c.py");
        g.add_edge("c.py", "a.py");
        g.add_edge("a.py", "d.py"); // acyclic extra edge

        let cycles = g.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
    }

    #[test]
    fn self_loop_is_not_a_cycle() {
        let mut g = Graph::new();
        g.add_edge("a.py", "a.py");
        g.add_edge("a.py", "b.py");
        assert!(g.cycles().is_empty());
    }
}
