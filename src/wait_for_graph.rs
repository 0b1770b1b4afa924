//! Process-wide wait-for graph and cycle detection for deadlock
//! detection, carried over from the teacher's
//! `transaction/wait_for_graph.rs`, generalized from B+-tree page ids to
//! plain transaction ids (the lock manager owns the page association).

use crate::types::TransactionId;
use std::collections::{HashMap, HashSet};

pub struct WaitForGraph {
    /// key: waiter, value: set of transactions it is blocked on.
    edges: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl WaitForGraph {
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    pub fn add_edge(&mut self, from: TransactionId, to: TransactionId) {
        if from != to {
            self.edges.entry(from).or_insert_with(HashSet::new).insert(to);
        }
    }

    pub fn remove_waiter(&mut self, tid: TransactionId) {
        self.edges.remove(&tid);
    }

    pub fn remove_transaction(&mut self, tid: TransactionId) {
        self.edges.remove(&tid);
        for waiters in self.edges.values_mut() {
            waiters.remove(&tid);
        }
    }

    /// DFS from `tid`: a vertex already in the recursion stack indicates a
    /// cycle. Vertices must be popped from the recursion stack on return,
    /// or transitive non-cyclic waits are falsely reported as deadlocks.
    pub fn creates_cycle(&self, tid: TransactionId) -> bool {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        self.is_cyclic(tid, &mut visited, &mut rec_stack)
    }

    fn is_cyclic(
        &self,
        tid: TransactionId,
        visited: &mut HashSet<TransactionId>,
        rec_stack: &mut HashSet<TransactionId>,
    ) -> bool {
        if !visited.contains(&tid) {
            visited.insert(tid);
            rec_stack.insert(tid);

            if let Some(waiting_on) = self.edges.get(&tid) {
                for &next in waiting_on {
                    if !visited.contains(&next) && self.is_cyclic(next, visited, rec_stack) {
                        return true;
                    } else if rec_stack.contains(&next) {
                        return true;
                    }
                }
            }
        }

        rec_stack.remove(&tid);
        false
    }
}
