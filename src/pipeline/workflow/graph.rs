//! Fixed-topology workflow graph.
//!
//! Nodes and routes are closed enums, so a misspelt edge is a compile error.
//! Structural checks that the type system cannot express (every node
//! registered, every route covered, no cycles, terminals have no outgoing
//! edge) run once in [`GraphBuilder::compile`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::WorkflowError;
use super::state::CaseState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    CheckPendingExams,
    AssessSeverity,
    SynthesizeAnswer,
    EmitAlert,
    NoAlert,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckPendingExams => "check_pending_exams",
            Self::AssessSeverity => "assess_severity",
            Self::SynthesizeAnswer => "synthesize_answer",
            Self::EmitAlert => "emit_alert",
            Self::NoAlert => "no_alert",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outgoing edge identifiers of the alert branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertRoute {
    EmitAlert,
    NoAlert,
}

impl AlertRoute {
    pub const ALL: [AlertRoute; 2] = [AlertRoute::EmitAlert, AlertRoute::NoAlert];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmitAlert => "emit_alert",
            Self::NoAlert => "no_alert",
        }
    }
}

impl fmt::Display for AlertRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work: takes the case, returns it with the node's fields written.
pub trait Node: Send + Sync {
    fn run(&self, state: CaseState) -> Result<CaseState, WorkflowError>;
}

/// Chooses the outgoing route of a conditional node.
pub type Router = fn(&CaseState) -> Result<AlertRoute, WorkflowError>;

enum Edge {
    Direct(NodeId),
    Conditional {
        router: Router,
        routes: HashMap<AlertRoute, NodeId>,
    },
}

#[derive(Default)]
pub struct GraphBuilder {
    nodes: HashMap<NodeId, Box<dyn Node>>,
    edges: HashMap<NodeId, Edge>,
    entry: Option<NodeId>,
    terminals: HashSet<NodeId>,
    problems: Vec<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(mut self, id: NodeId, node: impl Node + 'static) -> Self {
        if self.nodes.insert(id, Box::new(node)).is_some() {
            self.problems.push(format!("node {id} registered twice"));
        }
        self
    }

    pub fn add_edge(mut self, from: NodeId, to: NodeId) -> Self {
        self.insert_edge(from, Edge::Direct(to));
        self
    }

    pub fn add_conditional_edges(
        mut self,
        from: NodeId,
        router: Router,
        routes: &[(AlertRoute, NodeId)],
    ) -> Self {
        let mut map = HashMap::new();
        for (route, target) in routes {
            if map.insert(*route, *target).is_some() {
                self.problems
                    .push(format!("route {route} from {from} registered twice"));
            }
        }
        self.insert_edge(from, Edge::Conditional { router, routes: map });
        self
    }

    pub fn set_entry(mut self, id: NodeId) -> Self {
        self.entry = Some(id);
        self
    }

    pub fn set_terminal(mut self, id: NodeId) -> Self {
        self.terminals.insert(id);
        self
    }

    fn insert_edge(&mut self, from: NodeId, edge: Edge) {
        if self.edges.insert(from, edge).is_some() {
            self.problems
                .push(format!("node {from} has more than one outgoing edge"));
        }
    }

    /// Validate the structure and freeze it.
    pub fn compile(self) -> Result<CompiledGraph, WorkflowError> {
        let mut problems = self.problems;

        let entry = match self.entry {
            Some(entry) => entry,
            None => {
                problems.push("no entry node".into());
                return Err(WorkflowError::GraphInvalid(problems.join("; ")));
            }
        };
        if !self.nodes.contains_key(&entry) {
            problems.push(format!("entry {entry} is not a registered node"));
        }

        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                problems.push(format!("edge source {from} is not a registered node"));
            }
            if self.terminals.contains(from) {
                problems.push(format!("terminal {from} has an outgoing edge"));
            }
            match edge {
                Edge::Direct(to) => {
                    if !self.nodes.contains_key(to) {
                        problems.push(format!("edge target {to} is not a registered node"));
                    }
                }
                Edge::Conditional { routes, .. } => {
                    for route in AlertRoute::ALL {
                        match routes.get(&route) {
                            Some(to) if !self.nodes.contains_key(to) => problems
                                .push(format!("route {route} targets unregistered node {to}")),
                            Some(_) => {}
                            None => problems
                                .push(format!("route {route} from {from} has no target")),
                        }
                    }
                }
            }
        }

        for id in self.nodes.keys() {
            if !self.terminals.contains(id) && !self.edges.contains_key(id) {
                problems.push(format!("non-terminal {id} has no outgoing edge"));
            }
        }
        for id in &self.terminals {
            if !self.nodes.contains_key(id) {
                problems.push(format!("terminal {id} is not a registered node"));
            }
        }

        if problems.is_empty() {
            if let Some(node) = find_cycle(entry, &self.edges) {
                problems.push(format!("cycle through {node}"));
            }
        }

        if !problems.is_empty() {
            problems.sort();
            return Err(WorkflowError::GraphInvalid(problems.join("; ")));
        }

        Ok(CompiledGraph {
            nodes: self.nodes,
            edges: self.edges,
            entry,
        })
    }
}

fn successors(edge: &Edge) -> Vec<NodeId> {
    match edge {
        Edge::Direct(to) => vec![*to],
        Edge::Conditional { routes, .. } => routes.values().copied().collect(),
    }
}

/// Depth-first search from `entry`; returns a node on a cycle, if any.
fn find_cycle(entry: NodeId, edges: &HashMap<NodeId, Edge>) -> Option<NodeId> {
    fn visit(
        node: NodeId,
        edges: &HashMap<NodeId, Edge>,
        on_stack: &mut HashSet<NodeId>,
        done: &mut HashSet<NodeId>,
    ) -> Option<NodeId> {
        if on_stack.contains(&node) {
            return Some(node);
        }
        if !done.insert(node) {
            return None;
        }
        on_stack.insert(node);
        if let Some(edge) = edges.get(&node) {
            for next in successors(edge) {
                if let Some(hit) = visit(next, edges, on_stack, done) {
                    return Some(hit);
                }
            }
        }
        on_stack.remove(&node);
        None
    }

    visit(entry, edges, &mut HashSet::new(), &mut HashSet::new())
}

/// A validated, immutable graph.
pub struct CompiledGraph {
    nodes: HashMap<NodeId, Box<dyn Node>>,
    edges: HashMap<NodeId, Edge>,
    entry: NodeId,
}

impl CompiledGraph {
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&dyn Node, WorkflowError> {
        self.nodes
            .get(&id)
            .map(|n| &**n)
            .ok_or_else(|| WorkflowError::GraphInvalid(format!("node {id} is not registered")))
    }

    /// Next node after `from`, or `None` at a terminal. A conditional
    /// router is evaluated once per call.
    pub(crate) fn next(&self, from: NodeId, state: &CaseState) -> Result<Option<NodeId>, WorkflowError> {
        match self.edges.get(&from) {
            None => Ok(None),
            Some(Edge::Direct(to)) => Ok(Some(*to)),
            Some(Edge::Conditional { router, routes }) => {
                let route = router(state)?;
                routes
                    .get(&route)
                    .copied()
                    .map(Some)
                    .ok_or(WorkflowError::RoutingMismatch { node: from, route })
            }
        }
    }
}
