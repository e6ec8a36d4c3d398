// SPDX-License-Identifier: MIT

//! Static routing table for the fact-check graph
//!
//! ```text
//!            ┌──────────── Researched ─────────────┐
//!            ▼                                     │
//! START ─► supervisor ─ search_* ─► wikipedia | arxiv | web
//!            │  ▲
//!   render_verdict  └──── Improve ────┐
//!            ▼                        │
//!          judge ─ Judged ─► review ──┴─ FINISH ─► terminal
//! ```
//!
//! Every edge is an entry keyed by `(from, key)`, so all reachable transitions
//! can be enumerated and tested.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::adk::error::CheckError;
use crate::checker::types::{Action, ResearchSource, ReviewDecision};

/// Identity of a node in the graph
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Supervisor,
    Wikipedia,
    Arxiv,
    Web,
    Judge,
    Review,
    Terminal,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Supervisor => "supervisor",
            NodeId::Wikipedia => "wikipedia",
            NodeId::Arxiv => "arxiv",
            NodeId::Web => "web",
            NodeId::Judge => "judge",
            NodeId::Review => "review",
            NodeId::Terminal => "terminal",
        }
    }

    pub fn research(source: ResearchSource) -> Self {
        match source {
            ResearchSource::Wikipedia => NodeId::Wikipedia,
            ResearchSource::Arxiv => NodeId::Arxiv,
            ResearchSource::Web => NodeId::Web,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value a node leaves in `next` to tell the router where to go
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoutingKey {
    SearchWikipedia,
    SearchArxiv,
    SearchWeb,
    RenderVerdict,
    /// Fixed edge out of every research node
    Researched,
    /// Fixed edge out of the judge
    Judged,
    Improve,
    Finish,
}

impl From<Action> for RoutingKey {
    fn from(action: Action) -> Self {
        match action {
            Action::SearchWikipedia => RoutingKey::SearchWikipedia,
            Action::SearchArxiv => RoutingKey::SearchArxiv,
            Action::SearchWeb => RoutingKey::SearchWeb,
            Action::RenderVerdict => RoutingKey::RenderVerdict,
        }
    }
}

impl From<ReviewDecision> for RoutingKey {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Improve => RoutingKey::Improve,
            ReviewDecision::Finish => RoutingKey::Finish,
        }
    }
}

/// Transition table from `(node, routing key)` to the next node
#[derive(Debug, Clone)]
pub struct Router {
    edges: HashMap<(NodeId, RoutingKey), NodeId>,
}

impl Router {
    /// Empty router; see [`Router::fact_check`] for the standard graph
    pub fn empty() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    /// The supervisor / research / judge / review graph
    pub fn fact_check() -> Self {
        let mut router = Self::empty();

        router
            .add_edge(NodeId::Supervisor, RoutingKey::SearchWikipedia, NodeId::Wikipedia)
            .add_edge(NodeId::Supervisor, RoutingKey::SearchArxiv, NodeId::Arxiv)
            .add_edge(NodeId::Supervisor, RoutingKey::SearchWeb, NodeId::Web)
            .add_edge(NodeId::Supervisor, RoutingKey::RenderVerdict, NodeId::Judge);

        for source in ResearchSource::ALL {
            router.add_edge(NodeId::research(source), RoutingKey::Researched, NodeId::Supervisor);
        }

        router
            .add_edge(NodeId::Judge, RoutingKey::Judged, NodeId::Review)
            .add_edge(NodeId::Review, RoutingKey::Improve, NodeId::Supervisor)
            .add_edge(NodeId::Review, RoutingKey::Finish, NodeId::Terminal);

        router
    }

    pub fn add_edge(&mut self, from: NodeId, key: RoutingKey, to: NodeId) -> &mut Self {
        self.edges.insert((from, key), to);
        self
    }

    /// Look up the next node. A missing edge is a programming defect and always fatal.
    pub fn next(&self, from: NodeId, key: Option<RoutingKey>) -> Result<NodeId, CheckError> {
        let key = key.ok_or_else(|| {
            CheckError::RoutingConfiguration(format!("node '{}' produced no routing key", from))
        })?;

        self.edges.get(&(from, key)).copied().ok_or_else(|| {
            CheckError::RoutingConfiguration(format!(
                "no edge from '{}' for routing key {:?}",
                from, key
            ))
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::fact_check()
    }
}
