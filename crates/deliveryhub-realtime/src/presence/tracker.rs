//! Presence tracker: last known position of every connected delivery agent.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use deliveryhub_core::error::AppError;
use deliveryhub_core::result::AppResult;
use deliveryhub_core::types::{AgentId, ConnectionId, OrderId, Position};

use crate::registry::ConnectionRegistry;

/// A single position report from an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    /// Reporting agent
    pub agent_id: AgentId,
    /// Order the agent claims to be delivering
    pub order_id: Option<OrderId>,
    /// Reported coordinates
    pub position: Position,
}

/// Snapshot of an agent's presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPresence {
    /// Agent ID
    pub agent_id: AgentId,
    /// Connection the agent last reported from
    pub connection_id: ConnectionId,
    /// Last reported position
    pub position: Position,
    /// When the last report arrived
    pub last_update: DateTime<Utc>,
    /// Order the agent currently claims
    pub active_order_id: Option<OrderId>,
}

#[derive(Debug, Clone)]
struct AgentState {
    position: Position,
    last_update: DateTime<Utc>,
    active_order_id: Option<OrderId>,
}

/// Tracks presence state for all delivery agents.
///
/// At most one entry exists per agent. A new report replaces the previous
/// one entirely, including the active order.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    /// Agent ID → connection + state
    agents: ConnectionRegistry<AgentId, AgentState>,
    /// Order ID → every agent claiming it, most recent claim last
    order_claims: HashMap<OrderId, Vec<AgentId>>,
}

impl PresenceTracker {
    /// Create a new presence tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts an agent's presence from a position report received at `at`.
    ///
    /// Fails only for an empty agent ID or a non-finite coordinate.
    pub fn report_position(
        &mut self,
        report: PositionReport,
        connection_id: ConnectionId,
        at: DateTime<Utc>,
    ) -> AppResult<AgentPresence> {
        if report.agent_id.is_blank() {
            return Err(AppError::validation("agentId must not be empty"));
        }
        if !report.position.is_finite() {
            return Err(AppError::validation("latitude and longitude must be finite numbers"));
        }

        let PositionReport {
            agent_id,
            order_id,
            position,
        } = report;

        let previous_order = self
            .agents
            .get(&agent_id)
            .and_then(|r| r.value.active_order_id.clone());
        if previous_order != order_id {
            if let Some(previous) = &previous_order {
                self.release_claim(previous, &agent_id);
            }
        }

        if let Some(order) = &order_id {
            self.claim(order, &agent_id);
        }

        let state = AgentState {
            position,
            last_update: at,
            active_order_id: order_id,
        };

        if let Some(previous) = self.agents.upsert(agent_id.clone(), connection_id, state) {
            if previous.connection_id != connection_id {
                debug!(
                    agent_id = %agent_id,
                    old_conn_id = %previous.connection_id,
                    conn_id = %connection_id,
                    "Agent presence moved to a new connection"
                );
            }
        }

        self.find(&agent_id)
            .ok_or_else(|| AppError::internal("presence missing right after upsert"))
    }

    /// Removes all presence owned by a connection. No-op if none.
    pub fn remove(&mut self, connection_id: ConnectionId) -> Vec<AgentPresence> {
        let removed = self.agents.remove_connection(connection_id);
        removed
            .into_iter()
            .map(|(agent_id, state)| {
                if let Some(order) = &state.active_order_id {
                    self.release_claim(order, &agent_id);
                }
                to_presence(agent_id, connection_id, state)
            })
            .collect()
    }

    /// Get an agent's current presence
    pub fn find(&self, agent_id: &AgentId) -> Option<AgentPresence> {
        self.agents
            .get(agent_id)
            .map(|r| to_presence(agent_id.clone(), r.connection_id, r.value.clone()))
    }

    /// Presence of the agent currently delivering an order.
    ///
    /// With several claimers, the most recent claim still held wins.
    pub fn find_by_order(&self, order_id: &OrderId) -> Option<AgentPresence> {
        self.order_claims
            .get(order_id)?
            .iter()
            .rev()
            .find_map(|agent_id| self.find(agent_id))
    }

    /// Evicts every presence whose last report is older than `cutoff`.
    pub fn evict_stale(&mut self, cutoff: DateTime<Utc>) -> Vec<AgentPresence> {
        let stale: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|(_, r)| r.value.last_update < cutoff)
            .map(|(agent_id, _)| agent_id.clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|agent_id| {
                let removed = self.agents.remove(&agent_id)?;
                if let Some(order) = &removed.value.active_order_id {
                    self.release_claim(order, &agent_id);
                }
                Some(to_presence(agent_id, removed.connection_id, removed.value))
            })
            .collect()
    }

    /// Agents whose presence is owned by a connection.
    pub fn agents_for(&self, connection_id: ConnectionId) -> Vec<AgentId> {
        self.agents.keys_for(connection_id)
    }

    /// Number of tracked agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent is tracked
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    fn claim(&mut self, order_id: &OrderId, agent_id: &AgentId) {
        let claimers = self.order_claims.entry(order_id.clone()).or_default();
        let already_claimed = claimers.contains(agent_id);
        claimers.retain(|a| a != agent_id);
        if let Some(other) = claimers.last().filter(|_| !already_claimed) {
            warn!(
                order_id = %order_id,
                agent_id = %agent_id,
                previous_agent_id = %other,
                "Order claimed by a second agent, latest claim wins"
            );
        }
        claimers.push(agent_id.clone());
    }

    fn release_claim(&mut self, order_id: &OrderId, agent_id: &AgentId) {
        if let Some(claimers) = self.order_claims.get_mut(order_id) {
            claimers.retain(|a| a != agent_id);
            if claimers.is_empty() {
                self.order_claims.remove(order_id);
            }
        }
    }
}

fn to_presence(agent_id: AgentId, connection_id: ConnectionId, state: AgentState) -> AgentPresence {
    AgentPresence {
        agent_id,
        connection_id,
        position: state.position,
        last_update: state.last_update,
        active_order_id: state.active_order_id,
    }
}
