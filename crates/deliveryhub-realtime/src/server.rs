//! The hub sequencer.
//!
//! `RealtimeHub` owns all registry state and processes commands one at a time
//! from a single mpsc queue, so every read-then-write on the registries is
//! atomic with respect to other events. `HubHandle` is the cloneable client
//! side used by transport tasks and HTTP handlers.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use deliveryhub_core::config::RealtimeConfig;
use deliveryhub_core::error::AppError;
use deliveryhub_core::result::AppResult;
use deliveryhub_core::types::{AgentId, ConnectionId, RestaurantId};

use crate::connection::handle::{ConnectionHandle, ConnectionState, PushOutcome};
use crate::connection::lifecycle::ConnectionLifecycleManager;
use crate::message::builder::{self, INVALID_MESSAGE};
use crate::message::codec;
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::metrics::{HubMetrics, MetricsSnapshot};
use crate::presence::sweep;
use crate::router::{Delivery, EventRouter, Recipient};
use crate::state::HubState;
use crate::subscription::tracker::OrderWatch;

/// Commands processed by the sequencer.
#[derive(Debug)]
pub enum HubCommand {
    /// A transport connection opened.
    Connect {
        /// Handle holding the connection's outbound queue
        handle: ConnectionHandle,
    },
    /// A raw text frame arrived on a connection.
    Inbound {
        /// Originating connection
        conn_id: ConnectionId,
        /// Undecoded frame
        raw: String,
    },
    /// An already-decoded event injected without a connection.
    Publish {
        /// Event to route
        event: InboundMessage,
        /// Number of pushes queued
        respond_to: oneshot::Sender<AppResult<usize>>,
    },
    /// A transport connection closed.
    Disconnect {
        /// Closed connection
        conn_id: ConnectionId,
    },
    /// Evict stale agent presence.
    SweepStale,
    /// Report registry sizes.
    Snapshot {
        /// Reply channel
        respond_to: oneshot::Sender<HubSnapshot>,
    },
    /// Close every connection and stop the loop.
    Shutdown,
}

/// Point-in-time view of the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSnapshot {
    /// Live connections
    pub connections: usize,
    /// Agents with a known position
    pub agents: usize,
    /// Orders with a watcher
    pub watched_orders: usize,
    /// Restaurants with at least one follower
    pub watched_restaurants: usize,
    /// Counters
    pub metrics: MetricsSnapshot,
    /// Per-connection view, oldest connection first
    pub sessions: Vec<ConnectionSummary>,
}

/// What a single live connection currently owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSummary {
    /// Connection ID
    pub id: ConnectionId,
    /// Lifecycle state
    pub state: ConnectionState,
    /// When the transport opened
    pub connected_at: DateTime<Utc>,
    /// Agents reporting through this connection
    pub agents: Vec<AgentId>,
    /// Orders this connection watches
    pub orders: Vec<OrderWatch>,
    /// Restaurants this connection follows
    pub restaurants: Vec<RestaurantId>,
}

/// The sequencer task. Owns [`HubState`] exclusively.
pub struct RealtimeHub {
    receiver: mpsc::Receiver<HubCommand>,
    state: HubState,
    router: EventRouter,
    lifecycle: ConnectionLifecycleManager,
    metrics: Arc<HubMetrics>,
    config: RealtimeConfig,
}

impl RealtimeHub {
    /// Creates the hub and its client handle. The hub does nothing until
    /// [`RealtimeHub::run`] is awaited.
    pub fn new(config: RealtimeConfig) -> (Self, HubHandle) {
        let (sender, receiver) = mpsc::channel(config.command_buffer_size.max(1));
        let metrics = Arc::new(HubMetrics::new());

        let hub = Self {
            receiver,
            state: HubState::new(),
            router: EventRouter::new(config.restaurant_scope),
            lifecycle: ConnectionLifecycleManager::new(Arc::clone(&metrics)),
            metrics: Arc::clone(&metrics),
            config: config.clone(),
        };
        let handle = HubHandle {
            sender,
            metrics,
            outbound_buffer_size: config.outbound_buffer_size.max(1),
        };
        (hub, handle)
    }

    /// Creates the hub, spawns its loop and, when presence expiry is
    /// enabled, the sweep timer.
    pub fn spawn(config: RealtimeConfig) -> (HubHandle, JoinHandle<()>) {
        let sweep_every = config
            .stale_presence_ttl()
            .map(|_| config.sweep_interval());
        let (hub, handle) = Self::new(config);
        let task = tokio::spawn(hub.run());

        if let Some(interval) = sweep_every {
            tokio::spawn(sweep::run_sweeper(handle.clone(), interval));
        }

        (handle, task)
    }

    /// Processes commands until `Shutdown` arrives or every handle is dropped.
    pub async fn run(mut self) {
        info!(
            restaurant_scope = ?self.config.restaurant_scope,
            stale_presence_seconds = self.config.stale_presence_seconds,
            "Realtime hub started"
        );

        while let Some(command) = self.receiver.recv().await {
            match command {
                HubCommand::Connect { handle } => {
                    self.lifecycle.connect(&mut self.state, handle);
                }
                HubCommand::Inbound { conn_id, raw } => {
                    self.handle_inbound(conn_id, &raw, Utc::now());
                }
                HubCommand::Publish { event, respond_to } => {
                    let result = self.publish(event, Utc::now());
                    let _ = respond_to.send(result);
                }
                HubCommand::Disconnect { conn_id } => {
                    self.lifecycle.disconnect(&mut self.state, conn_id);
                }
                HubCommand::SweepStale => {
                    self.sweep_stale(Utc::now());
                }
                HubCommand::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.snapshot());
                }
                HubCommand::Shutdown => {
                    self.lifecycle.close_all(&mut self.state);
                    break;
                }
            }
        }

        info!("Realtime hub stopped");
    }

    fn handle_inbound(&mut self, conn_id: ConnectionId, raw: &str, now: DateTime<Utc>) {
        self.metrics.message_received();

        if !self.state.pool.contains(&conn_id) {
            warn!(conn_id = %conn_id, "Frame from unknown connection, dropping");
            return;
        }

        let event = match codec::decode_inbound(raw, self.config.max_message_bytes) {
            Ok(event) => event,
            Err(e) => {
                self.metrics.decode_failure();
                warn!(conn_id = %conn_id, error = %e, "Malformed message discarded");
                self.reject(conn_id, &e);
                return;
            }
        };

        let event_name = event.event_name();
        let touches_registry = event.requires_connection();
        debug!(conn_id = %conn_id, event = event_name, "Inbound event");

        match self.router.route(&mut self.state, Some(conn_id), event, now) {
            Ok(deliveries) => {
                if touches_registry {
                    self.lifecycle.activate(&mut self.state, conn_id);
                }
                self.dispatch(deliveries);
            }
            Err(e) => {
                warn!(conn_id = %conn_id, event = event_name, error = %e, "Event rejected");
                self.reject(conn_id, &e);
            }
        }
    }

    fn publish(&mut self, event: InboundMessage, now: DateTime<Utc>) -> AppResult<usize> {
        self.metrics.message_received();
        debug!(event = event.event_name(), "Published event");
        let deliveries = self.router.route(&mut self.state, None, event, now)?;
        Ok(self.dispatch(deliveries))
    }

    fn reject(&self, conn_id: ConnectionId, error: &AppError) {
        if let Some(handle) = self.state.pool.get(&conn_id) {
            self.record(handle.push(builder::build_error(INVALID_MESSAGE, &error.message)));
        }
    }

    /// Pushes every delivery to its live recipients. Returns how many
    /// messages were queued.
    fn dispatch(&self, deliveries: Vec<Delivery>) -> usize {
        let mut queued = 0;

        for Delivery { recipient, message } in deliveries {
            match recipient {
                Recipient::Connection(conn_id) => {
                    queued += self.push_to(conn_id, message);
                }
                Recipient::Connections(conn_ids) => {
                    for conn_id in conn_ids {
                        queued += self.push_to(conn_id, message.clone());
                    }
                }
                Recipient::Everyone => {
                    for handle in self.state.pool.iter() {
                        queued += self.record(handle.push(message.clone()));
                    }
                }
            }
        }

        queued
    }

    fn push_to(&self, conn_id: ConnectionId, message: OutboundMessage) -> usize {
        match self.state.pool.get(&conn_id) {
            Some(handle) => self.record(handle.push(message)),
            None => {
                debug!(conn_id = %conn_id, "Recipient gone, push dropped");
                self.metrics.push_dropped();
                0
            }
        }
    }

    fn record(&self, outcome: PushOutcome) -> usize {
        match outcome {
            PushOutcome::Queued => {
                self.metrics.push_sent();
                1
            }
            PushOutcome::Full | PushOutcome::Closed => {
                self.metrics.push_dropped();
                0
            }
        }
    }

    fn sweep_stale(&mut self, now: DateTime<Utc>) {
        let Some(ttl) = self.config.stale_presence_ttl() else {
            return;
        };
        let Ok(ttl) = TimeDelta::from_std(ttl) else {
            warn!(?ttl, "Presence TTL out of range, sweep skipped");
            return;
        };

        let evicted = self.state.presence.evict_stale(now - ttl);
        for presence in &evicted {
            info!(
                agent_id = %presence.agent_id,
                conn_id = %presence.connection_id,
                last_update = %presence.last_update,
                "Stale agent presence evicted"
            );
        }
        self.metrics.presence_evicted(evicted.len() as u64);
    }

    fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            connections: self.state.pool.connection_count(),
            agents: self.state.presence.len(),
            watched_orders: self.state.orders.len(),
            watched_restaurants: self.state.restaurants.len(),
            metrics: self.metrics.snapshot(),
            sessions: self.sessions(),
        }
    }

    fn sessions(&self) -> Vec<ConnectionSummary> {
        let mut sessions: Vec<ConnectionSummary> = self
            .state
            .pool
            .iter()
            .map(|handle| ConnectionSummary {
                id: handle.id,
                state: handle.state(),
                connected_at: handle.connected_at,
                agents: self.state.presence.agents_for(handle.id),
                orders: self
                    .state
                    .orders
                    .orders_for(handle.id)
                    .iter()
                    .filter_map(|order_id| self.state.orders.watch(order_id))
                    .collect(),
                restaurants: self.state.restaurants.restaurants_for(handle.id),
            })
            .collect();
        sessions.sort_by_key(|s| s.connected_at);
        sessions
    }
}

/// Cloneable client for the hub sequencer.
#[derive(Debug, Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
    metrics: Arc<HubMetrics>,
    outbound_buffer_size: usize,
}

impl HubHandle {
    /// Registers a new connection. Returns its ID and the receiver the
    /// transport writer drains.
    pub async fn connect(&self) -> AppResult<(ConnectionId, mpsc::Receiver<OutboundMessage>)> {
        let (tx, rx) = mpsc::channel(self.outbound_buffer_size);
        let conn_id = ConnectionId::new();
        self.send(HubCommand::Connect {
            handle: ConnectionHandle::new(conn_id, tx),
        })
        .await?;
        Ok((conn_id, rx))
    }

    /// Hands a raw text frame to the hub.
    pub async fn inbound(&self, conn_id: ConnectionId, raw: String) -> AppResult<()> {
        self.send(HubCommand::Inbound { conn_id, raw }).await
    }

    /// Reports a closed connection.
    pub async fn disconnect(&self, conn_id: ConnectionId) -> AppResult<()> {
        self.send(HubCommand::Disconnect { conn_id }).await
    }

    /// Routes an event that did not arrive on a connection.
    pub async fn publish(&self, event: InboundMessage) -> AppResult<usize> {
        let (respond_to, response) = oneshot::channel();
        self.send(HubCommand::Publish { event, respond_to }).await?;
        response.await.map_err(|_| hub_stopped())?
    }

    /// Current registry sizes and counters.
    pub async fn snapshot(&self) -> AppResult<HubSnapshot> {
        let (respond_to, response) = oneshot::channel();
        self.send(HubCommand::Snapshot { respond_to }).await?;
        response.await.map_err(|_| hub_stopped())
    }

    /// Requests a stale presence sweep.
    pub async fn sweep(&self) -> AppResult<()> {
        self.send(HubCommand::SweepStale).await
    }

    /// Asks the hub to close every connection and stop.
    pub async fn shutdown(&self) -> AppResult<()> {
        self.send(HubCommand::Shutdown).await
    }

    /// Counters, read without going through the sequencer.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn send(&self, command: HubCommand) -> AppResult<()> {
        self.sender.send(command).await.map_err(|_| hub_stopped())
    }
}

fn hub_stopped() -> AppError {
    AppError::service_unavailable("Realtime hub is not running")
}
