use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::{HashMap, HashSet};
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};

use crate::{
    backoff::BackoffPolicy,
    classify::{Disposition, classify},
    mutation::{Mutation, Operation},
    observe::{DebugEntry, DebugLog, LifecycleCategory},
    store::{QueueStore, StoreError},
    transport::{Transport, TransportError, TransportResult},
    types::{EntityId, MutationId, MutationStatus},
};

use super::events::QueueEvent;

/// Errors surfaced through [`QueueHandle`] calls.
#[derive(Debug)]
pub enum QueueError {
    /// Persistence failure in the durable queue store.
    Store(StoreError),
    /// No mutation with the given id.
    NotFound(MutationId),
    /// Only conflict/failed mutations may be retried.
    NotRetryable(MutationId),
    /// Only conflict/failed mutations may be discarded.
    NotDiscardable(MutationId),
    /// The runtime loop has shut down.
    ChannelClosed,
}

impl From<StoreError> for QueueError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Runtime configuration for [`spawn_queue`].
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Whether the engine assumes connectivity at spawn.
    pub start_online: bool,
    /// Periodic drain interval while online, in milliseconds.
    pub sync_interval_ms: u64,
    /// Broadcast event channel capacity.
    pub event_capacity: usize,
    /// Retry schedule and attempt ceiling.
    pub backoff: BackoffPolicy,
    /// Debug trail capacity.
    pub trail_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            start_online: true,
            sync_interval_ms: 15_000,
            event_capacity: 1024,
            backoff: BackoffPolicy::default(),
            trail_capacity: 256,
        }
    }
}

/// Cloneable handle to the queue runtime.
pub struct QueueHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<QueueEvent>,
}

impl Clone for QueueHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Enqueue {
        entity_id: EntityId,
        operation: Operation,
        resp: oneshot::Sender<Result<Mutation, QueueError>>,
    },
    ActiveByEntity {
        entity_id: EntityId,
        resp: oneshot::Sender<Result<Vec<Mutation>, QueueError>>,
    },
    ListAll {
        resp: oneshot::Sender<Result<Vec<Mutation>, QueueError>>,
    },
    Retry {
        id: MutationId,
        resp: oneshot::Sender<Result<(), QueueError>>,
    },
    Discard {
        id: MutationId,
        resp: oneshot::Sender<Result<(), QueueError>>,
    },
    SetOnline {
        online: bool,
        resp: oneshot::Sender<()>,
    },
    SyncNow {
        resp: oneshot::Sender<()>,
    },
    RecordLifecycle {
        category: LifecycleCategory,
        detail: String,
        resp: oneshot::Sender<()>,
    },
    DebugTrail {
        resp: oneshot::Sender<Vec<DebugEntry>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

struct DeliveryDone {
    id: MutationId,
    entity_id: EntityId,
    result: TransportResult,
}

struct Engine {
    store: Box<dyn QueueStore>,
    transport: Arc<dyn Transport>,
    events_tx: broadcast::Sender<QueueEvent>,
    done_tx: mpsc::UnboundedSender<DeliveryDone>,
    backoff: BackoffPolicy,
    sync_interval: Duration,
    online: bool,
    in_flight: HashSet<EntityId>,
    not_before: HashMap<MutationId, Instant>,
    next_id: MutationId,
    trail: DebugLog,
}

/// Spawns the queue runtime over a store and a transport.
///
/// Seeds the id counter from persisted state, so mutations queued before a
/// restart keep their place in line. Fails only when the initial store scan
/// fails.
pub fn spawn_queue(
    store: Box<dyn QueueStore>,
    transport: Arc<dyn Transport>,
    config: QueueConfig,
) -> Result<QueueHandle, StoreError> {
    let next_id = store.list_all()?.iter().map(|m| m.id).max().unwrap_or(0) + 1;

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<QueueEvent>(config.event_capacity.max(1));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<DeliveryDone>();

    let mut engine = Engine {
        store,
        transport,
        events_tx: events_tx.clone(),
        done_tx,
        backoff: config.backoff,
        sync_interval: Duration::from_millis(config.sync_interval_ms.max(1)),
        online: config.start_online,
        in_flight: HashSet::new(),
        not_before: HashMap::new(),
        next_id,
        trail: DebugLog::new(config.trail_capacity),
    };

    tokio::spawn(async move {
        // Baseline observation; suppressed by the trail, only later
        // transitions are recorded.
        let initial = if engine.online { "online" } else { "offline" };
        engine.trail.record(LifecycleCategory::Network, initial);
        engine.pump();

        loop {
            let wake = engine.next_wake();
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    if engine.handle_command(cmd) {
                        break;
                    }
                }
                done = done_rx.recv() => {
                    if let Some(done) = done {
                        engine.finish_delivery(done);
                    }
                }
                _ = idle_until(wake), if wake.is_some() => {
                    engine.pump();
                }
            }
        }
    });

    Ok(QueueHandle { cmd_tx, events_tx })
}

impl QueueHandle {
    /// Subscribes to queue events.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events_tx.subscribe()
    }

    /// Persists a new pending mutation and returns it without attempting
    /// delivery. Storage failure is returned here and nowhere else.
    pub async fn enqueue(
        &self,
        entity_id: impl Into<EntityId>,
        operation: Operation,
    ) -> Result<Mutation, QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Enqueue {
                entity_id: entity_id.into(),
                operation,
                resp: tx,
            })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)?
    }

    /// All non-synced mutations for one entity, in creation order.
    pub async fn active_by_entity(
        &self,
        entity_id: impl Into<EntityId>,
    ) -> Result<Vec<Mutation>, QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ActiveByEntity {
                entity_id: entity_id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)?
    }

    /// Every stored mutation, in creation order.
    pub async fn list_all(&self) -> Result<Vec<Mutation>, QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ListAll { resp: tx })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)?
    }

    /// Moves a conflict/failed mutation back to pending with a fresh
    /// attempt budget.
    pub async fn retry(&self, id: MutationId) -> Result<(), QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Retry { id, resp: tx })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)?
    }

    /// Permanently removes a conflict/failed mutation. Irreversible.
    pub async fn discard(&self, id: MutationId) -> Result<(), QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Discard { id, resp: tx })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)?
    }

    /// Feeds the platform connectivity signal; regaining connectivity
    /// triggers an immediate drain.
    pub async fn set_online(&self, online: bool) -> Result<(), QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SetOnline { online, resp: tx })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)
    }

    /// Triggers a drain pass without waiting for the interval timer.
    pub async fn sync_now(&self) -> Result<(), QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SyncNow { resp: tx })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)
    }

    /// Records an app-level lifecycle observation on the debug trail.
    pub async fn record_lifecycle(
        &self,
        category: LifecycleCategory,
        detail: impl Into<String>,
    ) -> Result<(), QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RecordLifecycle {
                category,
                detail: detail.into(),
                resp: tx,
            })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)
    }

    /// Snapshot of recorded lifecycle transitions, oldest first.
    pub async fn debug_trail(&self) -> Result<Vec<DebugEntry>, QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::DebugTrail { resp: tx })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)
    }

    /// Stops the runtime loop.
    pub async fn shutdown(&self) -> Result<(), QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| QueueError::ChannelClosed)?;
        rx.await.map_err(|_| QueueError::ChannelClosed)
    }
}

impl Engine {
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Enqueue {
                entity_id,
                operation,
                resp,
            } => {
                let mutation = Mutation {
                    id: self.next_id,
                    entity_id,
                    operation,
                    status: MutationStatus::Pending,
                    attempts: 0,
                    created_at_ms: now_ms(),
                };
                let res = match self.store.append(&mutation) {
                    Ok(()) => {
                        self.next_id += 1;
                        let _ = self.events_tx.send(QueueEvent::MutationQueued);
                        Ok(mutation)
                    }
                    Err(err) => Err(QueueError::Store(err)),
                };
                let accepted = res.is_ok();
                let _ = resp.send(res);
                if accepted {
                    self.pump();
                }
            }
            Command::ActiveByEntity { entity_id, resp } => {
                let res = self
                    .store
                    .list_by_entity(&entity_id)
                    .map(|all| all.into_iter().filter(|m| m.status.is_active()).collect())
                    .map_err(QueueError::from);
                let _ = resp.send(res);
            }
            Command::ListAll { resp } => {
                let _ = resp.send(self.store.list_all().map_err(QueueError::from));
            }
            Command::Retry { id, resp } => {
                let res = self.retry_mutation(id);
                let retried = res.is_ok();
                let _ = resp.send(res);
                if retried {
                    self.pump();
                }
            }
            Command::Discard { id, resp } => {
                let _ = resp.send(self.discard_mutation(id));
                self.pump();
            }
            Command::SetOnline { online, resp } => {
                if online != self.online {
                    self.online = online;
                    let detail = if online { "online" } else { "offline" };
                    self.trail.record(LifecycleCategory::Network, detail);
                    tracing::info!(online, "connectivity changed");
                    if online {
                        self.pump();
                    }
                }
                let _ = resp.send(());
            }
            Command::SyncNow { resp } => {
                self.pump();
                let _ = resp.send(());
            }
            Command::RecordLifecycle {
                category,
                detail,
                resp,
            } => {
                self.trail.record(category, detail);
                let _ = resp.send(());
            }
            Command::DebugTrail { resp } => {
                let _ = resp.send(self.trail.snapshot());
            }
            Command::Shutdown { resp } => {
                let _ = resp.send(());
                return true;
            }
        }

        false
    }

    fn retry_mutation(&mut self, id: MutationId) -> Result<(), QueueError> {
        let current = self.store.get(id)?.ok_or(QueueError::NotFound(id))?;
        if !current.status.is_terminal() {
            return Err(QueueError::NotRetryable(id));
        }
        self.store.update(id, MutationStatus::Pending, 0)?;
        self.not_before.remove(&id);
        Ok(())
    }

    fn discard_mutation(&mut self, id: MutationId) -> Result<(), QueueError> {
        let current = self.store.get(id)?.ok_or(QueueError::NotFound(id))?;
        if !current.status.is_terminal() {
            return Err(QueueError::NotDiscardable(id));
        }
        self.store.remove(id)?;
        self.not_before.remove(&id);
        Ok(())
    }

    /// Starts a delivery for every entity whose queue head is pending,
    /// deliverable, and not already in flight.
    fn pump(&mut self) {
        if !self.online {
            return;
        }

        let all = match self.store.list_all() {
            Ok(all) => all,
            Err(err) => {
                tracing::warn!(error = ?err, "queue scan failed");
                return;
            }
        };

        let now = Instant::now();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ready = Vec::new();
        for m in &all {
            // Only the head of each entity queue is eligible; a terminal
            // head blocks the entity so order is never violated.
            if !seen.insert(m.entity_id.as_str()) {
                continue;
            }
            if self.in_flight.contains(m.entity_id.as_str()) {
                continue;
            }
            if m.status != MutationStatus::Pending {
                continue;
            }
            if self.not_before.get(&m.id).is_some_and(|at| *at > now) {
                continue;
            }
            ready.push(m.clone());
        }

        for mutation in ready {
            self.start_delivery(mutation);
        }
    }

    fn start_delivery(&mut self, mutation: Mutation) {
        self.in_flight.insert(mutation.entity_id.clone());
        let transport = Arc::clone(&self.transport);
        let done_tx = self.done_tx.clone();

        tokio::spawn(async move {
            let id = mutation.id;
            let entity_id = mutation.entity_id;
            let operation = mutation.operation;
            let result =
                match tokio::task::spawn_blocking(move || transport.deliver(&operation)).await {
                    Ok(result) => result,
                    Err(err) => Err(TransportError::Message(format!("join error: {err}"))),
                };
            let _ = done_tx.send(DeliveryDone {
                id,
                entity_id,
                result,
            });
        });
    }

    fn finish_delivery(&mut self, done: DeliveryDone) {
        self.in_flight.remove(done.entity_id.as_str());
        self.not_before.remove(&done.id);

        // Re-read before acting; the mutation may have been discarded while
        // the attempt was in flight.
        let current = match self.store.get(done.id) {
            Ok(Some(m)) => m,
            Ok(None) => {
                self.pump();
                return;
            }
            Err(err) => {
                tracing::warn!(id = done.id, error = ?err, "store read failed after delivery");
                return;
            }
        };
        let attempts = current.attempts.saturating_add(1);

        match done.result {
            Ok(response) => match classify(&response) {
                Disposition::Synced => self.resolve_synced(done.id),
                Disposition::Conflict => self.resolve_conflict(done.id, attempts),
                Disposition::Retryable => self.schedule_retry(done.id, attempts),
            },
            Err(err) => {
                tracing::debug!(id = done.id, error = ?err, "transport failure");
                self.schedule_retry(done.id, attempts);
            }
        }

        self.pump();
    }

    fn resolve_synced(&mut self, id: MutationId) {
        match self.store.remove(id) {
            Ok(_) => {
                let _ = self.events_tx.send(QueueEvent::MutationSynced);
            }
            Err(err) => {
                tracing::warn!(id, error = ?err, "failed to remove synced mutation");
            }
        }
    }

    fn resolve_conflict(&mut self, id: MutationId, attempts: u32) {
        match self.store.update(id, MutationStatus::Conflict, attempts) {
            Ok(()) => {
                tracing::info!(id, "mutation conflicted with server state");
                let _ = self.events_tx.send(QueueEvent::MutationSynced);
            }
            Err(err) => {
                tracing::warn!(id, error = ?err, "failed to mark conflict");
            }
        }
    }

    fn schedule_retry(&mut self, id: MutationId, attempts: u32) {
        if self.backoff.exhausted(attempts) {
            match self.store.update(id, MutationStatus::Failed, attempts) {
                Ok(()) => {
                    tracing::warn!(id, attempts, "mutation failed after retry ceiling");
                    let _ = self.events_tx.send(QueueEvent::MutationSynced);
                }
                Err(err) => {
                    tracing::warn!(id, error = ?err, "failed to mark failure");
                }
            }
        } else {
            match self.store.update(id, MutationStatus::Pending, attempts) {
                Ok(()) => {
                    self.not_before
                        .insert(id, Instant::now() + self.backoff.delay_for(attempts));
                }
                Err(err) => {
                    tracing::warn!(id, error = ?err, "failed to record attempt");
                }
            }
        }
    }

    /// Next instant the loop should wake without external input: the
    /// earliest backoff deadline, bounded by the periodic rescan interval.
    /// Offline, there is nothing to wake for.
    fn next_wake(&self) -> Option<Instant> {
        if !self.online {
            return None;
        }
        let mut wake = Instant::now() + self.sync_interval;
        for at in self.not_before.values() {
            if *at < wake {
                wake = *at;
            }
        }
        Some(wake)
    }
}

async fn idle_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
