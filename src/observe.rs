//! Categorized lifecycle debug trail for diagnosing offline behavior.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;

/// Category of a recorded lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleCategory {
    /// Connectivity changes.
    Network,
    /// Route changes.
    Navigation,
    /// Auth state changes.
    Auth,
    /// Initialization and everything else.
    General,
}

impl LifecycleCategory {
    /// Stable label used in log output.
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleCategory::Network => "network",
            LifecycleCategory::Navigation => "navigation",
            LifecycleCategory::Auth => "auth",
            LifecycleCategory::General => "general",
        }
    }
}

/// One recorded transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry {
    /// Transition category.
    pub category: LifecycleCategory,
    /// New state after the transition.
    pub detail: String,
    /// Wall-clock time of the transition in milliseconds.
    pub ts_ms: u64,
}

/// Capped trail of lifecycle transitions with first-transition suppression.
///
/// The first observation per category establishes a baseline and is not
/// recorded; repeats of the current state are not transitions. Purely
/// diagnostic; nothing in the queue depends on it.
#[derive(Debug)]
pub struct DebugLog {
    baseline: HashMap<LifecycleCategory, String>,
    entries: VecDeque<DebugEntry>,
    capacity: usize,
}

impl DebugLog {
    /// Creates a trail retaining at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            baseline: HashMap::new(),
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Observes the current state for a category; returns whether a
    /// transition was recorded.
    pub fn record(&mut self, category: LifecycleCategory, detail: impl Into<String>) -> bool {
        let detail = detail.into();
        match self.baseline.get(&category) {
            None => {
                self.baseline.insert(category, detail);
                false
            }
            Some(current) if *current == detail => false,
            Some(_) => {
                self.baseline.insert(category, detail.clone());
                tracing::debug!(
                    category = category.as_str(),
                    detail = %detail,
                    "lifecycle transition"
                );
                if self.entries.len() == self.capacity {
                    self.entries.pop_front();
                }
                self.entries.push_back(DebugEntry {
                    category,
                    detail,
                    ts_ms: now_ms(),
                });
                true
            }
        }
    }

    /// Recorded transitions, oldest first.
    pub fn snapshot(&self) -> Vec<DebugEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained transitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no transition has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new(256)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
