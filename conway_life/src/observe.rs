// observe.rs - Published engine state and the subscription contract

use std::sync::Arc;

use tokio::sync::watch;

use crate::grid::{Grid, GridId};
use crate::topology::Topology;

/// Everything a view needs to redraw, as of one engine update.
#[derive(Debug, Clone, Default)]
pub struct LifeSnapshot {
    pub current: Option<Arc<Grid>>,
    pub previous: Option<Arc<Grid>>,
    pub generation: u64,
    pub topology: Topology,
    /// Bumped on every publish.
    pub revision: u64,
}

/// How the current grid of one snapshot relates to an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridChange {
    /// Same grid object, nothing to redraw.
    Unchanged,
    /// Same logical grid with new cell contents.
    Evolved,
    /// A different grid appeared, or the grid went away.
    Replaced,
}

impl LifeSnapshot {
    pub fn current_id(&self) -> Option<GridId> {
        self.current.as_ref().map(|grid| grid.id())
    }

    pub fn change_since(&self, earlier: &LifeSnapshot) -> GridChange {
        match (&earlier.current, &self.current) {
            (None, None) => GridChange::Unchanged,
            (Some(before), Some(after)) if Arc::ptr_eq(before, after) => GridChange::Unchanged,
            (Some(before), Some(after)) if before.id() == after.id() => GridChange::Evolved,
            _ => GridChange::Replaced,
        }
    }
}

/// Read side of the engine: subscribe for updates, or read the latest values.
pub trait LifeObservable {
    fn subscribe(&self) -> watch::Receiver<LifeSnapshot>;

    fn snapshot(&self) -> LifeSnapshot {
        self.subscribe().borrow().clone()
    }

    fn current(&self) -> Option<Arc<Grid>> {
        self.subscribe().borrow().current.clone()
    }

    fn previous(&self) -> Option<Arc<Grid>> {
        self.subscribe().borrow().previous.clone()
    }

    fn generation_number(&self) -> u64 {
        self.subscribe().borrow().generation
    }

    fn topology(&self) -> Topology {
        self.subscribe().borrow().topology
    }
}
