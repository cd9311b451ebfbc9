// engine.rs - Async Conway's Game of Life engine with row coroutines
//
// Every state transition goes through one async mutex, so a manual step,
// a randomize or a paint never interleaves with a step of the run loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{debug, info, trace, warn};

use crate::config::LifeConfig;
use crate::error::{LifeError, Result};
use crate::grid::{Grid, GridId};
use crate::observe::{LifeObservable, LifeSnapshot};
use crate::rules;
use crate::topology::Topology;

/// Row coroutine: next generation of one row, read from a shared `previous`.
///
/// Yields after every cell so sibling rows make progress on the same worker.
async fn process_row(
    row_index: usize,
    previous: Arc<Grid>,
    topology: Topology,
) -> (usize, Vec<bool>) {
    let mut row = Vec::with_capacity(previous.width());
    for x in 0..previous.width() {
        let neighbours = rules::live_neighbours(&previous, x, row_index, topology);
        row.push(rules::next_state(previous[(x, row_index)], neighbours));
        tokio::task::yield_now().await;
    }
    (row_index, row)
}

struct LifeState {
    current: Option<Arc<Grid>>,
    previous: Option<Arc<Grid>>,
    generation: u64,
    topology: Topology,
    revision: u64,
    rng: StdRng,
}

struct Shared {
    state: AsyncMutex<LifeState>,
    running: AtomicBool,
    // true while a run loop task exists
    loop_alive: Mutex<bool>,
    updates: watch::Sender<LifeSnapshot>,
    config: LifeConfig,
    runtime: Handle,
}

/// Handle to a double-buffered life simulation.
///
/// Clones share the same simulation. The engine runs on the tokio runtime it
/// was created in; `start` and `stop` may be called from any thread.
#[derive(Clone)]
pub struct LifeEngine {
    shared: Arc<Shared>,
}

impl LifeEngine {
    pub fn new(grid: Option<Grid>) -> Result<Self> {
        Self::with_config(grid, LifeConfig::default())
    }

    /// Build an engine around `grid` (if any).
    ///
    /// Must be called inside a tokio runtime. Fails if the OS entropy source
    /// cannot seed the randomizer; there is no fallback seed.
    pub fn with_config(grid: Option<Grid>, config: LifeConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| LifeError::NoRuntime)?;
        if !(0.0..=1.0).contains(&config.random_density) {
            return Err(LifeError::Config {
                key: "random_density",
                value: config.random_density.to_string(),
            });
        }
        let rng = StdRng::from_rng(OsRng)?;

        let current = grid.map(Arc::new);
        let topology = config.topology;
        let (updates, _) = watch::channel(LifeSnapshot {
            current: current.clone(),
            previous: None,
            generation: 0,
            topology,
            revision: 0,
        });

        Ok(Self {
            shared: Arc::new(Shared {
                state: AsyncMutex::new(LifeState {
                    current,
                    previous: None,
                    generation: 0,
                    topology,
                    revision: 0,
                    rng,
                }),
                running: AtomicBool::new(false),
                loop_alive: Mutex::new(false),
                updates,
                config,
                runtime,
            }),
        })
    }

    pub fn config(&self) -> &LifeConfig {
        &self.shared.config
    }

    /// Install `grid` as generation 0. `None` stops the run loop instead.
    pub async fn set_current(&self, grid: Option<Grid>) {
        let Some(grid) = grid else {
            self.stop();
            return;
        };

        let mut state = self.shared.state.lock().await;
        info!(id = %grid.id(), width = grid.width(), height = grid.height(), "installing grid");
        state.current = Some(Arc::new(grid));
        state.generation = 0;
        self.shared.publish(&mut state);
    }

    /// Install a brand-new dead field of the configured size.
    ///
    /// Stops the run loop first; a fresh field starts paused.
    pub async fn new_field(&self) -> GridId {
        self.stop();
        let grid = Grid::new(self.shared.config.field_width, self.shared.config.field_height);
        let id = grid.id();
        self.set_current(Some(grid)).await;
        id
    }

    /// Begin stepping continuously until `stop`.
    ///
    /// Does nothing without a non-empty grid. Calling it while already running
    /// keeps the existing loop.
    pub fn start(&self) {
        if !self.shared.has_cells() {
            return;
        }

        let mut alive = self.shared.lock_loop();
        self.shared.running.store(true, Ordering::SeqCst);
        if !*alive {
            *alive = true;
            self.shared.runtime.spawn(run_loop(Arc::downgrade(&self.shared)));
            info!("life loop started");
        }
    }

    /// Ask the run loop to exit once its in-flight step completes.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            info!("life loop stopping");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// One generation, right now. Returns the new generation number, or
    /// `None` when no grid is installed.
    pub async fn step(&self) -> Option<u64> {
        self.shared.step().await
    }

    /// Replace the current grid with a random soup of the same field.
    ///
    /// The old grid becomes `previous`; the generation number is unchanged.
    pub async fn random(&self) -> Option<GridId> {
        let mut state = self.shared.state.lock().await;
        let source = state.current.clone()?;

        let density = self.shared.config.random_density;
        let mut next = (*source).clone();
        let rng = &mut state.rng;
        next.fill_with(|| rng.gen_bool(density));

        debug!(id = %next.id(), population = next.population(), "randomized grid");
        let id = next.id();
        state.previous = Some(source);
        state.current = Some(Arc::new(next));
        self.shared.publish(&mut state);
        Some(id)
    }

    /// Switch edge behaviour. Takes effect from the next step.
    pub async fn field(&self, topology: Topology) {
        let mut state = self.shared.state.lock().await;
        debug!(%topology, "field topology changed");
        state.topology = topology;
        self.shared.publish(&mut state);
    }

    /// Set one cell of the current grid, as a UI paint stroke would.
    ///
    /// Returns false when no grid is installed. Panics if `(x, y)` is outside
    /// the grid.
    pub async fn paint(&self, x: usize, y: usize, alive: bool) -> bool {
        let mut state = self.shared.state.lock().await;
        let Some(current) = state.current.as_mut() else {
            return false;
        };
        // published snapshots keep their own copy
        Arc::make_mut(current).set(x, y, alive);
        self.shared.publish(&mut state);
        true
    }
}

impl LifeObservable for LifeEngine {
    fn subscribe(&self) -> watch::Receiver<LifeSnapshot> {
        self.shared.updates.subscribe()
    }

    fn snapshot(&self) -> LifeSnapshot {
        self.shared.updates.borrow().clone()
    }

    fn current(&self) -> Option<Arc<Grid>> {
        self.shared.updates.borrow().current.clone()
    }

    fn previous(&self) -> Option<Arc<Grid>> {
        self.shared.updates.borrow().previous.clone()
    }

    fn generation_number(&self) -> u64 {
        self.shared.updates.borrow().generation
    }

    fn topology(&self) -> Topology {
        self.shared.updates.borrow().topology
    }
}

impl Shared {
    fn publish(&self, state: &mut LifeState) {
        state.revision += 1;
        self.updates.send_replace(LifeSnapshot {
            current: state.current.clone(),
            previous: state.previous.clone(),
            generation: state.generation,
            topology: state.topology,
            revision: state.revision,
        });
    }

    fn has_cells(&self) -> bool {
        self.updates
            .borrow()
            .current
            .as_ref()
            .is_some_and(|grid| !grid.is_empty())
    }

    fn lock_loop(&self) -> MutexGuard<'_, bool> {
        self.loop_alive.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Checked under the loop lock so a racing start() either sees the loop
    // alive and reuses it, or sees it gone and spawns a new one.
    fn keep_running(&self) -> bool {
        let mut alive = self.lock_loop();
        if self.running.load(Ordering::SeqCst) {
            true
        } else {
            *alive = false;
            false
        }
    }

    async fn step(&self) -> Option<u64> {
        let mut state = self.state.lock().await;
        let previous = state.current.clone()?;
        let topology = state.topology;

        // Spawn one coroutine per row against the same read-only previous
        let handles: Vec<_> = (0..previous.height())
            .map(|row| self.runtime.spawn(process_row(row, Arc::clone(&previous), topology)))
            .collect();

        let mut next = (*previous).clone();
        for handle in handles {
            let (row_index, completed_row) = match handle.await {
                Ok(done) => done,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                // runtime shutting down; leave the state as it was
                Err(_) => return None,
            };
            next.row_mut(row_index).copy_from_slice(&completed_row);
        }

        state.previous = Some(previous);
        state.current = Some(Arc::new(next));
        state.generation += 1;
        trace!(generation = state.generation, %topology, "stepped");
        self.publish(&mut state);
        Some(state.generation)
    }
}

// Clears the loop flag if the loop task dies without passing through
// keep_running, e.g. a row task panicked or the runtime dropped the task.
struct LoopGuard {
    shared: Weak<Shared>,
    armed: bool,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            let mut alive = shared.lock_loop();
            *alive = false;
            shared.running.store(false, Ordering::SeqCst);
            warn!("life loop aborted");
        }
    }
}

async fn run_loop(weak: Weak<Shared>) {
    let mut guard = LoopGuard { shared: weak.clone(), armed: true };
    loop {
        let Some(shared) = weak.upgrade() else {
            break;
        };
        if !shared.has_cells() {
            shared.running.store(false, Ordering::SeqCst);
        }
        if !shared.keep_running() {
            // keep_running already cleared the flag; a new loop may own it now
            guard.armed = false;
            break;
        }

        shared.step().await;
        let delay = shared.config.step_delay;
        drop(shared);
        tokio::time::sleep(delay).await;
    }
    debug!("life loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_a_runtime() {
        assert!(matches!(LifeEngine::new(None), Err(LifeError::NoRuntime)));
    }

    #[tokio::test]
    async fn rejects_bad_density() {
        let config = LifeConfig { random_density: 1.5, ..LifeConfig::default() };
        assert!(matches!(
            LifeEngine::with_config(None, config),
            Err(LifeError::Config { key: "random_density", .. })
        ));
    }

    #[tokio::test]
    async fn starts_with_installed_grid() {
        let grid: Grid = Grid::new(3, 3);
        let id = grid.id();
        let engine = LifeEngine::new(Some(grid)).unwrap();

        assert_eq!(engine.current().map(|g| g.id()), Some(id));
        assert!(engine.previous().is_none());
        assert_eq!(engine.generation_number(), 0);
        assert_eq!(engine.topology(), Topology::Wrapping);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn start_without_grid_is_a_no_op() {
        let engine = LifeEngine::new(None).unwrap();
        engine.start();
        assert!(!engine.is_running());

        engine.set_current(Some(Grid::new(0, 4))).await;
        engine.start();
        assert!(!engine.is_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn aborted_loop_can_be_restarted() {
        let engine = LifeEngine::new(Some(Grid::new(8, 8))).unwrap();
        *engine.shared.lock_loop() = true;
        engine.shared.running.store(true, Ordering::SeqCst);

        let weak = Arc::downgrade(&engine.shared);
        let previous = engine.current().unwrap();
        // row 99 of an 8x8 grid panics inside the row coroutine
        let died = tokio::spawn(async move {
            let _guard = LoopGuard { shared: weak, armed: true };
            process_row(99, previous, Topology::Bounded).await
        })
        .await;
        assert!(died.unwrap_err().is_panic());
        assert!(!*engine.shared.lock_loop());
        assert!(!engine.is_running());

        engine.start();
        assert!(*engine.shared.lock_loop());
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        engine.stop();
        assert!(engine.generation_number() > 0);
    }

    #[tokio::test]
    async fn disarmed_guard_leaves_flag_alone() {
        let engine = LifeEngine::new(Some(Grid::new(4, 4))).unwrap();
        *engine.shared.lock_loop() = true;
        drop(LoopGuard { shared: Arc::downgrade(&engine.shared), armed: false });
        assert!(*engine.shared.lock_loop());
    }

    #[tokio::test]
    async fn step_and_random_without_grid() {
        let engine = LifeEngine::new(None).unwrap();
        assert_eq!(engine.step().await, None);
        assert_eq!(engine.random().await, None);
        assert!(!engine.paint(0, 0, true).await);
        assert_eq!(engine.generation_number(), 0);
    }
}
