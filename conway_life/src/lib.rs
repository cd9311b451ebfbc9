//! Conway's Game of Life simulation core.
//!
//! A [`Grid`] holds the cells; a [`LifeEngine`] owns the current/previous
//! pair, the generation counter and the field [`Topology`], and steps the
//! grid one generation at a time or continuously on a tokio runtime. Views
//! follow the engine through [`LifeObservable::subscribe`].

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod observe;
pub mod patterns;
pub mod rules;
pub mod topology;

pub use config::LifeConfig;
pub use engine::LifeEngine;
pub use error::{LifeError, Result};
pub use grid::{Grid, GridId};
pub use observe::{GridChange, LifeObservable, LifeSnapshot};
pub use patterns::Pattern;
pub use topology::Topology;
