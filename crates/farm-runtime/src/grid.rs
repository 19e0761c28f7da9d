//! Farm grid and the per-plot plant/grow/harvest state machine.
//!
//! A plot is either empty or holds a crop with the month it was planted.
//! Growth is never stored: readiness is recomputed from the current month.

use farm_core::{CropCatalog, CropDefinition, CropKind};
use farm_econ::{EconError, EconomyEngine};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Rejections from plot transitions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FarmError {
    #[error("plot {index} is out of range (grid has {len} plots)")]
    PlotOutOfRange { index: usize, len: usize },
    #[error("plot {0} is already planted")]
    PlotOccupied(usize),
    #[error("plot {0} is empty")]
    PlotEmpty(usize),
    #[error("plot {index} needs {remaining} more month(s)")]
    NotReady { index: usize, remaining: i64 },
    #[error("not enough money: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error(transparent)]
    Econ(#[from] EconError),
}

impl FarmError {
    /// Plot-state rejections arise routinely from drag-repeated input and
    /// are dropped without notifying the player.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            FarmError::PlotOutOfRange { .. }
                | FarmError::PlotOccupied(_)
                | FarmError::PlotEmpty(_)
                | FarmError::NotReady { .. }
        )
    }
}

/// A crop in the ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantedCrop {
    pub kind: CropKind,
    /// Month counter value when the seed went in.
    pub planted_month: u32,
}

/// One grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Plot {
    #[default]
    Empty,
    Occupied(PlantedCrop),
}

impl Plot {
    pub fn crop(&self) -> Option<&PlantedCrop> {
        match self {
            Plot::Empty => None,
            Plot::Occupied(c) => Some(c),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Plot::Empty)
    }
}

/// Derived growth view of a planted plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub ready: bool,
    /// `planted_month + grow_months - current_month`; zero or negative once ready.
    pub remaining: i64,
}

/// Readiness of a planted crop at `current_month`.
pub fn readiness(crop: &PlantedCrop, definition: &CropDefinition, current_month: u32) -> Readiness {
    let remaining = i64::from(crop.planted_month) + i64::from(definition.grow_months)
        - i64::from(current_month);
    Readiness {
        ready: remaining <= 0,
        remaining,
    }
}

/// Result of a successful plant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Planted {
    pub index: usize,
    pub kind: CropKind,
    pub cost: u32,
}

/// Result of a successful harvest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Harvested {
    pub index: usize,
    pub kind: CropKind,
    pub price: u32,
}

/// Fixed-size square grid of plots, indexed row-major from 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FarmGrid {
    side: usize,
    plots: Vec<Plot>,
}

impl FarmGrid {
    /// Empty `side` x `side` grid. `side` is bounded by config validation
    /// (see [`farm_core::MAX_PLOTS`]).
    pub fn new(side: usize) -> Self {
        Self {
            side,
            plots: vec![Plot::Empty; side * side],
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Plot> {
        self.plots.get(index)
    }

    pub fn plots(&self) -> &[Plot] {
        &self.plots
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Plot, FarmError> {
        let len = self.plots.len();
        self.plots
            .get_mut(index)
            .ok_or(FarmError::PlotOutOfRange { index, len })
    }

    /// Plant `crop` on an empty plot, debiting its seed price from `money`.
    ///
    /// Both preconditions are checked before either write, so a rejection
    /// leaves money and grid untouched.
    pub fn plant(
        &mut self,
        index: usize,
        crop: &CropDefinition,
        current_month: u32,
        money: &mut u64,
    ) -> Result<Planted, FarmError> {
        let slot = self.slot_mut(index)?;
        if !slot.is_empty() {
            return Err(FarmError::PlotOccupied(index));
        }
        let cost = u64::from(crop.seed_price);
        if *money < cost {
            return Err(FarmError::InsufficientFunds {
                needed: cost,
                available: *money,
            });
        }
        *money -= cost;
        *slot = Plot::Occupied(PlantedCrop {
            kind: crop.kind,
            planted_month: current_month,
        });
        debug!(index, crop = crop.kind.id(), cost, "planted");
        Ok(Planted {
            index,
            kind: crop.kind,
            cost: crop.seed_price,
        })
    }

    /// Harvest a ready plot, crediting `money` with the crop's current
    /// market price, and clear it.
    pub fn harvest<R: Rng>(
        &mut self,
        index: usize,
        catalog: &CropCatalog,
        economy: &EconomyEngine<R>,
        current_month: u32,
        money: &mut u64,
    ) -> Result<Harvested, FarmError> {
        let slot = self.slot_mut(index)?;
        let crop = *slot.crop().ok_or(FarmError::PlotEmpty(index))?;
        let state = readiness(&crop, catalog.get(crop.kind), current_month);
        if !state.ready {
            return Err(FarmError::NotReady {
                index,
                remaining: state.remaining,
            });
        }
        let price = economy.current_price(crop.kind)?;
        *money = money.saturating_add(u64::from(price));
        *slot = Plot::Empty;
        debug!(index, crop = crop.kind.id(), price, "harvested");
        Ok(Harvested {
            index,
            kind: crop.kind,
            price,
        })
    }
}
