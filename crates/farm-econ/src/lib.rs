#![deny(warnings)]

//! Economic model: per-crop price history and the randomized price walk.
//!
//! This crate provides:
//! - The price-generation rule (`reference * (1 + r)`, rounded, then clamped)
//! - An append-only per-crop price history
//! - An engine that owns both plus the random source, which is injectable so
//!   tests can drive it deterministically

use farm_core::{CropCatalog, CropDefinition, CropKind, PricingConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

/// Errors produced by the economy engine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EconError {
    /// Price queried before the history was initialized.
    #[error("no price history for {0:?}; history was never initialized")]
    EmptyHistory(CropKind),
    /// History initialization may only run once per engine.
    #[error("price history already initialized")]
    AlreadyInitialized,
}

/// Generate one price sample for a crop.
///
/// Draws a change rate `r` uniformly from the crop's volatility bounds,
/// computes `reference * (1 + r)`, rounds to the nearest integer and clamps
/// to `[seed + floor_margin, round(reference * cap_multiple)]`. Never below 1.
///
/// Example:
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
/// let p = generate_price(catalog.get(CropKind::Carrot), &PricingConfig::default(), &mut rng);
/// assert!((110..=560).contains(&p));
pub fn generate_price<R: Rng + ?Sized>(
    crop: &CropDefinition,
    pricing: &PricingConfig,
    rng: &mut R,
) -> u32 {
    let (low, high) = crop.volatility.bounds();
    let rate: f64 = if low < high {
        rng.gen_range(low..=high)
    } else {
        low
    };
    let raw = (f64::from(crop.reference_price) * (1.0 + rate)).round();
    let floor = f64::from(pricing.price_floor(crop));
    let cap = f64::from(pricing.price_cap(crop));
    // Floor first so an (unvalidated) inverted band resolves to the cap.
    let clamped = raw.max(floor).min(cap);
    (clamped as u32).max(1)
}

/// Chronological price observations per crop kind. Append-only; the last
/// element of a series is the current price.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PriceHistory {
    series: [Vec<u32>; CropKind::COUNT],
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// All observations for a crop, oldest first.
    pub fn series(&self, kind: CropKind) -> &[u32] {
        &self.series[kind.index()]
    }

    pub fn len(&self, kind: CropKind) -> usize {
        self.series[kind.index()].len()
    }

    /// Last observation, if any.
    pub fn latest(&self, kind: CropKind) -> Option<u32> {
        self.series[kind.index()].last().copied()
    }

    /// True while no crop has any observation.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(Vec::is_empty)
    }

    fn push(&mut self, kind: CropKind, price: u32) {
        self.series[kind.index()].push(price);
    }
}

/// Owns per-crop price history and generates new prices on demand.
pub struct EconomyEngine<R = ChaCha8Rng> {
    catalog: CropCatalog,
    pricing: PricingConfig,
    history: PriceHistory,
    rng: R,
}

impl EconomyEngine<ChaCha8Rng> {
    /// Engine with a reproducible ChaCha stream.
    pub fn seeded(catalog: CropCatalog, pricing: PricingConfig, seed: u64) -> Self {
        Self::with_rng(catalog, pricing, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Engine seeded from OS entropy.
    pub fn from_entropy(catalog: CropCatalog, pricing: PricingConfig) -> Self {
        Self::with_rng(catalog, pricing, ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> EconomyEngine<R> {
    /// Engine drawing from the given random source. History starts empty.
    pub fn with_rng(catalog: CropCatalog, pricing: PricingConfig, rng: R) -> Self {
        Self {
            catalog,
            pricing,
            history: PriceHistory::new(),
            rng,
        }
    }

    /// Populate every crop's history with `seed_observations` independent
    /// samples. Must run exactly once, before any price query.
    pub fn initialize_history(&mut self) -> Result<(), EconError> {
        if !self.history.is_empty() {
            return Err(EconError::AlreadyInitialized);
        }
        for _ in 0..self.pricing.seed_observations {
            for kind in CropKind::ALL {
                let price = self.generate_price(kind);
                self.history.push(kind, price);
            }
        }
        debug!(
            observations = self.pricing.seed_observations,
            "price history initialized"
        );
        Ok(())
    }

    /// Fresh price sample for one crop kind; does not touch history.
    pub fn generate_price(&mut self, kind: CropKind) -> u32 {
        generate_price(self.catalog.get(kind), &self.pricing, &mut self.rng)
    }

    /// Append one new price per crop when `should_fluctuate`; otherwise
    /// leave history unchanged for this tick.
    pub fn advance(&mut self, should_fluctuate: bool) {
        if !should_fluctuate {
            return;
        }
        for kind in CropKind::ALL {
            let price = self.generate_price(kind);
            self.history.push(kind, price);
            debug!(crop = kind.id(), price, "price fluctuated");
        }
    }

    /// Last observed price for a crop.
    ///
    /// # Panics
    ///
    /// In debug builds, when queried before [`Self::initialize_history`].
    /// Release builds log and return [`EconError::EmptyHistory`].
    pub fn current_price(&self, kind: CropKind) -> Result<u32, EconError> {
        match self.history.latest(kind) {
            Some(price) => Ok(price),
            None => {
                error!(crop = kind.id(), "price queried before history initialization");
                if cfg!(debug_assertions) {
                    panic!("{kind:?} price queried before history initialization");
                }
                Err(EconError::EmptyHistory(kind))
            }
        }
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn catalog(&self) -> &CropCatalog {
        &self.catalog
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }
}
