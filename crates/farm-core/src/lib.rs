#![deny(warnings)]

//! Core domain models and invariants for Harvest Market.
//!
//! This crate defines the serializable types shared by the economy, the farm
//! and the session controller, with validation helpers to guarantee basic
//! invariants before a session is built from them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds of crops a player can plant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropKind {
    /// Fast grower with a lopsided price walk.
    Lettuce,
    Carrot,
    Tomato,
    Onion,
}

impl CropKind {
    /// Number of crop kinds.
    pub const COUNT: usize = 4;

    /// Every crop kind in catalog order.
    pub const ALL: [CropKind; CropKind::COUNT] = [
        CropKind::Lettuce,
        CropKind::Carrot,
        CropKind::Tomato,
        CropKind::Onion,
    ];

    /// Position of this kind inside [`CropKind::ALL`] and [`CropCatalog`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable lowercase identifier, e.g. "lettuce".
    pub fn id(self) -> &'static str {
        match self {
            CropKind::Lettuce => "lettuce",
            CropKind::Carrot => "carrot",
            CropKind::Tomato => "tomato",
            CropKind::Onion => "onion",
        }
    }
}

/// Bounds of the random change rate applied on each price generation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Volatility {
    /// Rate drawn uniformly from `[-spread, +spread]`.
    Symmetric { spread: f64 },
    /// Rate drawn uniformly from `[min, max]`, an interval not centered on zero.
    Asymmetric { min: f64, max: f64 },
}

impl Volatility {
    /// Inclusive `(low, high)` change-rate interval.
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Volatility::Symmetric { spread } => (-spread, spread),
            Volatility::Asymmetric { min, max } => (min, max),
        }
    }

    pub fn is_asymmetric(&self) -> bool {
        matches!(self, Volatility::Asymmetric { .. })
    }
}

/// Static definition of one crop kind. Immutable for the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropDefinition {
    /// Kind this definition describes.
    pub kind: CropKind,
    /// Cost to plant one plot.
    pub seed_price: u32,
    /// Baseline sale price the random walk perturbs around.
    pub reference_price: u32,
    /// Months from planting until the plot is ready.
    pub grow_months: u32,
    /// Change-rate bounds for price generation.
    pub volatility: Volatility,
    /// Display name.
    pub label: String,
    /// Display glyph.
    pub mark: String,
    /// Chart color (CSS color string).
    pub color: String,
}

impl CropDefinition {
    fn new(
        kind: CropKind,
        seed_price: u32,
        reference_price: u32,
        grow_months: u32,
        volatility: Volatility,
        display: (&str, &str, &str),
    ) -> Self {
        let (label, mark, color) = display;
        Self {
            kind,
            seed_price,
            reference_price,
            grow_months,
            volatility,
            label: label.to_string(),
            mark: mark.to_string(),
            color: color.to_string(),
        }
    }
}

/// Direct mapping from [`CropKind`] to its [`CropDefinition`].
///
/// Slot `i` always holds the definition for `CropKind::ALL[i]`;
/// [`validate_catalog`] checks this for catalogs loaded from config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropCatalog {
    pub crops: [CropDefinition; CropKind::COUNT],
}

impl CropCatalog {
    /// The four crops of the standard game.
    pub fn standard() -> Self {
        Self {
            crops: [
                CropDefinition::new(
                    CropKind::Lettuce,
                    50,
                    160,
                    1,
                    Volatility::Asymmetric {
                        min: -0.50,
                        max: 0.35,
                    },
                    ("Lettuce", "🥬", "rgba(50, 205, 50, 0.8)"),
                ),
                CropDefinition::new(
                    CropKind::Carrot,
                    100,
                    280,
                    2,
                    Volatility::Symmetric { spread: 0.10 },
                    ("Carrot", "🥕", "rgba(255, 140, 0, 0.8)"),
                ),
                CropDefinition::new(
                    CropKind::Tomato,
                    120,
                    450,
                    3,
                    Volatility::Symmetric { spread: 0.35 },
                    ("Tomato", "🍅", "rgba(220, 20, 60, 0.8)"),
                ),
                CropDefinition::new(
                    CropKind::Onion,
                    150,
                    550,
                    4,
                    Volatility::Symmetric { spread: 0.10 },
                    ("Onion", "🧅", "rgba(100, 149, 237, 0.8)"),
                ),
            ],
        }
    }

    pub fn get(&self, kind: CropKind) -> &CropDefinition {
        &self.crops[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropDefinition> {
        self.crops.iter()
    }
}

impl Default for CropCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Four-valued season label, three months each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

/// Month-of-year to season table; index is `(month - 1) % 12`.
pub const SEASON_TABLE: [Season; 12] = [
    Season::Spring,
    Season::Spring,
    Season::Spring,
    Season::Summer,
    Season::Summer,
    Season::Summer,
    Season::Autumn,
    Season::Autumn,
    Season::Autumn,
    Season::Winter,
    Season::Winter,
    Season::Winter,
];

impl Season {
    /// Season for a 1-based month counter; wraps every 12 months.
    pub fn for_month(month: u32) -> Season {
        SEASON_TABLE[(month.saturating_sub(1) % 12) as usize]
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

/// What a plot interaction currently does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "crop", rename_all = "snake_case")]
pub enum SelectionMode {
    /// Plot interactions are ignored.
    #[default]
    Idle,
    /// Plot interactions plant the given crop.
    Planting(CropKind),
    /// Plot interactions harvest ready plots.
    Harvesting,
}

/// Parameters of the price-generation rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Observations generated per crop when history is initialized.
    pub seed_observations: usize,
    /// Floor is `seed_price + floor_margin`.
    pub floor_margin: u32,
    /// Cap is `reference_price * cap_multiple`, rounded.
    pub cap_multiple: f64,
}

impl PricingConfig {
    /// Lowest price a crop may be generated at.
    pub fn price_floor(&self, crop: &CropDefinition) -> u32 {
        crop.seed_price.saturating_add(self.floor_margin)
    }

    /// Highest price a crop may be generated at.
    pub fn price_cap(&self, crop: &CropDefinition) -> u32 {
        (f64::from(crop.reference_price) * self.cap_multiple).round() as u32
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            seed_observations: 7,
            floor_margin: 10,
            cap_multiple: 2.0,
        }
    }
}

/// Session configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// Side length of the square grid (default: 10 for 100 plots).
    pub grid_side: usize,
    /// Money at the start of the run.
    pub starting_money: u64,
    /// Months in a run before the game ends.
    pub duration_months: u32,
    /// When false the run never ends.
    pub timer_enabled: bool,
    /// Seed for deterministic prices; entropy when absent.
    pub rng_seed: Option<u64>,
    pub pricing: PricingConfig,
    pub crops: CropCatalog,
}

impl FarmConfig {
    /// Total number of plots on the grid.
    pub fn plot_count(&self) -> usize {
        self.grid_side.saturating_mul(self.grid_side)
    }
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            grid_side: 10,
            starting_money: 1000,
            duration_months: 12,
            timer_enabled: true,
            rng_seed: None,
            pricing: PricingConfig::default(),
            crops: CropCatalog::standard(),
        }
    }
}

/// Upper bound on plots per grid.
pub const MAX_PLOTS: usize = 1 << 16;

/// Validation errors for configuration invariants.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Grid must hold at least one plot.
    #[error("grid side must be > 0")]
    EmptyGrid,
    /// Grid holds more than [`MAX_PLOTS`] plots.
    #[error("grid side {0} exceeds the plot limit")]
    GridTooLarge(usize),
    /// A run must last at least one month.
    #[error("duration must be at least one month")]
    ZeroDuration,
    /// History needs at least the current observation.
    #[error("at least one seed price observation is required")]
    NoSeedObservations,
    /// Cap multiple must be finite and >= 1.
    #[error("invalid cap multiple: {0}")]
    InvalidCapMultiple(f64),
    /// Catalog slot holds the wrong crop kind.
    #[error("catalog slot {slot} holds {found:?}, expected {expected:?}")]
    CatalogMismatch {
        slot: usize,
        expected: CropKind,
        found: CropKind,
    },
    /// Seed price must be strictly positive.
    #[error("{0:?}: seed price must be > 0")]
    ZeroSeedPrice(CropKind),
    /// Crops take at least one month to grow.
    #[error("{0:?}: grow duration must be >= 1 month")]
    ZeroGrowDuration(CropKind),
    /// Change rates must be finite, > -1, and ordered.
    #[error("{0:?}: invalid volatility bounds")]
    InvalidVolatility(CropKind),
    /// Exactly one crop kind carries the asymmetric walk.
    #[error("expected exactly one asymmetric crop, found {0}")]
    AsymmetricCount(usize),
    /// Price floor sits above the cap.
    #[error("{kind:?}: price floor {floor} exceeds cap {cap}")]
    EmptyPriceBand { kind: CropKind, floor: u32, cap: u32 },
}

/// Validate a crop definition's own fields.
pub fn validate_crop(crop: &CropDefinition) -> Result<(), ValidationError> {
    if crop.seed_price == 0 {
        return Err(ValidationError::ZeroSeedPrice(crop.kind));
    }
    if crop.grow_months == 0 {
        return Err(ValidationError::ZeroGrowDuration(crop.kind));
    }
    let ok = match crop.volatility {
        Volatility::Symmetric { spread } => spread.is_finite() && (0.0..1.0).contains(&spread),
        Volatility::Asymmetric { min, max } => {
            min.is_finite() && max.is_finite() && min > -1.0 && min < max
        }
    };
    if !ok {
        return Err(ValidationError::InvalidVolatility(crop.kind));
    }
    Ok(())
}

/// Validate that the catalog maps every kind to its own definition.
pub fn validate_catalog(catalog: &CropCatalog) -> Result<(), ValidationError> {
    for (slot, (crop, expected)) in catalog.crops.iter().zip(CropKind::ALL).enumerate() {
        if crop.kind != expected {
            return Err(ValidationError::CatalogMismatch {
                slot,
                expected,
                found: crop.kind,
            });
        }
        validate_crop(crop)?;
    }
    let asymmetric = catalog
        .iter()
        .filter(|c| c.volatility.is_asymmetric())
        .count();
    if asymmetric != 1 {
        return Err(ValidationError::AsymmetricCount(asymmetric));
    }
    Ok(())
}

/// Validate pricing parameters against every crop in the catalog.
pub fn validate_pricing(
    pricing: &PricingConfig,
    catalog: &CropCatalog,
) -> Result<(), ValidationError> {
    if pricing.seed_observations == 0 {
        return Err(ValidationError::NoSeedObservations);
    }
    if !pricing.cap_multiple.is_finite() || pricing.cap_multiple < 1.0 {
        return Err(ValidationError::InvalidCapMultiple(pricing.cap_multiple));
    }
    for crop in catalog.iter() {
        let floor = pricing.price_floor(crop);
        let cap = pricing.price_cap(crop);
        if floor > cap {
            return Err(ValidationError::EmptyPriceBand {
                kind: crop.kind,
                floor,
                cap,
            });
        }
    }
    Ok(())
}

/// Validate the full configuration, including pricing against the catalog.
pub fn validate_config(config: &FarmConfig) -> Result<(), ValidationError> {
    if config.grid_side == 0 {
        return Err(ValidationError::EmptyGrid);
    }
    match config.grid_side.checked_mul(config.grid_side) {
        Some(plots) if plots <= MAX_PLOTS => {}
        _ => return Err(ValidationError::GridTooLarge(config.grid_side)),
    }
    if config.duration_months == 0 {
        return Err(ValidationError::ZeroDuration);
    }
    validate_catalog(&config.crops)?;
    validate_pricing(&config.pricing, &config.crops)?;
    Ok(())
}
