#![deny(warnings)]

//! Runtime for a Harvest Market run: the farm grid state machine, the
//! session controller that owns money and the month counter, and the
//! read-only views handed to whatever renders the game.

pub mod grid;
pub mod session;
pub mod view;

pub use grid::{readiness, FarmError, FarmGrid, Harvested, PlantedCrop, Planted, Plot, Readiness};
pub use session::{
    fluctuates_in, AdvanceOutcome, Command, CommandOutcome, Interaction, Session, SessionError,
};
pub use view::{
    chart_labels, EndOfGameReport, PlotView, PriceChart, PriceQuote, PriceSeries, ViewState,
    CHART_STEP_MONTHS,
};
