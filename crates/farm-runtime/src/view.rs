//! Read-only projections handed to the presentation layer.

use farm_core::{CropKind, Season, SelectionMode};
use serde::Serialize;

/// Everything a renderer may read about a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewState {
    pub money: u64,
    pub month: u32,
    pub season: Season,
    pub selection: SelectionMode,
    pub game_over: bool,
    /// True during the last scheduled month of a timed run.
    pub is_final_month: bool,
    pub grid_side: usize,
    /// One quote per crop kind, in catalog order.
    pub prices: Vec<PriceQuote>,
    /// One entry per plot, row-major.
    pub plots: Vec<PlotView>,
}

impl ViewState {
    pub fn price_of(&self, kind: CropKind) -> Option<&PriceQuote> {
        self.prices.iter().find(|q| q.kind == kind)
    }

    /// Indices of plots that can be harvested right now.
    pub fn ready_plots(&self) -> impl Iterator<Item = usize> + '_ {
        self.plots
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p, PlotView::Ready { .. }))
            .map(|(i, _)| i)
    }

    pub fn empty_plots(&self) -> impl Iterator<Item = usize> + '_ {
        self.plots
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p, PlotView::Empty))
            .map(|(i, _)| i)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceQuote {
    pub kind: CropKind,
    pub label: String,
    pub mark: String,
    pub seed_price: u32,
    pub current_price: u32,
    pub grow_months: u32,
}

/// Derived display state of one plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlotView {
    Empty,
    Growing { kind: CropKind, remaining: u32 },
    Ready { kind: CropKind },
}

/// Price history laid out for a line chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceChart {
    /// X-axis labels, oldest first; the last is always "now".
    pub labels: Vec<String>,
    pub series: Vec<PriceSeries>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceSeries {
    pub kind: CropKind,
    pub label: String,
    pub color: String,
    pub points: Vec<u32>,
}

/// Months between two consecutive chart points.
pub const CHART_STEP_MONTHS: usize = 2;

/// Labels counting back from "now" in steps of [`CHART_STEP_MONTHS`].
pub fn chart_labels(points: usize) -> Vec<String> {
    (0..points)
        .map(|i| match (points - 1 - i) * CHART_STEP_MONTHS {
            0 => "now".to_string(),
            months => format!("{months} months ago"),
        })
        .collect()
}

/// Final tally shown when a timed run ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EndOfGameReport {
    pub duration_months: u32,
    pub starting_money: u64,
    pub final_money: u64,
    /// `final_money - starting_money`; negative on a losing run.
    pub profit: i64,
}

impl EndOfGameReport {
    pub fn new(duration_months: u32, starting_money: u64, final_money: u64) -> Self {
        let profit = i64::try_from(final_money)
            .unwrap_or(i64::MAX)
            .saturating_sub(i64::try_from(starting_money).unwrap_or(i64::MAX));
        Self {
            duration_months,
            starting_money,
            final_money,
            profit,
        }
    }
}
