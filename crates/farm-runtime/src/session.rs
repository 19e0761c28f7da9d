//! Session controller: money, month, selection mode and end-of-run gating.
//!
//! Every mutation of a run goes through [`Session`]. Each call runs to
//! completion synchronously, so repeated plot interactions from a held
//! pointer are rejected by plot state rather than double-applied.

use farm_core::{validate_config, CropKind, FarmConfig, Season, SelectionMode, ValidationError};
use farm_econ::{EconError, EconomyEngine};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::grid::{readiness, FarmError, FarmGrid, Harvested, Planted, Plot};
use crate::view::{chart_labels, EndOfGameReport, PlotView, PriceChart, PriceQuote, PriceSeries, ViewState};

/// Errors surfaced by session entry points.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// The run has ended; only the report remains.
    #[error("the game is over")]
    GameOver,
    #[error(transparent)]
    Farm(#[from] FarmError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
    #[error(transparent)]
    Econ(#[from] EconError),
}

impl SessionError {
    /// Whether the player should be told about this rejection.
    pub fn should_notify(&self) -> bool {
        match self {
            SessionError::Farm(e) => !e.is_silent(),
            _ => true,
        }
    }
}

/// Input commands accepted by a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Command {
    SelectSeed(CropKind),
    SelectHarvest,
    ClearSelection,
    Interact(usize),
    AdvanceMonth,
}

/// What a plot interaction did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Interaction {
    /// No mode selected.
    Ignored,
    Planted(Planted),
    Harvested(Harvested),
}

/// Result of a month-advance request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AdvanceOutcome {
    Advanced {
        month: u32,
        season: Season,
        prices_changed: bool,
    },
    /// Terminal signal; repeated on every call once the run is over.
    Finished(EndOfGameReport),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CommandOutcome {
    Selection(SelectionMode),
    Interaction(Interaction),
    Advance(AdvanceOutcome),
}

/// Prices fluctuate when the month counter lands on an odd value.
pub fn fluctuates_in(month: u32) -> bool {
    month % 2 == 1
}

/// One single-player run: owns money, month and selection, and mediates
/// every change to the farm grid and price history.
pub struct Session<R = ChaCha8Rng> {
    config: FarmConfig,
    economy: EconomyEngine<R>,
    grid: FarmGrid,
    money: u64,
    month: u32,
    selection: SelectionMode,
    game_over: bool,
}

impl Session<ChaCha8Rng> {
    /// Start a run, seeding prices from `config.rng_seed` or OS entropy.
    pub fn new(config: FarmConfig) -> Result<Self, SessionError> {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Session<R> {
    /// Start a run drawing prices from `rng`.
    pub fn with_rng(config: FarmConfig, rng: R) -> Result<Self, SessionError> {
        validate_config(&config)?;
        let mut economy = EconomyEngine::with_rng(config.crops.clone(), config.pricing.clone(), rng);
        economy.initialize_history()?;
        info!(
            plots = config.plot_count(),
            money = config.starting_money,
            months = config.duration_months,
            "session started"
        );
        Ok(Self {
            grid: FarmGrid::new(config.grid_side),
            money: config.starting_money,
            month: 1,
            selection: SelectionMode::Idle,
            game_over: false,
            economy,
            config,
        })
    }

    pub fn money(&self) -> u64 {
        self.money
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn season(&self) -> Season {
        Season::for_month(self.month)
    }

    pub fn selection(&self) -> SelectionMode {
        self.selection
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_final_month(&self) -> bool {
        self.config.timer_enabled && self.month == self.config.duration_months
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    pub fn grid(&self) -> &FarmGrid {
        &self.grid
    }

    pub fn economy(&self) -> &EconomyEngine<R> {
        &self.economy
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        if self.game_over {
            return Err(SessionError::GameOver);
        }
        Ok(())
    }

    /// Toggle planting mode for `kind`; any other mode is cleared first.
    pub fn select_seed(&mut self, kind: CropKind) -> Result<SelectionMode, SessionError> {
        self.ensure_running()?;
        self.selection = match self.selection {
            SelectionMode::Planting(k) if k == kind => SelectionMode::Idle,
            _ => SelectionMode::Planting(kind),
        };
        Ok(self.selection)
    }

    /// Toggle harvesting mode; any planting selection is cleared first.
    pub fn select_harvest_mode(&mut self) -> Result<SelectionMode, SessionError> {
        self.ensure_running()?;
        self.selection = match self.selection {
            SelectionMode::Harvesting => SelectionMode::Idle,
            _ => SelectionMode::Harvesting,
        };
        Ok(self.selection)
    }

    pub fn clear_selection(&mut self) -> Result<SelectionMode, SessionError> {
        self.ensure_running()?;
        self.selection = SelectionMode::Idle;
        Ok(self.selection)
    }

    /// Plant or harvest `index` according to the current selection.
    /// The selection survives a successful plant so a drag can plant a row.
    pub fn handle_plot_interaction(&mut self, index: usize) -> Result<Interaction, SessionError> {
        self.ensure_running()?;
        let result = match self.selection {
            SelectionMode::Idle => return Ok(Interaction::Ignored),
            SelectionMode::Planting(kind) => self
                .grid
                .plant(index, self.config.crops.get(kind), self.month, &mut self.money)
                .map(Interaction::Planted),
            SelectionMode::Harvesting => self
                .grid
                .harvest(
                    index,
                    &self.config.crops,
                    &self.economy,
                    self.month,
                    &mut self.money,
                )
                .map(Interaction::Harvested),
        };
        match result {
            Ok(done) => Ok(done),
            Err(e) => {
                if e.is_silent() {
                    debug!(index, error = %e, "plot interaction ignored");
                } else {
                    warn!(index, error = %e, "plot interaction rejected");
                }
                Err(e.into())
            }
        }
    }

    /// Move to the next month.
    ///
    /// Advancing past the configured duration ends the run before any price
    /// moves or the selection resets. From then on every call returns the
    /// same report without touching money, month or grid.
    pub fn advance_month(&mut self) -> AdvanceOutcome {
        if self.game_over {
            return AdvanceOutcome::Finished(self.report());
        }
        self.month += 1;
        if self.config.timer_enabled && self.month > self.config.duration_months {
            self.game_over = true;
            let report = self.report();
            info!(money = report.final_money, profit = report.profit, "game over");
            return AdvanceOutcome::Finished(report);
        }
        let prices_changed = fluctuates_in(self.month);
        self.economy.advance(prices_changed);
        self.selection = SelectionMode::Harvesting;
        let season = self.season();
        info!(
            month = self.month,
            season = season.label(),
            prices_changed,
            money = self.money,
            "month advanced"
        );
        AdvanceOutcome::Advanced {
            month: self.month,
            season,
            prices_changed,
        }
    }

    /// Dispatch a command to the matching entry point.
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, SessionError> {
        match command {
            Command::SelectSeed(kind) => self.select_seed(kind).map(CommandOutcome::Selection),
            Command::SelectHarvest => self.select_harvest_mode().map(CommandOutcome::Selection),
            Command::ClearSelection => self.clear_selection().map(CommandOutcome::Selection),
            Command::Interact(index) => self
                .handle_plot_interaction(index)
                .map(CommandOutcome::Interaction),
            Command::AdvanceMonth => Ok(CommandOutcome::Advance(self.advance_month())),
        }
    }

    pub fn report(&self) -> EndOfGameReport {
        EndOfGameReport::new(
            self.config.duration_months,
            self.config.starting_money,
            self.money,
        )
    }

    /// Read-only projection of the session for rendering.
    pub fn snapshot(&self) -> Result<ViewState, SessionError> {
        let prices = self
            .config
            .crops
            .iter()
            .map(|crop| -> Result<PriceQuote, EconError> {
                Ok(PriceQuote {
                    kind: crop.kind,
                    label: crop.label.clone(),
                    mark: crop.mark.clone(),
                    seed_price: crop.seed_price,
                    current_price: self.economy.current_price(crop.kind)?,
                    grow_months: crop.grow_months,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let plots = self
            .grid
            .plots()
            .iter()
            .map(|plot| match plot {
                Plot::Empty => PlotView::Empty,
                Plot::Occupied(crop) => {
                    let state = readiness(crop, self.config.crops.get(crop.kind), self.month);
                    if state.ready {
                        PlotView::Ready { kind: crop.kind }
                    } else {
                        PlotView::Growing {
                            kind: crop.kind,
                            remaining: u32::try_from(state.remaining).unwrap_or(u32::MAX),
                        }
                    }
                }
            })
            .collect();
        Ok(ViewState {
            money: self.money,
            month: self.month,
            season: self.season(),
            selection: self.selection,
            game_over: self.game_over,
            is_final_month: self.is_final_month(),
            grid_side: self.grid.side(),
            prices,
            plots,
        })
    }

    /// Full price history as chart series.
    pub fn price_chart(&self) -> PriceChart {
        let history = self.economy.history();
        let points = history.len(CropKind::ALL[0]);
        let series = self
            .config
            .crops
            .iter()
            .map(|crop| PriceSeries {
                kind: crop.kind,
                label: crop.label.clone(),
                color: crop.color.clone(),
                points: history.series(crop.kind).to_vec(),
            })
            .collect();
        PriceChart {
            labels: chart_labels(points),
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn session(seed: u64) -> Session {
        Session::new(FarmConfig {
            rng_seed: Some(seed),
            ..FarmConfig::default()
        })
        .unwrap()
    }

    fn advance_n<R: rand::Rng>(s: &mut Session<R>, n: u32) {
        for _ in 0..n {
            assert!(matches!(s.advance_month(), AdvanceOutcome::Advanced { .. }));
        }
    }

    #[test]
    fn starts_idle_in_spring_with_full_grid() {
        let s = session(1);
        assert_eq!(s.money(), 1000);
        assert_eq!(s.month(), 1);
        assert_eq!(s.season(), Season::Spring);
        assert_eq!(s.selection(), SelectionMode::Idle);
        assert_eq!(s.grid().len(), 100);
        let view = s.snapshot().unwrap();
        assert_eq!(view.prices.len(), 4);
        assert_eq!(view.empty_plots().count(), 100);
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = FarmConfig {
            grid_side: 0,
            ..FarmConfig::default()
        };
        assert_eq!(
            Session::new(cfg).err(),
            Some(SessionError::Config(ValidationError::EmptyGrid))
        );
    }

    #[test]
    fn selection_toggles_and_is_exclusive() {
        let mut s = session(1);
        assert_eq!(
            s.select_seed(CropKind::Carrot).unwrap(),
            SelectionMode::Planting(CropKind::Carrot)
        );
        assert_eq!(
            s.select_seed(CropKind::Onion).unwrap(),
            SelectionMode::Planting(CropKind::Onion)
        );
        assert_eq!(s.select_harvest_mode().unwrap(), SelectionMode::Harvesting);
        assert_eq!(s.select_harvest_mode().unwrap(), SelectionMode::Idle);
        s.select_seed(CropKind::Tomato).unwrap();
        assert_eq!(s.select_seed(CropKind::Tomato).unwrap(), SelectionMode::Idle);
        s.select_harvest_mode().unwrap();
        assert_eq!(s.clear_selection().unwrap(), SelectionMode::Idle);
    }

    #[test]
    fn idle_interaction_is_noop() {
        let mut s = session(1);
        assert_eq!(s.handle_plot_interaction(0).unwrap(), Interaction::Ignored);
        assert_eq!(s.money(), 1000);
        assert!(s.grid().get(0).unwrap().is_empty());
    }

    #[test]
    fn double_click_plants_once() {
        let mut s = session(2);
        s.select_seed(CropKind::Carrot).unwrap();
        s.handle_plot_interaction(12).unwrap();
        let err = s.handle_plot_interaction(12).unwrap_err();
        assert_eq!(err, SessionError::Farm(FarmError::PlotOccupied(12)));
        assert!(!err.should_notify());
        assert_eq!(s.money(), 900);
        assert_eq!(s.selection(), SelectionMode::Planting(CropKind::Carrot));
    }

    #[test]
    fn insufficient_funds_notifies() {
        let mut s = Session::new(FarmConfig {
            starting_money: 40,
            rng_seed: Some(1),
            ..FarmConfig::default()
        })
        .unwrap();
        s.select_seed(CropKind::Lettuce).unwrap();
        let err = s.handle_plot_interaction(0).unwrap_err();
        assert!(err.should_notify());
        assert_eq!(s.money(), 40);
        assert!(s.grid().get(0).unwrap().is_empty());
    }

    #[test]
    fn early_harvest_fails_then_succeeds_at_current_price() {
        let mut s = session(3);
        s.select_seed(CropKind::Tomato).unwrap();
        s.handle_plot_interaction(0).unwrap();
        s.select_harvest_mode().unwrap();
        assert_eq!(
            s.handle_plot_interaction(0),
            Err(SessionError::Farm(FarmError::NotReady {
                index: 0,
                remaining: 3
            }))
        );
        assert_eq!(s.money(), 880);

        advance_n(&mut s, 2);
        assert!(s.handle_plot_interaction(0).is_err());
        advance_n(&mut s, 1);
        assert_eq!(s.month(), 4);
        // Month 3 fluctuated, so the sale uses a price generated after planting.
        assert_eq!(s.economy().history().len(CropKind::Tomato), 8);
        let price_now = s.economy().current_price(CropKind::Tomato).unwrap();
        assert_eq!(s.selection(), SelectionMode::Harvesting);
        let done = s.handle_plot_interaction(0).unwrap();
        assert_eq!(
            done,
            Interaction::Harvested(Harvested {
                index: 0,
                kind: CropKind::Tomato,
                price: price_now
            })
        );
        assert_eq!(s.money(), 1000 - 120 + u64::from(price_now));
        assert!(s.grid().get(0).unwrap().is_empty());
        assert_eq!(
            s.handle_plot_interaction(0),
            Err(SessionError::Farm(FarmError::PlotEmpty(0)))
        );
    }

    #[test]
    fn month_advance_defaults_to_harvest_and_fluctuates_on_odd_months() {
        let mut s = session(4);
        s.select_seed(CropKind::Carrot).unwrap();
        assert_eq!(
            s.advance_month(),
            AdvanceOutcome::Advanced {
                month: 2,
                season: Season::Spring,
                prices_changed: false
            }
        );
        assert_eq!(s.selection(), SelectionMode::Harvesting);
        assert_eq!(s.economy().history().len(CropKind::Carrot), 7);
        assert_eq!(
            s.advance_month(),
            AdvanceOutcome::Advanced {
                month: 3,
                season: Season::Spring,
                prices_changed: true
            }
        );
        assert_eq!(s.economy().history().len(CropKind::Carrot), 8);
        advance_n(&mut s, 1);
        assert_eq!(s.season(), Season::Summer);
    }

    #[test]
    fn twelfth_advance_ends_the_run() {
        let mut s = session(5);
        s.select_seed(CropKind::Lettuce).unwrap();
        s.handle_plot_interaction(3).unwrap();
        for call in 1..=11 {
            assert!(
                matches!(s.advance_month(), AdvanceOutcome::Advanced { .. }),
                "call {call} should advance"
            );
            assert!(!s.is_game_over());
        }
        assert_eq!(s.month(), 12);
        assert!(s.is_final_month());

        let money = s.money();
        let grid = s.grid().clone();
        let history = s.economy().history().clone();
        s.select_seed(CropKind::Onion).unwrap();
        let first = s.advance_month();
        assert!(s.is_game_over());
        assert_eq!(
            first,
            AdvanceOutcome::Finished(EndOfGameReport::new(12, 1000, money))
        );
        assert_eq!(s.month(), 13);
        // No price push or selection reset on the closing call.
        assert_eq!(s.economy().history(), &history);
        assert_eq!(s.selection(), SelectionMode::Planting(CropKind::Onion));
        for _ in 0..3 {
            assert_eq!(s.advance_month(), first);
        }
        assert_eq!(s.month(), 13);
        assert_eq!(s.money(), money);
        assert_eq!(s.grid(), &grid);
        assert_eq!(s.handle_plot_interaction(3), Err(SessionError::GameOver));
        assert_eq!(s.handle_plot_interaction(4), Err(SessionError::GameOver));
        assert_eq!(s.select_harvest_mode(), Err(SessionError::GameOver));
        assert!(s.snapshot().unwrap().game_over);
    }

    #[test]
    fn final_month_flag() {
        let mut s = session(6);
        advance_n(&mut s, 10);
        assert!(!s.is_final_month());
        advance_n(&mut s, 1);
        assert_eq!(s.month(), 12);
        assert!(s.snapshot().unwrap().is_final_month);
    }

    #[test]
    fn untimed_run_never_ends() {
        let mut s = Session::new(FarmConfig {
            timer_enabled: false,
            rng_seed: Some(7),
            ..FarmConfig::default()
        })
        .unwrap();
        advance_n(&mut s, 40);
        assert_eq!(s.month(), 41);
        assert!(!s.is_game_over());
        assert!(!s.is_final_month());
    }

    #[test]
    fn snapshot_reports_readiness() {
        let mut s = session(8);
        s.select_seed(CropKind::Onion).unwrap();
        s.handle_plot_interaction(1).unwrap();
        s.select_seed(CropKind::Lettuce).unwrap();
        s.handle_plot_interaction(2).unwrap();
        advance_n(&mut s, 1);
        let view = s.snapshot().unwrap();
        assert_eq!(
            view.plots[1],
            PlotView::Growing {
                kind: CropKind::Onion,
                remaining: 3
            }
        );
        assert_eq!(view.plots[2], PlotView::Ready { kind: CropKind::Lettuce });
        assert_eq!(view.ready_plots().collect::<Vec<_>>(), vec![2]);
        assert_eq!(
            view.price_of(CropKind::Onion).unwrap().current_price,
            s.economy().current_price(CropKind::Onion).unwrap()
        );
    }

    #[test]
    fn chart_tracks_history() {
        let mut s = session(9);
        advance_n(&mut s, 3);
        let chart = s.price_chart();
        assert_eq!(chart.labels.len(), 8);
        assert_eq!(chart.labels.last().map(String::as_str), Some("now"));
        assert_eq!(chart.series.len(), 4);
        assert!(chart.series.iter().all(|p| p.points.len() == 8));
    }

    #[test]
    fn apply_dispatches_commands() {
        let mut s = session(10);
        assert_eq!(
            s.apply(Command::SelectSeed(CropKind::Lettuce)).unwrap(),
            CommandOutcome::Selection(SelectionMode::Planting(CropKind::Lettuce))
        );
        assert!(matches!(
            s.apply(Command::Interact(0)).unwrap(),
            CommandOutcome::Interaction(Interaction::Planted(_))
        ));
        assert!(matches!(
            s.apply(Command::AdvanceMonth).unwrap(),
            CommandOutcome::Advance(AdvanceOutcome::Advanced { month: 2, .. })
        ));
        assert!(matches!(
            s.apply(Command::Interact(0)).unwrap(),
            CommandOutcome::Interaction(Interaction::Harvested(_))
        ));
    }

    proptest! {
        #[test]
        fn month_never_passes_duration_while_running(seed in any::<u64>(), duration in 1u32..30, calls in 0u32..40) {
            let mut s = Session::new(FarmConfig {
                duration_months: duration,
                rng_seed: Some(seed),
                ..FarmConfig::default()
            })
            .unwrap();
            for _ in 0..calls {
                let outcome = s.advance_month();
                prop_assert!(!(s.month() > duration && !s.is_game_over()));
                prop_assert_eq!(
                    matches!(outcome, AdvanceOutcome::Finished(_)),
                    s.is_game_over()
                );
            }
            prop_assert_eq!(s.is_game_over(), calls >= duration);
        }

        #[test]
        fn plant_then_failed_harvest_costs_seed(seed in any::<u64>(), kind_idx in 0usize..4, plot in 0usize..100) {
            let kind = CropKind::ALL[kind_idx];
            let mut s = session(seed);
            let cost = u64::from(s.config().crops.get(kind).seed_price);
            s.select_seed(kind).unwrap();
            s.handle_plot_interaction(plot).unwrap();
            s.select_harvest_mode().unwrap();
            prop_assert!(s.handle_plot_interaction(plot).is_err());
            prop_assert_eq!(s.money(), 1000 - cost);
        }

        #[test]
        fn full_cycle_conserves_funds(seed in any::<u64>(), kind_idx in 0usize..4) {
            let kind = CropKind::ALL[kind_idx];
            let mut s = session(seed);
            let grow = s.config().crops.get(kind).grow_months;
            let cost = u64::from(s.config().crops.get(kind).seed_price);
            s.select_seed(kind).unwrap();
            s.handle_plot_interaction(0).unwrap();
            for _ in 0..grow {
                s.advance_month();
            }
            let sale = s.economy().current_price(kind).unwrap();
            prop_assert!(s.handle_plot_interaction(0).is_ok());
            prop_assert_eq!(s.money(), 1000 - cost + u64::from(sale));
        }
    }
}
