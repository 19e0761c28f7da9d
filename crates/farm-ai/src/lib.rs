#![deny(warnings)]

//! Greedy autoplayer used by the headless CLI and benchmarks.
//!
//! Each month it harvests every ready plot, then fills the grid with the
//! crop that earns the most per month at today's prices, as long as that
//! crop can still be harvested before the run ends.

use farm_core::{CropKind, SelectionMode};
use farm_runtime::{
    AdvanceOutcome, Command, CommandOutcome, EndOfGameReport, Interaction, PriceQuote, Session,
    SessionError, ViewState,
};
use rand::Rng;
use tracing::debug;

/// Expected profit per month of growing one plot: higher is better.
pub fn utility(expected_price: u32, seed_price: u32, grow_months: u32) -> f32 {
    (expected_price as f32 - seed_price as f32) / grow_months.max(1) as f32
}

/// Best crop to plant this month, if any pays off before `last_harvest_month`.
pub fn pick_crop(view: &ViewState, last_harvest_month: Option<u32>) -> Option<&PriceQuote> {
    view.prices
        .iter()
        .filter(|q| last_harvest_month.map_or(true, |last| view.month + q.grow_months <= last))
        .filter(|q| q.current_price > q.seed_price)
        .max_by(|a, b| {
            utility(a.current_price, a.seed_price, a.grow_months)
                .total_cmp(&utility(b.current_price, b.seed_price, b.grow_months))
        })
}

fn switch_to(commands: &mut Vec<Command>, selection: &mut SelectionMode, target: SelectionMode) {
    if *selection == target {
        return;
    }
    match target {
        SelectionMode::Idle => commands.push(Command::ClearSelection),
        SelectionMode::Harvesting => commands.push(Command::SelectHarvest),
        SelectionMode::Planting(kind) => commands.push(Command::SelectSeed(kind)),
    }
    *selection = target;
}

/// Commands for one month, ending with [`Command::AdvanceMonth`].
pub fn plan_month(view: &ViewState, last_harvest_month: Option<u32>) -> Vec<Command> {
    if view.game_over {
        return vec![];
    }
    let mut commands = Vec::new();
    let mut selection = view.selection;

    let ready: Vec<usize> = view.ready_plots().collect();
    let mut budget = view.money;
    if !ready.is_empty() {
        switch_to(&mut commands, &mut selection, SelectionMode::Harvesting);
        for &index in &ready {
            if let Some(kind) = ready_kind(view, index) {
                budget += view.price_of(kind).map_or(0, |q| u64::from(q.current_price));
            }
            commands.push(Command::Interact(index));
        }
    }

    if let Some(quote) = pick_crop(view, last_harvest_month) {
        let affordable = (budget / u64::from(quote.seed_price)) as usize;
        let targets: Vec<usize> = view
            .empty_plots()
            .chain(ready.iter().copied())
            .take(affordable)
            .collect();
        if !targets.is_empty() {
            switch_to(&mut commands, &mut selection, SelectionMode::Planting(quote.kind));
            commands.extend(targets.into_iter().map(Command::Interact));
        }
    }

    commands.push(Command::AdvanceMonth);
    debug!(month = view.month, commands = commands.len(), "month planned");
    commands
}

fn ready_kind(view: &ViewState, index: usize) -> Option<CropKind> {
    match view.plots.get(index)? {
        farm_runtime::PlotView::Ready { kind } => Some(*kind),
        _ => None,
    }
}

/// Tally of one autoplayed month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonthSummary {
    /// Month the actions were taken in.
    pub month: u32,
    pub planted: u32,
    pub harvested: u32,
    pub spent: u64,
    pub revenue: u64,
    /// Money after the month advanced.
    pub money: u64,
    pub finished: Option<EndOfGameReport>,
}

/// Last month in which a crop can be harvested, or `None` for untimed runs.
pub fn last_harvest_month<R: Rng>(session: &Session<R>) -> Option<u32> {
    let config = session.config();
    config.timer_enabled.then_some(config.duration_months)
}

/// Plan and apply one month. Silent plot rejections are skipped.
pub fn play_month<R: Rng>(session: &mut Session<R>) -> Result<MonthSummary, SessionError> {
    let view = session.snapshot()?;
    let mut summary = MonthSummary {
        month: view.month,
        ..MonthSummary::default()
    };
    for command in plan_month(&view, last_harvest_month(session)) {
        match session.apply(command) {
            Ok(CommandOutcome::Interaction(Interaction::Planted(p))) => {
                summary.planted += 1;
                summary.spent += u64::from(p.cost);
            }
            Ok(CommandOutcome::Interaction(Interaction::Harvested(h))) => {
                summary.harvested += 1;
                summary.revenue += u64::from(h.price);
            }
            Ok(CommandOutcome::Advance(AdvanceOutcome::Finished(report))) => {
                summary.finished = Some(report);
            }
            Ok(_) => {}
            Err(e) if !e.should_notify() => {}
            Err(e) => return Err(e),
        }
    }
    summary.money = session.money();
    Ok(summary)
}

/// Autoplay until the run ends or `max_months` months have been played,
/// calling `on_month` after each one.
pub fn play_session<R: Rng>(
    session: &mut Session<R>,
    max_months: u32,
    mut on_month: impl FnMut(&MonthSummary),
) -> Result<EndOfGameReport, SessionError> {
    for _ in 0..max_months {
        let summary = play_month(session)?;
        on_month(&summary);
        if let Some(report) = summary.finished {
            return Ok(report);
        }
    }
    Ok(session.report())
}
