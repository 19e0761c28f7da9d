#![deny(warnings)]

//! Headless ECS adapter over a farm session.
//!
//! Pointer input arrives as `PlayerInput` events; one system applies them to
//! the session resource and another mirrors the latest view into the HUD.

use anyhow::Result;
use bevy_ecs::prelude::*;
use farm_core::{CropKind, FarmConfig};
use farm_runtime::{
    AdvanceOutcome, Command, CommandOutcome, EndOfGameReport, Session, SessionError, ViewState,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Resource)]
struct FarmSession(Session);

#[derive(Event, Clone, Copy, Debug)]
struct PlayerInput(Command);

#[derive(Resource, Default)]
struct HudState {
    view: Option<ViewState>,
    notice: Option<String>,
    report: Option<EndOfGameReport>,
}

fn apply_player_input(
    mut inputs: EventReader<PlayerInput>,
    mut session: ResMut<FarmSession>,
    mut hud: ResMut<HudState>,
) {
    for PlayerInput(command) in inputs.read() {
        match session.0.apply(*command) {
            Ok(CommandOutcome::Advance(AdvanceOutcome::Finished(report))) => {
                hud.report = Some(report);
            }
            Ok(_) => {}
            // Drag-repeated plot hits are expected; only surface the rest.
            Err(e) if e.should_notify() => hud.notice = Some(e.to_string()),
            Err(_) => {}
        }
    }
}

fn refresh_hud(session: Res<FarmSession>, mut hud: ResMut<HudState>) {
    if !session.is_changed() {
        return;
    }
    match session.0.snapshot() {
        Ok(view) => hud.view = Some(view),
        Err(e) => hud.notice = Some(e.to_string()),
    }
}

fn build_world(config: FarmConfig) -> Result<(World, Schedule), SessionError> {
    let mut world = World::new();
    world.insert_resource(FarmSession(Session::new(config)?));
    world.insert_resource(HudState::default());
    world.init_resource::<Events<PlayerInput>>();
    let mut schedule = Schedule::default();
    schedule.add_systems((apply_player_input, refresh_hud).chain());
    Ok((world, schedule))
}

/// Queue `inputs`, run one frame and retire the frame's events.
fn frame(world: &mut World, schedule: &mut Schedule, inputs: &[Command]) {
    world
        .resource_mut::<Events<PlayerInput>>()
        .extend(inputs.iter().copied().map(PlayerInput));
    schedule.run(world);
    world.resource_mut::<Events<PlayerInput>>().update();
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (mut world, mut schedule) = build_world(FarmConfig::default())?;

    // A drag across the first row, passing over each plot twice.
    let mut drag = vec![Command::SelectSeed(CropKind::Lettuce)];
    for index in 0..10 {
        drag.push(Command::Interact(index));
        drag.push(Command::Interact(index));
    }
    frame(&mut world, &mut schedule, &drag);
    frame(&mut world, &mut schedule, &[Command::AdvanceMonth]);
    let harvest: Vec<Command> = (0..10).map(Command::Interact).collect();
    frame(&mut world, &mut schedule, &harvest);

    let hud = world.resource::<HudState>();
    if let Some(view) = &hud.view {
        info!(month = view.month, money = view.money, "frame rendered");
        println!(
            "game-frontend: HUD ready | month={} season={} money={} ready={}",
            view.month,
            view.season.label(),
            view.money,
            view.ready_plots().count()
        );
    }
    Ok(())
}
