//! # smartswitchd: smart switch daemon
//!
//! Composition root that wires the switch core to virtual adapters and
//! drives it.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the tracing subscriber
//! - Seed the behaviour storage and construct the adapters
//! - Construct the switch controller, injecting adapters via port traits
//! - Drive evaluations from a periodic tick and from stdin commands
//! - Log published switch events
//! - Stop on end of input or Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod command;
mod config;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use smartswitch_adapter_virtual::{InMemoryBehaviourStorage, SystemClock, VirtualSwitch};
use smartswitch_app::event_bus::InProcessEventBus;
use smartswitch_app::ports::{BehaviourStorage, Clock, EventPublisher, SwitchDriver};
use smartswitch_app::switch_controller::{SwitchController, SwitchInput};

use crate::command::Command;
use crate::config::Config;

fn run_command<S, C, D, P>(controller: &mut SwitchController<S, C, D, P>, line: &str)
where
    S: BehaviourStorage,
    C: Clock,
    D: SwitchDriver,
    P: EventPublisher,
{
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(err) => {
            warn!(error = %err, "ignoring command");
            return;
        }
    };
    match command {
        Command::Input(input) => match controller.handle(input) {
            Ok(intensity) => info!(%intensity, "command applied"),
            Err(err) => warn!(error = %err, "command rejected"),
        },
        Command::Forget(slot) => match controller.clear_behaviour(slot) {
            Ok(outcome) => {
                info!(%slot, persisted = outcome.persisted, "behaviour forgotten");
                controller.evaluate();
            }
            Err(err) => warn!(error = %err, "command rejected"),
        },
        Command::Status => {
            let state = controller.state();
            info!(
                intensity = %controller.applied(),
                overridden = state.overridden,
                behaviour_governed = state.behaviour_governed,
                occupied = %controller.presence().occupied(),
                behaviours = controller.behaviours().store().len(),
                fingerprint = controller.behaviours().store().fingerprint(),
                "status"
            );
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.logging.filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Adapters
    let storage = InMemoryBehaviourStorage::with_entries(config.seed_behaviours()?);
    let switch = Arc::new(VirtualSwitch::default());
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let mut events = event_bus.subscribe();

    // Switch core
    let mut controller = SwitchController::new(
        storage,
        SystemClock,
        Arc::clone(&switch),
        Arc::clone(&event_bus),
        config.controller_settings()?,
    );
    let intensity = controller.evaluate();
    info!(
        behaviours = controller.behaviours().store().len(),
        %intensity,
        "smartswitchd started"
    );

    let mut ticker = tokio::time::interval(config.tick_interval());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = controller.handle(SwitchInput::Tick) {
                    warn!(error = %err, "tick failed");
                }
            }
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => run_command(&mut controller, &line),
                None => break,
            },
            Ok(event) = events.recv() => {
                info!(event = %serde_json::to_string(&event)?, "switch event");
            }
            _ = &mut shutdown => break,
        }
    }

    info!(intensity = %switch.intensity(), "smartswitchd stopped");
    Ok(())
}
