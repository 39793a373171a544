//! RoFrame — a Roon "now playing" picture frame
//!
//! Shows a slideshow of local images on an always-on display and switches
//! to the current album art whenever the tracked Roon zone plays.

use anyhow::Result;
use rofbridge::{BridgeServerExt, EventsState, ZoneBridge};
use rofconfig::{FrameSettings, SettingsStore};
use rofdisplay::{DisplayPower, DisplaySupervisor, PlaybackSource, XsetDisplay};
use rofroon::{RoonAdapter, RoonConfigExt};
use rofserver::ServerBuilder;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

mod pages;
mod reload;
mod routes;
mod setup;

use reload::ReloadHandle;
use routes::AppState;

enum Outcome {
    Reload,
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    rofserver::init_logging();
    info!("Starting RoFrame");

    // Settings are applied by rebuilding the whole instance from a fresh
    // snapshot rather than restarting the process
    loop {
        match run_instance().await? {
            Outcome::Reload => {
                info!("Applying new settings...");
            }
            Outcome::Shutdown => break,
        }
    }

    info!("RoFrame stopped");
    Ok(())
}

async fn run_instance() -> Result<Outcome> {
    // ========== PHASE 1 : settings snapshot ==========

    let store = Arc::new(SettingsStore::open("")?);
    store.migrate_legacy()?;
    let settings = Arc::new(FrameSettings::from_store(&store));

    let base_url = rofutils::guess_local_ip();
    let mut server =
        ServerBuilder::new("RoFrame", base_url.as_str(), settings.host.as_str(), settings.port)
            .build();
    let reload = ReloadHandle::new(server.shutdown_token());

    // ========== PHASE 2 : pairing mode ==========

    if !store.has_pairing_credential() {
        info!("No Roon credential found, serving the pairing flow");

        let state = AppState {
            store: store.clone(),
            settings: settings.clone(),
            base_url: base_url.clone(),
            adapter: None,
            bridge: None,
            reload: reload.clone(),
        };
        routes::register_setup_mode(&mut server, state).await;

        server.start().await;
        server.wait().await;

        return Ok(outcome(&reload));
    }

    // ========== PHASE 3 : connected mode ==========

    let adapter = RoonAdapter::new(store.clone(), settings.zone_name.clone());
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    if !adapter.connect(events_tx).await {
        anyhow::bail!("Unable to connect to Roon");
    }
    info!(zone = %settings.zone_name, "Connected to Roon");

    let power = Arc::new(DisplayPower::new(
        settings.display_control,
        Box::new(XsetDisplay),
    ));
    let bridge = Arc::new(ZoneBridge::new(
        adapter.clone(),
        power.clone(),
        settings.image_size,
    ));
    tokio::spawn(bridge.clone().run(events_rx));

    let scheduler = DisplaySupervisor::new(
        bridge.clone() as Arc<dyn PlaybackSource>,
        power.clone(),
        settings.display_on_hour,
        settings.display_off_hour,
    );

    let state = AppState {
        store: store.clone(),
        settings: settings.clone(),
        base_url: base_url.clone(),
        adapter: Some(adapter.clone()),
        bridge: Some(bridge.clone()),
        reload: reload.clone(),
    };
    routes::register_frame_mode(&mut server, state).await;
    server
        .init_events_api(EventsState {
            bridge: bridge.clone(),
            scheduler: scheduler.clone(),
        })
        .await;

    server.start().await;
    info!("RoFrame is ready");
    server.wait().await;

    scheduler.stop();
    adapter.shutdown();

    Ok(outcome(&reload))
}

fn outcome(reload: &ReloadHandle) -> Outcome {
    if reload.reload_requested() {
        Outcome::Reload
    } else {
        Outcome::Shutdown
    }
}
