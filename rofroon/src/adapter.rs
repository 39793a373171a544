//! Roon adapter: discovery, registration, zone table, cover art
//!
//! Registration and connection are split on purpose: registration is a
//! rare, human-supervised, blocking ceremony; connection is the fast,
//! automatable path run on every process start.

use crate::config_ext::RoonConfigExt;
use crate::error::{Error, Result};
use crate::zone::{ConnectionState, ZoneView};
use rofconfig::SettingsStore;
use roon_api::{
    CoreEvent, Parsed, RoonApi, RoonState, Services, Svc, info,
    image::{Args as ImageArgs, Format as ImageFormat, Image, Scale, Scaling},
    status::{self, Status},
    transport::Transport,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// How long discovery may stay silent before "no core" is reported
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll cadence while `connect()` waits for the paired core to answer
const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const CONNECT_POLL_TRIES: u32 = 60;

/// Upper bound on a single cover-art request
const COVER_TIMEOUT: Duration = Duration::from_secs(10);

const QUEUE_SUBSCRIBE_COUNT: u32 = 100;

/// Events forwarded to the bridge, decoupled from the SDK types
#[derive(Debug, Clone)]
pub enum VendorEvent {
    /// The tracked zone's queue changed; carries the canonical payload
    /// (`{"items": [...]}` shape)
    QueueChanged(serde_json::Value),
    /// Some zone on the core changed (zones added, updated or removed)
    ZonesChanged,
}

/// Cover art bytes as delivered by the core's image service
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Default)]
struct AdapterState {
    core_name: Option<String>,
    zones: HashMap<String, ZoneView>,
    transport: Option<Transport>,
    image: Option<Image>,
    /// request id -> (image key, reply slot)
    pending_covers: HashMap<usize, (String, oneshot::Sender<CoverImage>)>,
    queue_subscribed: bool,
}

/// Adapter around one Roon core session
///
/// Cheap to clone; all clones share the same session state. At most one
/// live session exists per adapter instance.
#[derive(Clone)]
pub struct RoonAdapter {
    store: Arc<SettingsStore>,
    zone_name: String,
    connection: Arc<Mutex<ConnectionState>>,
    state: Arc<RwLock<AdapterState>>,
    shutdown: CancellationToken,
}

impl RoonAdapter {
    pub fn new(store: Arc<SettingsStore>, zone_name: impl Into<String>) -> Self {
        Self {
            store,
            zone_name: zone_name.into(),
            connection: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            state: Arc::new(RwLock::new(AdapterState::default())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Existence check of the persisted credential, no network call
    pub fn check_auth(&self) -> bool {
        self.store.has_pairing_credential()
    }

    pub fn is_connected(&self) -> bool {
        *self.connection.lock().unwrap() == ConnectionState::Connected
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.lock().unwrap()
    }

    /// The zone this instance mirrors
    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }

    /// Ends the session; the adapter cannot be reconnected afterwards
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Connects to the paired core and wires the event subscriptions
    ///
    /// Requires the persisted pairing triple. Returns `false` — leaving the
    /// caller to decide what happens next — when a precondition is missing
    /// or when the paired core does not answer discovery within the window.
    /// On success the zone subscription (core-wide) and the queue
    /// subscription (tracked zone) feed `events`, and the connection state
    /// is `Connected`.
    pub async fn connect(&self, events: mpsc::UnboundedSender<VendorEvent>) -> bool {
        if self.zone_name.trim().is_empty() {
            tracing::warn!("No zone configured, cannot connect");
            return false;
        }
        if !self.check_auth() {
            tracing::warn!("No pairing credential, run the pairing flow first");
            return false;
        }

        self.set_connection(ConnectionState::Connecting);
        tokio::spawn(run_session(self.clone(), events));

        for _ in 0..CONNECT_POLL_TRIES {
            if self.is_connected() {
                return true;
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(CONNECT_POLL_INTERVAL) => {}
            }
        }

        tracing::warn!("Paired Roon core not found on the network");
        self.shutdown.cancel();
        self.set_connection(ConnectionState::Disconnected);
        false
    }

    /// Current normalized zone table
    pub async fn zone_table(&self) -> Vec<ZoneView> {
        self.state.read().await.zones.values().cloned().collect()
    }

    /// Display names of all visible zones, sorted
    pub async fn zone_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .read()
            .await
            .zones
            .values()
            .map(|z| z.display_name.clone())
            .collect();
        names.sort();
        names
    }

    /// The tracked zone, if present in the current table
    pub async fn tracked_zone(&self) -> Option<ZoneView> {
        self.state
            .read()
            .await
            .zones
            .values()
            .find(|z| z.display_name == self.zone_name)
            .cloned()
    }

    pub async fn core_name(&self) -> Option<String> {
        self.state.read().await.core_name.clone()
    }

    /// Fetches square cover art through the core's image service
    pub async fn fetch_cover(&self, image_key: &str, size: u32) -> Result<CoverImage> {
        let (tx, rx) = oneshot::channel();

        let req_id = {
            let mut state = self.state.write().await;
            let image = state.image.as_ref().ok_or(Error::NotConnected)?;

            let scaling = Scaling::new(Scale::Fit, size, size);
            let args = ImageArgs::new(Some(scaling), Some(ImageFormat::Jpeg));
            let Some(req_id) = image.get_image(image_key, args).await else {
                return Err(Error::CoverUnavailable("request could not be sent".into()));
            };

            state
                .pending_covers
                .insert(req_id, (image_key.to_string(), tx));
            req_id
        };

        match tokio::time::timeout(COVER_TIMEOUT, rx).await {
            Ok(Ok(cover)) => Ok(cover),
            Ok(Err(_)) => {
                self.state.write().await.pending_covers.remove(&req_id);
                Err(Error::CoverUnavailable("request dropped".into()))
            }
            Err(_) => {
                self.state.write().await.pending_covers.remove(&req_id);
                Err(Error::CoverUnavailable("request timed out".into()))
            }
        }
    }

    fn set_connection(&self, value: ConnectionState) {
        *self.connection.lock().unwrap() = value;
    }

    async fn handle_core_event(&self, event: CoreEvent) {
        match event {
            CoreEvent::Found(mut core) => {
                tracing::info!(
                    core = %core.display_name,
                    version = %core.display_version,
                    "Roon core found"
                );

                if let Some(status) = core.get_status() {
                    let message = format!("Showing zone: {}", self.zone_name);
                    status.set_status(message, false).await;
                }

                let transport = core.get_transport().cloned();
                let image = core.get_image().cloned();
                if let Some(transport) = &transport {
                    transport.subscribe_zones().await;
                }

                let mut state = self.state.write().await;
                state.core_name = Some(core.display_name.clone());
                state.transport = transport;
                state.image = image;
                drop(state);

                self.set_connection(ConnectionState::Connected);
            }
            CoreEvent::Lost(core) => {
                tracing::warn!(
                    core = %core.display_name,
                    "Roon core lost; a restart is required to reconnect"
                );

                let mut state = self.state.write().await;
                state.zones.clear();
                state.transport = None;
                state.image = None;
                state.queue_subscribed = false;
                drop(state);

                self.set_connection(ConnectionState::Disconnected);
            }
            _ => {}
        }
    }

    async fn handle_parsed(&self, parsed: Parsed, events: &mpsc::UnboundedSender<VendorEvent>) {
        match parsed {
            Parsed::RoonState(roon_state) => self.persist_credentials(&roon_state),
            Parsed::Zones(zones) => {
                {
                    let mut state = self.state.write().await;
                    for zone in &zones {
                        state
                            .zones
                            .insert(zone.zone_id.clone(), ZoneView::from_roon(zone));
                    }
                }
                self.subscribe_tracked_queue().await;
                let _ = events.send(VendorEvent::ZonesChanged);
            }
            Parsed::ZonesRemoved(zone_ids) => {
                {
                    let mut state = self.state.write().await;
                    for zone_id in zone_ids {
                        if let Some(removed) = state.zones.remove(&zone_id) {
                            tracing::debug!(zone = %removed.display_name, "Zone removed");
                            if removed.display_name == self.zone_name {
                                state.queue_subscribed = false;
                            }
                        }
                    }
                }
                let _ = events.send(VendorEvent::ZonesChanged);
            }
            // Seek ticks arrive every second; they are not zone changes
            Parsed::ZonesSeek(_) => {}
            Parsed::Queue(items) => {
                let payload = json!({
                    "items": items
                        .iter()
                        .map(|item| json!({
                            "queue_item_id": item.queue_item_id,
                            "length": item.length,
                            "image_key": item.image_key,
                            "three_line": {
                                "line1": item.three_line.line1,
                                "line2": item.three_line.line2,
                                "line3": item.three_line.line3,
                            },
                        }))
                        .collect::<Vec<_>>(),
                });
                let _ = events.send(VendorEvent::QueueChanged(payload));
            }
            Parsed::Jpeg((image_key, data)) => {
                self.resolve_cover(image_key, "image/jpeg", data).await;
            }
            Parsed::Png((image_key, data)) => {
                self.resolve_cover(image_key, "image/png", data).await;
            }
            _ => {}
        }
    }

    /// Persists a (re)issued credential so the next start reconnects
    fn persist_credentials(&self, roon_state: &RoonState) {
        let Some(core_id) = roon_state.paired_core_id.clone() else {
            return;
        };
        let Some(token) = roon_state.tokens.get(&core_id).cloned() else {
            return;
        };

        let saved = self
            .store
            .set_roon_core_id(&core_id)
            .and_then(|_| self.store.set_roon_api_token(&token));
        if let Err(err) = saved {
            tracing::warn!(error = %err, "Failed to persist Roon credential");
        }
    }

    async fn subscribe_tracked_queue(&self) {
        let (zone_id, transport) = {
            let mut state = self.state.write().await;
            if state.queue_subscribed {
                return;
            }
            let Some(zone_id) = state
                .zones
                .values()
                .find(|z| z.display_name == self.zone_name)
                .map(|z| z.zone_id.clone())
            else {
                return;
            };
            let Some(transport) = state.transport.clone() else {
                return;
            };
            state.queue_subscribed = true;
            (zone_id, transport)
        };

        tracing::info!(zone_id = %zone_id, "Subscribing to tracked zone queue");
        transport.subscribe_queue(&zone_id, QUEUE_SUBSCRIBE_COUNT).await;
    }

    async fn resolve_cover(&self, image_key: String, content_type: &str, data: Vec<u8>) {
        let mut state = self.state.write().await;
        let req_id = state
            .pending_covers
            .iter()
            .find(|(_, (key, _))| *key == image_key)
            .map(|(id, _)| *id);

        if let Some(req_id) = req_id {
            if let Some((_, sender)) = state.pending_covers.remove(&req_id) {
                let _ = sender.send(CoverImage {
                    content_type: content_type.to_string(),
                    data,
                });
            }
        }
    }
}

/// One discovery + event session against the paired core
async fn run_session(adapter: RoonAdapter, events: mpsc::UnboundedSender<VendorEvent>) {
    let info = info!("com.igfarm", "Frame for Roon");
    let mut roon = RoonApi::new(info);

    let (svc, status) = Status::new(&roon);
    let services = vec![
        Services::Transport(Transport::new()),
        Services::Image(Image::new()),
        Services::Status(status),
    ];
    let mut provided: HashMap<String, Svc> = HashMap::new();
    provided.insert(status::SVCNAME.to_owned(), svc);

    let store = adapter.store.clone();
    let get_roon_state = move || roon_state_from_store(&store);

    let Some((mut handles, mut core_rx)) = roon
        .start_discovery(Box::new(get_roon_state), provided, Some(services))
        .await
    else {
        tracing::error!("Failed to start Roon discovery");
        adapter.set_connection(ConnectionState::Disconnected);
        return;
    };

    tracing::info!(zone = %adapter.zone_name, "Roon discovery started");

    let loop_adapter = adapter.clone();
    handles.spawn(async move {
        while let Some((event, msg)) = core_rx.recv().await {
            loop_adapter.handle_core_event(event).await;
            if let Some((_, parsed)) = msg {
                loop_adapter.handle_parsed(parsed, &events).await;
            }
        }
        tracing::info!("Roon event channel closed");
    });

    tokio::select! {
        _ = adapter.shutdown.cancelled() => {
            tracing::info!("Roon session shut down");
        }
        _ = async { while handles.join_next().await.is_some() {} } => {}
    }

    // Dropping the task set aborts the SDK tasks of this session
    drop(handles);
    adapter.set_connection(ConnectionState::Disconnected);
}

fn roon_state_from_store(store: &Arc<SettingsStore>) -> RoonState {
    let core_id = store.get_roon_core_id();
    let mut tokens = HashMap::new();
    if let (Some(core_id), Some(token)) = (core_id.clone(), store.get_roon_api_token()) {
        tokens.insert(core_id, token);
    }
    RoonState {
        paired_core_id: core_id,
        tokens,
    }
}

/// One-time pairing ceremony
///
/// Discovers a core on the local segment (first responder wins), then
/// blocks until the operator approves the extension in Roon Settings →
/// Extensions — an unbounded wait by design. On approval the credential is
/// persisted into `store` and the currently visible zone display names are
/// returned so the operator can pick one.
///
/// Zero cores answering discovery within the window is terminal:
/// [`Error::NoCoreFound`], no retry.
pub async fn register(store: &Arc<SettingsStore>, device_name: &str) -> Result<Vec<String>> {
    let info = info!("com.igfarm", "Frame for Roon");
    let mut roon = RoonApi::new(info);

    let (svc, status) = Status::new(&roon);
    let services = vec![
        Services::Transport(Transport::new()),
        Services::Image(Image::new()),
        Services::Status(status),
    ];
    let mut provided: HashMap<String, Svc> = HashMap::new();
    provided.insert(status::SVCNAME.to_owned(), svc);

    // A pairing session always starts unauthorized
    let get_roon_state = || RoonState {
        paired_core_id: None,
        tokens: HashMap::new(),
    };

    let (handles, mut core_rx) = roon
        .start_discovery(Box::new(get_roon_state), provided, Some(services))
        .await
        .ok_or(Error::Discovery)?;

    tracing::info!(
        device = device_name,
        "Waiting for authorisation in Roon Settings -> Extensions"
    );

    let mut core_seen = false;
    let mut credential_saved = false;

    loop {
        let received = if core_seen {
            core_rx.recv().await
        } else {
            match tokio::time::timeout(DISCOVERY_TIMEOUT, core_rx.recv()).await {
                Ok(received) => received,
                Err(_) => return Err(Error::NoCoreFound),
            }
        };

        let Some((event, msg)) = received else {
            return Err(Error::Registration("discovery channel closed".into()));
        };

        match event {
            CoreEvent::Found(mut core) => {
                core_seen = true;
                tracing::info!(core = %core.display_name, "Found Roon core");

                if let Some(status) = core.get_status() {
                    let message = format!("Paired with {device_name}");
                    status.set_status(message, false).await;
                }
                if let Some(transport) = core.get_transport() {
                    transport.subscribe_zones().await;
                }
            }
            _ => {}
        }

        if let Some((_, parsed)) = msg {
            match parsed {
                Parsed::RoonState(roon_state) => {
                    if let Some(core_id) = roon_state.paired_core_id.clone() {
                        if let Some(token) = roon_state.tokens.get(&core_id) {
                            store.set_roon_core_id(&core_id)?;
                            store.set_roon_api_token(token)?;
                            credential_saved = true;
                            tracing::info!(core_id = %core_id, "Got authorisation");
                        }
                    }
                }
                Parsed::Zones(zones) => {
                    // Zones only become interesting once the token landed;
                    // returning ends the pairing session (tasks aborted on
                    // drop), the normal connect path takes over after the
                    // reload.
                    if credential_saved {
                        let mut names: Vec<String> =
                            zones.iter().map(|z| z.display_name.clone()).collect();
                        names.sort();
                        drop(handles);
                        return Ok(names);
                    }
                }
                _ => {}
            }
        }
    }
}
