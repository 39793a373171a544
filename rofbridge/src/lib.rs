//! Zone bridge and push channel for RoFrame
//!
//! Sits between the Roon adapter and the browser: normalizes the tracked
//! zone into [`ZoneSnapshot`]s, reacts to the vendor's queue/zone
//! callbacks, and broadcasts [`DisplayEvent`]s to every connected client
//! over the SSE push channel. Publishing is fire-and-forget: no
//! acknowledgment, no backpressure, no delivery guarantee — a disconnected
//! client simply misses an update and receives the next one.

mod api;
mod bridge;
mod bus;
mod server_ext;
mod snapshot;

pub use api::{EventsState, events_sse};
pub use bridge::{ZoneBridge, extract_queue_item, find_tracked};
pub use bus::EventBus;
pub use server_ext::BridgeServerExt;
pub use snapshot::{DisplayEvent, PLACEHOLDER_COVER, ZoneSnapshot};
