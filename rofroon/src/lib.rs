//! Roon client adapter for RoFrame
//!
//! This crate is the only place touching the Roon protocol. It wraps the
//! `roon-api` SDK behind a small surface:
//!
//! - [`register`]: the one-time, human-supervised pairing ceremony —
//!   discover a core, wait for the operator to approve the extension on the
//!   core's own UI, persist the credential, report the visible zones
//! - [`RoonAdapter::connect`]: the fast path run on every start, using the
//!   persisted credential; exposes the normalized zone table and forwards
//!   queue/zone events to the bridge
//! - [`RoonAdapter::fetch_cover`]: square cover art via the core's image
//!   service
//!
//! Connections never self-heal: when the core is lost the adapter reports
//! `Disconnected` and stays there until the process is restarted.

mod adapter;
mod config_ext;
mod error;
mod zone;

pub use adapter::{RoonAdapter, CoverImage, VendorEvent, register};
pub use config_ext::RoonConfigExt;
pub use error::{Error, Result};
pub use zone::{ConnectionState, NowPlayingView, PlaybackState, ZoneView};
