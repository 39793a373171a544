//! Extension pour brancher le canal de diffusion sur rofserver
//!
//! Ce module fournit le trait `BridgeServerExt` qui enregistre la route
//! `/events` (SSE) sur le serveur.

use crate::api::{EventsState, events_sse};
use rofserver::Server;

/// Trait d'extension pour ajouter le push channel au serveur
pub trait BridgeServerExt {
    /// Enregistre la route `GET /events`
    ///
    /// # Exemple
    ///
    /// ```rust,ignore
    /// use rofbridge::{BridgeServerExt, EventsState};
    ///
    /// server.init_events_api(EventsState { bridge, scheduler }).await;
    /// ```
    async fn init_events_api(&mut self, state: EventsState);
}

impl BridgeServerExt for Server {
    async fn init_events_api(&mut self, state: EventsState) {
        self.add_handler_with_state("/events", events_sse, state)
            .await;
    }
}
