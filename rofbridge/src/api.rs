//! SSE endpoint of the push channel

use crate::bridge::ZoneBridge;
use axum::{
    extract::State,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use rofdisplay::DisplaySupervisor;
use std::sync::Arc;
use tracing::info;

/// State handed to the events handler
#[derive(Clone)]
pub struct EventsState {
    pub bridge: Arc<ZoneBridge>,
    pub scheduler: DisplaySupervisor,
}

/// Handler SSE : flux `album_update` vers tous les clients connectés
///
/// La connexion d'un client démarre paresseusement l'ordonnanceur
/// d'affichage, rejoue le dernier évènement connu puis pousse les mises à
/// jour en temps réel. Aucune garantie de livraison : un client déconnecté
/// rate simplement l'évènement et recevra le suivant.
pub async fn events_sse(State(state): State<EventsState>) -> impl IntoResponse {
    info!("Display client connected");
    state.scheduler.ensure_started();

    let bus = state.bridge.bus().clone();
    let mut rx = bus.subscribe();
    let latest = bus.latest();

    // Refresh the newcomer with current data, off the request path
    let bridge = state.bridge.clone();
    tokio::spawn(async move {
        bridge.publish_current().await;
    });

    let stream = async_stream::stream! {
        // 1. Rejouer d'abord le dernier évènement connu
        if let Some(event) = latest {
            let json = serde_json::to_string(&event).unwrap();
            yield Ok::<_, axum::Error>(Event::default().event("album_update").data(json));
        }

        // 2. Puis streamer les mises à jour en temps réel
        while let Ok(event) = rx.recv().await {
            let json = serde_json::to_string(&event).unwrap();
            yield Ok::<_, axum::Error>(Event::default().event("album_update").data(json));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
