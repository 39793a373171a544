//! # rofserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour créer le serveur HTTP du
//! cadre : routes JSON, handlers avec état (SSE compris), fichiers statiques
//! embarqués, redirections, documentation OpenAPI et arrêt gracieux.
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use rofserver::ServerBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     rofserver::init_logging();
//!
//!     let mut server = ServerBuilder::new("RoFrame", "192.168.1.42", "0.0.0.0", 5006).build();
//!
//!     server.add_route("/ping", || async {
//!         serde_json::json!({"message": "pong"})
//!     }).await;
//!
//!     server.start().await;
//!     server.wait().await;
//! }
//! ```

mod server;

pub use server::{Server, ServerBuilder, ServerInfo, init_logging};
