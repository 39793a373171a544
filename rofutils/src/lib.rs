/// Utilitaires réseau pour RoFrame.
///
/// Ce module fournit les fonctions de détection d'adresses IP locales,
/// utilisées pour construire l'URL d'appairage affichée (et encodée en QR)
/// sur la page d'initialisation.
mod ip_utils;

pub use ip_utils::{guess_local_ip, list_all_ips};
