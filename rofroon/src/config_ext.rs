//! Extension pour gérer la configuration Roon dans rofconfig
//!
//! Ce module fournit le trait `RoonConfigExt` qui ajoute à
//! `rofconfig::SettingsStore` les accesseurs du triplet d'appairage
//! (core id, token, zone). Le triplet est créé une seule fois par le flux
//! d'appairage ; le nom de zone reste figé jusqu'à un ré-appairage complet.

use anyhow::Result;
use rofconfig::SettingsStore;

/// Trait d'extension pour le triplet d'appairage Roon
pub trait RoonConfigExt {
    /// Identifiant du core apparié, s'il est non vide
    fn get_roon_core_id(&self) -> Option<String>;

    fn set_roon_core_id(&self, core_id: &str) -> Result<()>;

    /// Jeton d'autorisation délivré par le core, s'il est non vide
    fn get_roon_api_token(&self) -> Option<String>;

    fn set_roon_api_token(&self, token: &str) -> Result<()>;

    /// Nom d'affichage de la zone suivie, s'il est non vide
    fn get_roon_zone(&self) -> Option<String>;

    fn set_roon_zone(&self, zone_name: &str) -> Result<()>;

    /// Vrai si le couple {core id, token} est présent et non blanc.
    ///
    /// Pur contrôle d'existence : aucun appel réseau.
    fn has_pairing_credential(&self) -> bool;
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RoonConfigExt for SettingsStore {
    fn get_roon_core_id(&self) -> Option<String> {
        non_blank(self.get("ROON_CORE_ID"))
    }

    fn set_roon_core_id(&self, core_id: &str) -> Result<()> {
        self.set("ROON_CORE_ID", core_id)
    }

    fn get_roon_api_token(&self) -> Option<String> {
        non_blank(self.get("ROON_API_TOKEN"))
    }

    fn set_roon_api_token(&self, token: &str) -> Result<()> {
        self.set("ROON_API_TOKEN", token)
    }

    fn get_roon_zone(&self) -> Option<String> {
        non_blank(self.get("ROON_ZONE"))
    }

    fn set_roon_zone(&self, zone_name: &str) -> Result<()> {
        self.set("ROON_ZONE", zone_name)
    }

    fn has_pairing_credential(&self) -> bool {
        self.get_roon_core_id().is_some() && self.get_roon_api_token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path().to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_credential_round_trip() {
        let (_dir, store) = store();

        assert!(!store.has_pairing_credential());

        store.set_roon_core_id("core-1").unwrap();
        assert!(!store.has_pairing_credential());

        store.set_roon_api_token("tok").unwrap();
        assert!(store.has_pairing_credential());
        assert_eq!(store.get_roon_core_id().as_deref(), Some("core-1"));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let (_dir, store) = store();

        store.set_roon_core_id("core-1").unwrap();
        store.set_roon_api_token("   ").unwrap();
        assert!(!store.has_pairing_credential());
        assert!(store.get_roon_api_token().is_none());
    }
}
