use get_if_addrs::get_if_addrs;
use std::collections::HashMap;
use std::net::UdpSocket;

/// Devine l'adresse IP locale de la machine.
///
/// Crée un socket UDP vers un serveur DNS public (8.8.8.8) pour identifier
/// l'interface réseau utilisée pour le trafic sortant. UDP étant sans
/// connexion, aucun paquet n'est émis : on demande simplement au système
/// quelle interface serait choisie.
///
/// # Returns
///
/// L'adresse IP locale sous forme de `String`, ou `"127.0.0.1"` en cas
/// d'échec à n'importe quelle étape.
pub fn guess_local_ip() -> String {
    match UdpSocket::bind("0.0.0.0:0") {
        Ok(socket) => {
            if socket.connect("8.8.8.8:80").is_ok() {
                if let Ok(local_addr) = socket.local_addr() {
                    return local_addr.ip().to_string();
                }
            }
            "127.0.0.1".to_string()
        }
        Err(_) => "127.0.0.1".to_string(),
    }
}

/// Liste toutes les adresses IPv4 non-loopback, par interface.
///
/// Utile pour afficher les adresses candidates sur la page d'appairage
/// quand la détection automatique choisit la mauvaise interface.
pub fn list_all_ips() -> HashMap<String, Vec<String>> {
    let mut result = HashMap::new();

    if let Ok(interfaces) = get_if_addrs() {
        for iface in interfaces {
            let ip = iface.ip();
            if ip.is_loopback() {
                continue;
            }
            if ip.is_ipv4() {
                result
                    .entry(iface.name)
                    .or_insert_with(Vec::new)
                    .push(ip.to_string());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn test_guess_local_ip_returns_valid_ip() {
        let ip = guess_local_ip();

        // Vérifie que le résultat est parsable comme une IP
        assert!(
            ip.parse::<IpAddr>().is_ok(),
            "Should return a valid IP address"
        );
    }

    #[test]
    fn test_list_all_ips_excludes_loopback() {
        for ips in list_all_ips().values() {
            for ip in ips {
                let parsed: IpAddr = ip.parse().expect("interface IP should parse");
                assert!(!parsed.is_loopback());
            }
        }
    }
}
