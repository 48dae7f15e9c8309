use get_if_addrs::get_if_addrs;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::UdpSocket;

/// Pseudo-interfaces de capture jamais utilisables pour le rejeu.
const EXCLUDED_INTERFACES: &[&str] = &["any", "nflog", "nfqueue"];

/// Interface réseau utilisable comme cible de rejeu.
#[derive(Debug, Clone, Serialize)]
pub struct NicInfo {
    pub name: String,
    pub addresses: Vec<String>,
}

/// Liste les interfaces réseau de la machine.
///
/// Les pseudo-interfaces (`any`, `nflog`, `nfqueue`) et l'interface de
/// loopback sont écartées. Les adresses de chaque interface sont regroupées
/// sous son nom, dans l'ordre alphabétique des noms.
pub fn list_interfaces() -> Vec<NicInfo> {
    let Ok(if_addrs) = get_if_addrs() else {
        return Vec::new();
    };

    let mut by_name: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for iface in if_addrs {
        if iface.is_loopback() || EXCLUDED_INTERFACES.contains(&iface.name.as_str()) {
            continue;
        }
        by_name
            .entry(iface.name.clone())
            .or_default()
            .push(iface.ip().to_string());
    }

    by_name
        .into_iter()
        .map(|(name, addresses)| NicInfo { name, addresses })
        .collect()
}

/// Devine l'adresse IP locale de la machine.
///
/// Demande au système quelle interface serait utilisée pour joindre un
/// serveur public, sans émettre de trafic (UDP sans connexion). Retourne
/// `127.0.0.1` en cas d'échec.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_names_are_filtered() {
        let nics = list_interfaces();
        assert!(nics.iter().all(|n| !EXCLUDED_INTERFACES.contains(&n.name.as_str())));
        assert!(nics.iter().all(|n| n.name != "lo"));
    }

    #[test]
    fn guess_local_ip_always_returns_an_address() {
        let ip: std::net::IpAddr = guess_local_ip().parse().unwrap();
        assert!(!ip.to_string().is_empty());
    }
}
