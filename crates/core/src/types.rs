//! Gemeinsame Identifikationstypen fuer krtc
//!
//! Raum- und Teilnehmerkennungen verwenden das Newtype-Pattern um
//! Verwechslungen zwischen Raum-ID und UID zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};

use crate::error::{RtcError, RtcResult};

/// Standard-Port des Signalisierungsservers
pub const DEFAULT_SIGNALING_PORT: u16 = 1989;

/// Kennung eines Raums
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kennung eines Teilnehmers innerhalb eines Raums
///
/// Wird auf der Leitung als `display` uebertragen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(uid: &str) -> Self {
        Self::new(uid)
    }
}

/// Medien-Kanal eines Teilnehmers, immer `"<room_id>/<uid>"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel(String);

impl Channel {
    pub fn new(room: &RoomId, uid: &Uid) -> Self {
        Self(format!("{}/{}", room, uid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Adresse des Signalisierungsservers in der Form `host[:port]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Zerlegt `host[:port]`; ohne Port wird `default_port` verwendet
    ///
    /// IPv6-Literale werden nicht unterstuetzt.
    pub fn parse(address: &str, default_port: u16) -> RtcResult<Self> {
        let address = address.trim();
        let (host, port) = match address.split_once(':') {
            Some((host, port)) if port.is_empty() => (host, default_port),
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    RtcError::UngueltigesArgument(format!("ungueltiger Port in '{address}'"))
                })?;
                (host, port)
            }
            None => (address, default_port),
        };

        if host.is_empty() {
            return Err(RtcError::UngueltigesArgument(format!(
                "kein Host in '{address}'"
            )));
        }
        if port == 0 {
            return Err(RtcError::UngueltigesArgument(format!(
                "Port 0 ist nicht erlaubt ('{address}')"
            )));
        }

        Ok(Self::new(host, port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl std::fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_ist_raum_slash_uid() {
        let channel = Channel::new(&RoomId::new("55555"), &Uid::new("8a38581"));
        assert_eq!(channel.as_str(), "55555/8a38581");
    }

    #[test]
    fn adresse_ohne_port_nutzt_standard() {
        let adresse = ServerAddress::parse("rtc.example.org", DEFAULT_SIGNALING_PORT).unwrap();
        assert_eq!(adresse.host(), "rtc.example.org");
        assert_eq!(adresse.port(), 1989);
    }

    #[test]
    fn adresse_mit_port() {
        let adresse = ServerAddress::parse("127.0.0.1:4000", DEFAULT_SIGNALING_PORT).unwrap();
        assert_eq!(adresse.host(), "127.0.0.1");
        assert_eq!(adresse.port(), 4000);
        assert_eq!(adresse.to_string(), "127.0.0.1:4000");
    }

    #[test]
    fn leerer_port_nutzt_standard() {
        let adresse = ServerAddress::parse("localhost:", 1989).unwrap();
        assert_eq!(adresse.port(), 1989);
    }

    #[test]
    fn ungueltige_adressen_werden_abgelehnt() {
        for eingabe in ["", ":1989", "host:abc", "host:70000", "host:0"] {
            let fehler = ServerAddress::parse(eingabe, 1989).unwrap_err();
            assert_eq!(fehler.reason(), "invalid_argument", "Eingabe: {eingabe}");
        }
    }

    #[test]
    fn ids_sind_serde_transparent() {
        let uid = Uid::new("111");
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "\"111\"");
        let zurueck: Uid = serde_json::from_str(&json).unwrap();
        assert_eq!(zurueck, uid);
    }
}
