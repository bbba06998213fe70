use blescan_core::adv::TrailingBytePolicy;
use blescan_core::beacons::BeaconKind;
use blescan_core::hci::ScanParameters;
use blescan_core::types::MacAddress;
use std::time::Duration;

/// Settings for a [`Scanner`](crate::Scanner).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScannerConfig {
    pub scan: ScanParameters,
    pub filter_duplicates: bool,
    /// How long [`Scanner::recv_event`](crate::Scanner::recv_event) waits.
    pub response_timeout_ms: u64,
    pub trailing_byte: TrailingBytePolicy,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan: ScanParameters::default(),
            filter_duplicates: false,
            response_timeout_ms: 3000,
            trailing_byte: TrailingBytePolicy::Rssi,
        }
    }
}

impl ScannerConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms.max(1))
    }
}

/// What a beacon listener forwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ListenerConfig {
    /// Formats to try, in order. Empty forwards every decoded event raw.
    pub kinds: Vec<BeaconKind>,
    /// Advertisers to keep. Empty keeps all.
    pub macs: Vec<MacAddress>,
    pub trailing_byte: TrailingBytePolicy,
    /// Replace Eddystone payload bytes with a typed subtree before
    /// recognition.
    pub expand_eddystone: bool,
    /// Forward events no recognizer claimed.
    pub include_unrecognized: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            kinds: BeaconKind::ALL.to_vec(),
            macs: Vec::new(),
            trailing_byte: TrailingBytePolicy::Rssi,
            expand_eddystone: false,
            include_unrecognized: false,
        }
    }
}

impl ListenerConfig {
    pub fn with_kinds(mut self, kinds: impl Into<Vec<BeaconKind>>) -> Self {
        self.kinds = kinds.into();
        self
    }

    pub fn with_macs(mut self, macs: impl Into<Vec<MacAddress>>) -> Self {
        self.macs = macs.into();
        self
    }

    pub fn accepts(&self, mac: Option<MacAddress>) -> bool {
        self.macs.is_empty() || mac.is_some_and(|m| self.macs.contains(&m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_filter() {
        let mac: MacAddress = "a4:c1:38:40:52:38".parse().unwrap();
        let config = ListenerConfig::default();
        assert!(config.accepts(None));
        let config = config.with_macs(vec![mac]);
        assert!(config.accepts(Some(mac)));
        assert!(!config.accepts(Some(MacAddress::default())));
        assert!(!config.accepts(None));
    }

    #[test]
    fn timeout_is_never_zero() {
        let config = ScannerConfig {
            response_timeout_ms: 0,
            ..ScannerConfig::default()
        };
        assert_eq!(config.response_timeout(), Duration::from_millis(1));
    }
}
