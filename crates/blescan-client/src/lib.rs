pub mod config;
pub mod error;
pub mod listener;
pub mod scanner;

pub use blescan_core::beacons::{BeaconKind, BeaconRecord};
pub use config::{ListenerConfig, ScannerConfig};
pub use error::ClientError;
pub use listener::{create_beacon_listener, BeaconListener, Sighting};
pub use scanner::Scanner;
