pub mod mac_address;
pub mod opcode;
pub mod uuid;

pub use mac_address::{MacAddress, ParseMacError};
pub use opcode::Opcode;
pub use uuid::Uuid;
