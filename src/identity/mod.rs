//! Visitor identification: device-signal parsing, fingerprint derivation
//! and the resolution cascade used to re-identify returning visitors.

pub mod collect;
pub mod device;
pub mod fingerprint;
pub mod resolve;

pub use collect::build_visit;
pub use device::DeviceSignals;
pub use fingerprint::FingerprintError;
pub use resolve::{resolve, Strategy};
