pub mod detection;
pub mod profiles;

pub use detection::{detect, parse_nvidia_smi, probe, HardwareProfile};
pub use profiles::{Tier, TierSpec};
