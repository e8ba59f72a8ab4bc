//! Accelerator detection
//!
//! The profile is probed once per process and cached. Detection never fails:
//! when no accelerator can be found the profile reports `gpu_present = false`
//! and callers fall back to the CPU tier.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::{debug, info};

/// Overrides the detected VRAM (in MB). Useful on shared hosts and in CI.
pub const VRAM_OVERRIDE_ENV: &str = "VEDA_VRAM_MB";
/// Forces the CPU-only profile even when a GPU is visible.
pub const FORCE_CPU_ENV: &str = "VEDA_FORCE_CPU";

static PROFILE: OnceCell<HardwareProfile> = OnceCell::new();

/// Snapshot of the local compute environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub gpu_present: bool,
    pub vram_mb: u64,
    pub device_name: String,
}

impl HardwareProfile {
    /// Profile for a machine without a usable accelerator
    pub fn cpu_only() -> Self {
        Self {
            gpu_present: false,
            vram_mb: 0,
            device_name: "cpu".to_string(),
        }
    }

    /// Profile for a GPU with the given amount of memory
    pub fn with_vram(vram_mb: u64) -> Self {
        Self {
            gpu_present: true,
            vram_mb,
            device_name: format!("gpu ({} MB)", vram_mb),
        }
    }

    pub fn vram_gb(&self) -> f64 {
        self.vram_mb as f64 / 1024.0
    }
}

/// Returns the process-wide hardware profile, probing on first use.
pub fn detect() -> &'static HardwareProfile {
    PROFILE.get_or_init(|| {
        let profile = probe();
        if profile.gpu_present {
            info!(
                device = %profile.device_name,
                vram_mb = profile.vram_mb,
                "accelerator detected"
            );
        } else {
            info!("no accelerator detected, running CPU-only (expect slow generation)");
        }
        profile
    })
}

/// Uncached detection: env override, then `nvidia-smi`, then CPU fallback.
pub fn probe() -> HardwareProfile {
    if env_flag(FORCE_CPU_ENV) {
        debug!("{} set, skipping GPU probe", FORCE_CPU_ENV);
        return HardwareProfile::cpu_only();
    }

    if let Some(vram_mb) = std::env::var(VRAM_OVERRIDE_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        debug!(vram_mb, "using VRAM override from {}", VRAM_OVERRIDE_ENV);
        return if vram_mb == 0 {
            HardwareProfile::cpu_only()
        } else {
            HardwareProfile::with_vram(vram_mb)
        };
    }

    match query_nvidia_smi() {
        Ok(output) => parse_nvidia_smi(&output).unwrap_or_else(HardwareProfile::cpu_only),
        Err(e) => {
            debug!("nvidia-smi unavailable: {}", e);
            HardwareProfile::cpu_only()
        }
    }
}

fn query_nvidia_smi() -> anyhow::Result<String> {
    let output = Command::new("nvidia-smi")
        .arg("--query-gpu=name,memory.total")
        .arg("--format=csv,noheader,nounits")
        .output()?;

    if !output.status.success() {
        anyhow::bail!("nvidia-smi exited with {}", output.status);
    }

    Ok(String::from_utf8(output.stdout)?)
}

/// Parse `name, memory.total` CSV rows; the device with the most memory wins.
pub fn parse_nvidia_smi(output: &str) -> Option<HardwareProfile> {
    output
        .lines()
        .filter_map(|line| {
            let (name, mem) = line.rsplit_once(',')?;
            let vram_mb = mem.trim().parse::<u64>().ok()?;
            Some(HardwareProfile {
                gpu_present: true,
                vram_mb,
                device_name: name.trim().to_string(),
            })
        })
        .max_by_key(|p| p.vram_mb)
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).map(|v| v.to_lowercase()).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_gpu() {
        let profile = parse_nvidia_smi("NVIDIA GeForce GTX 1650, 4096\n").unwrap();
        assert!(profile.gpu_present);
        assert_eq!(profile.vram_mb, 4096);
        assert_eq!(profile.device_name, "NVIDIA GeForce GTX 1650");
    }

    #[test]
    fn test_parse_picks_largest_device() {
        let output = "Tesla T4, 15360\nNVIDIA A100-SXM4-40GB, 40960\n";
        let profile = parse_nvidia_smi(output).unwrap();
        assert_eq!(profile.vram_mb, 40960);
        assert!(profile.device_name.contains("A100"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_nvidia_smi("").is_none());
        assert!(parse_nvidia_smi("No devices were found").is_none());
    }

    #[test]
    fn test_cpu_only_profile() {
        let profile = HardwareProfile::cpu_only();
        assert!(!profile.gpu_present);
        assert_eq!(profile.vram_mb, 0);
    }
}
