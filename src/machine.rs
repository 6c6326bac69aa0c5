use std::{
    collections::BTreeMap,
    process::Command,
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::{Error, Result};

/// Memory assumed when the host cannot report it (1 GiB)
pub const FALLBACK_MEMORY_BYTES: u64 = 1 << 30;

static SHARED_PROFILE: RwLock<Option<Arc<MachineProfile>>> = RwLock::new(None);

/// A single GPU device
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpuDevice {
    pub name: String,
    pub memory_bytes: u64,
}

/// Host resources available to an analysis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineProfile {
    available_memory_bytes: u64,
    cpu_cores: u32,
    gpu_devices: BTreeMap<u32, GpuDevice>,
}
impl MachineProfile {
    pub fn new(
        available_memory_bytes: u64,
        cpu_cores: u32,
        gpu_devices: BTreeMap<u32, GpuDevice>,
    ) -> Self {
        Self {
            available_memory_bytes,
            cpu_cores: cpu_cores.max(1),
            gpu_devices,
        }
    }

    /// Profile used when the host query fails
    pub fn fallback() -> Self {
        Self::new(FALLBACK_MEMORY_BYTES, 1, BTreeMap::new())
    }

    /// Query the host for its current resources.
    ///
    /// GPU enumeration never fails, a host without a usable driver simply
    /// reports no devices.
    pub fn query() -> Result<Self> {
        let mut sys = System::new();
        sys.refresh_memory();
        if sys.total_memory() == 0 {
            return Err(Error::ResourceQuery(String::from(
                "host did not report any memory",
            )));
        }
        let available_memory_bytes = match sys.available_memory() {
            0 => sys.free_memory(),
            m => m,
        };
        if available_memory_bytes == 0 {
            return Err(Error::ResourceQuery(String::from(
                "host reported no available memory",
            )));
        }
        let cpu_cores = num_cpus::get() as u32;

        let gpu_devices = match query_gpus() {
            Ok(devices) => devices,
            Err(e) => {
                log::warn!("No GPUs detected, continuing without GPU support ({})", e);
                BTreeMap::new()
            }
        };

        Ok(Self::new(available_memory_bytes, cpu_cores, gpu_devices))
    }

    /// The process-wide profile, queried on first use
    pub fn shared() -> Arc<Self> {
        if let Ok(guard) = SHARED_PROFILE.read() {
            if let Some(profile) = guard.as_ref() {
                return profile.clone();
            }
        }
        Self::refresh()
    }

    /// Re-query the host and replace the process-wide profile
    pub fn refresh() -> Arc<Self> {
        let profile = Arc::new(Self::query().unwrap_or_else(|e| {
            log::warn!(
                "{}; assuming {} bytes of memory and a single core",
                e,
                FALLBACK_MEMORY_BYTES
            );
            Self::fallback()
        }));
        if let Ok(mut guard) = SHARED_PROFILE.write() {
            *guard = Some(profile.clone());
        }
        profile
    }

    // Getters
    pub fn available_memory_bytes(&self) -> u64 {
        self.available_memory_bytes
    }
    pub fn cpu_cores(&self) -> u32 {
        self.cpu_cores
    }
    pub fn gpu_devices(&self) -> &BTreeMap<u32, GpuDevice> {
        &self.gpu_devices
    }
    /// Memory of the largest GPU, if any is present
    pub fn max_gpu_memory_bytes(&self) -> Option<u64> {
        self.gpu_devices.values().map(|gpu| gpu.memory_bytes).max()
    }
}

fn query_gpus() -> std::result::Result<BTreeMap<u32, GpuDevice>, String> {
    let output = Command::new("nvidia-smi")
        .args([
            "--query-gpu=index,name,memory.total",
            "--format=csv,noheader,nounits",
        ])
        .output()
        .map_err(|e| e.to_string())?;
    if !output.status.success() {
        return Err(format!("nvidia-smi exited with {}", output.status));
    }
    parse_gpu_table(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `index, name, memory [MiB]` rows
fn parse_gpu_table(table: &str) -> std::result::Result<BTreeMap<u32, GpuDevice>, String> {
    let mut devices = BTreeMap::new();
    for line in table.lines().filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(format!("unexpected GPU row '{}'", line));
        }
        let id = fields[0].parse::<u32>().map_err(|e| e.to_string())?;
        let mebibytes = fields[2].parse::<u64>().map_err(|e| e.to_string())?;
        devices.insert(
            id,
            GpuDevice {
                name: String::from(fields[1]),
                memory_bytes: mebibytes * 1024 * 1024,
            },
        );
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gpu_rows() {
        let table = "0, NVIDIA A100-SXM4-40GB, 40960\n1, NVIDIA T4, 15360\n";
        let devices = parse_gpu_table(table).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[&0].name, "NVIDIA A100-SXM4-40GB");
        assert_eq!(devices[&1].memory_bytes, 15360 * 1024 * 1024);
    }

    #[test]
    fn rejects_malformed_gpu_rows() {
        assert!(parse_gpu_table("0, only two").is_err());
        assert!(parse_gpu_table("x, name, 10").is_err());
    }

    #[test]
    fn largest_gpu_sets_the_ceiling() {
        let mut gpus = BTreeMap::new();
        gpus.insert(0, GpuDevice { name: "a".into(), memory_bytes: 10 });
        gpus.insert(3, GpuDevice { name: "b".into(), memory_bytes: 30 });
        let profile = MachineProfile::new(100, 4, gpus);
        assert_eq!(profile.max_gpu_memory_bytes(), Some(30));
        assert_eq!(MachineProfile::fallback().max_gpu_memory_bytes(), None);
    }

    #[test]
    fn shared_profile_is_cached() {
        let a = MachineProfile::shared();
        let b = MachineProfile::shared();
        assert!(a.available_memory_bytes() > 0);
        assert_eq!(*a, *b);
    }
}
