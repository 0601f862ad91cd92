//! Compute device selection

use crate::config::DevicePreference;
use candle_core::Device;
use phishguard_core::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Compute target chosen once at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceHandle {
    Gpu,
    Cpu,
}

impl DeviceHandle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
        }
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a device preference into a candle device
pub fn select_device(preference: DevicePreference) -> Result<(DeviceHandle, Device)> {
    match preference {
        DevicePreference::Cpu => Ok((DeviceHandle::Cpu, Device::Cpu)),
        DevicePreference::Gpu => {
            let device = create_gpu_device()?.ok_or_else(|| {
                Error::config("GPU inference requested but no CUDA or Metal device is available")
            })?;
            Ok((DeviceHandle::Gpu, device))
        }
        DevicePreference::Auto => match create_gpu_device() {
            Ok(Some(device)) => Ok((DeviceHandle::Gpu, device)),
            Ok(None) => Ok((DeviceHandle::Cpu, Device::Cpu)),
            Err(e) => {
                tracing::warn!("GPU detected but unusable, falling back to CPU: {}", e);
                Ok((DeviceHandle::Cpu, Device::Cpu))
            }
        },
    }
}

/// Open the first CUDA or Metal device, if the build and host support one
fn create_gpu_device() -> Result<Option<Device>> {
    if candle_core::utils::cuda_is_available() {
        return Device::new_cuda(0)
            .map(Some)
            .map_err(|e| Error::config(format!("Failed to create CUDA device: {}", e)));
    }

    if candle_core::utils::metal_is_available() {
        return Device::new_metal(0)
            .map(Some)
            .map_err(|e| Error::config(format!("Failed to create Metal device: {}", e)));
    }

    Ok(None)
}
