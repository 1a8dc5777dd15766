//! OpenCL 后端 (需要 `opencl` 特性)
//!
//! 通过 ICD 加载器查询本机驱动。

use opencl3::device::Device;
use opencl3::platform::{Platform, get_platforms};
use tracing::debug;

use doublefinder_core::{DoubleFinderError, Result};

use crate::capabilities;
use crate::platform::ComputePlatform;
use crate::record::type_bits;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenClPlatform;

impl OpenClPlatform {
    pub fn new() -> Self {
        Self
    }
}

fn platform_error(context: &str, e: impl std::fmt::Display) -> DoubleFinderError {
    DoubleFinderError::Platform(format!("{context}: {e}"))
}

fn device_error(context: &str, e: impl std::fmt::Display) -> DoubleFinderError {
    DoubleFinderError::Device(format!("{context}: {e}"))
}

impl ComputePlatform for OpenClPlatform {
    type Platform = Platform;
    type Device = Device;

    fn backend_name(&self) -> &str {
        "opencl"
    }

    fn platforms(&self) -> Result<Vec<Platform>> {
        get_platforms().map_err(|e| platform_error("clGetPlatformIDs", e))
    }

    fn platform_name(&self, platform: &Platform) -> Result<String> {
        platform
            .name()
            .map_err(|e| platform_error("CL_PLATFORM_NAME", e))
    }

    fn devices(&self, platform: &Platform) -> Result<Vec<Device>> {
        let ids = platform
            .get_devices(type_bits::ALL)
            .map_err(|e| platform_error("clGetDeviceIDs", e))?;
        Ok(ids.into_iter().map(Device::new).collect())
    }

    fn device_name(&self, device: &Device) -> Result<String> {
        device.name().map_err(|e| device_error("CL_DEVICE_NAME", e))
    }

    fn device_type_bits(&self, device: &Device) -> Result<u64> {
        device
            .dev_type()
            .map_err(|e| device_error("CL_DEVICE_TYPE", e))
    }

    fn supports_double_precision(&self, device: &Device) -> Result<bool> {
        // OpenCL 1.0/1.1 设备可能不认识 CL_DEVICE_DOUBLE_FP_CONFIG，此时只看扩展列表
        let fp_config = match device.double_fp_config() {
            Ok(config) => Some(config),
            Err(e) => {
                debug!("CL_DEVICE_DOUBLE_FP_CONFIG unavailable: {}", e);
                None
            }
        };
        let extensions = device
            .extensions()
            .map_err(|e| device_error("CL_DEVICE_EXTENSIONS", e))?;

        Ok(capabilities::supports_double_precision(
            fp_config,
            Some(&extensions),
        ))
    }
}
