//! 计算平台查询边界
//!
//! 枚举逻辑只通过 [`ComputePlatform`] 访问驱动：列出平台、列出设备、读取设备属性。
//! 每次调用都可能失败，失败的平台或设备由调用方跳过。

use doublefinder_core::Result;

pub trait ComputePlatform {
    /// 平台句柄
    type Platform;
    /// 设备句柄
    type Device;

    /// 后端名称，用于日志
    fn backend_name(&self) -> &str;

    fn platforms(&self) -> Result<Vec<Self::Platform>>;

    fn platform_name(&self, platform: &Self::Platform) -> Result<String>;

    fn devices(&self, platform: &Self::Platform) -> Result<Vec<Self::Device>>;

    fn device_name(&self, device: &Self::Device) -> Result<String>;

    /// `cl_device_type` 位掩码
    fn device_type_bits(&self, device: &Self::Device) -> Result<u64>;

    fn supports_double_precision(&self, device: &Self::Device) -> Result<bool>;
}

impl<P: ComputePlatform + ?Sized> ComputePlatform for &P {
    type Platform = P::Platform;
    type Device = P::Device;

    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }

    fn platforms(&self) -> Result<Vec<Self::Platform>> {
        (**self).platforms()
    }

    fn platform_name(&self, platform: &Self::Platform) -> Result<String> {
        (**self).platform_name(platform)
    }

    fn devices(&self, platform: &Self::Platform) -> Result<Vec<Self::Device>> {
        (**self).devices(platform)
    }

    fn device_name(&self, device: &Self::Device) -> Result<String> {
        (**self).device_name(device)
    }

    fn device_type_bits(&self, device: &Self::Device) -> Result<u64> {
        (**self).device_type_bits(device)
    }

    fn supports_double_precision(&self, device: &Self::Device) -> Result<bool> {
        (**self).supports_double_precision(device)
    }
}

/// 没有任何平台的后端。未启用 `opencl` 特性且未指定夹具时使用。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlatform;

impl ComputePlatform for NoPlatform {
    type Platform = ();
    type Device = ();

    fn backend_name(&self) -> &str {
        "none"
    }

    fn platforms(&self) -> Result<Vec<()>> {
        Ok(Vec::new())
    }

    fn platform_name(&self, _platform: &()) -> Result<String> {
        Ok(String::new())
    }

    fn devices(&self, _platform: &()) -> Result<Vec<()>> {
        Ok(Vec::new())
    }

    fn device_name(&self, _device: &()) -> Result<String> {
        Ok(String::new())
    }

    fn device_type_bits(&self, _device: &()) -> Result<u64> {
        Ok(0)
    }

    fn supports_double_precision(&self, _device: &()) -> Result<bool> {
        Ok(false)
    }
}
