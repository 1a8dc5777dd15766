//! DoubleFinder Device - 计算设备枚举
//!
//! 列出本机 OpenCL 平台上的设备，按类型位掩码分类并检测双精度支持，
//! 结果以只读表格数据源的形式提供给展示层。

pub mod capabilities;
pub mod fixture;
pub mod lister;
#[cfg(feature = "opencl")]
pub mod opencl;
pub mod platform;
pub mod record;
pub mod table;

pub use fixture::*;
pub use lister::*;
#[cfg(feature = "opencl")]
pub use opencl::*;
pub use platform::*;
pub use record::*;
pub use table::*;
