//! 双精度能力检测
//!
//! 双精度在 OpenCL 中是可选特性。判断依据：
//! - `CL_DEVICE_DOUBLE_FP_CONFIG` 非零 (OpenCL 1.2 起为核心特性)
//! - 扩展列表包含 `cl_khr_fp64`
//! - 扩展列表包含 `cl_amd_fp64` (旧版 AMD 驱动只通过该扩展暴露双精度)

pub const KHR_FP64: &str = "cl_khr_fp64";
pub const AMD_FP64: &str = "cl_amd_fp64";

/// 扩展字符串以空白分隔，按完整名称匹配。
pub fn extensions_declare_fp64(extensions: &str) -> bool {
    extensions
        .split_whitespace()
        .any(|ext| ext == KHR_FP64 || ext == AMD_FP64)
}

/// 综合浮点配置与扩展列表。任一来源表明支持即视为支持。
pub fn supports_double_precision(double_fp_config: Option<u64>, extensions: Option<&str>) -> bool {
    double_fp_config.is_some_and(|config| config != 0)
        || extensions.is_some_and(extensions_declare_fp64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_khr_extension() {
        assert!(extensions_declare_fp64(
            "cl_khr_byte_addressable_store cl_khr_fp64 cl_khr_icd"
        ));
    }

    #[test]
    fn test_amd_extension() {
        assert!(extensions_declare_fp64("cl_amd_fp64 cl_khr_gl_sharing"));
    }

    #[test]
    fn test_no_partial_match() {
        assert!(!extensions_declare_fp64("cl_khr_fp16 cl_khr_fp64_extra"));
        assert!(!extensions_declare_fp64(""));
    }

    #[test]
    fn test_fp_config_alone_is_enough() {
        assert!(supports_double_precision(Some(0x3f), None));
        assert!(supports_double_precision(Some(0x3f), Some("")));
    }

    #[test]
    fn test_zero_config_falls_back_to_extensions() {
        assert!(!supports_double_precision(Some(0), Some("cl_khr_icd")));
        assert!(supports_double_precision(Some(0), Some("cl_khr_fp64")));
        assert!(!supports_double_precision(None, None));
    }
}
