/// Length of the truncated matrix fingerprint.
pub const FINGERPRINT_LEN: usize = 20;

/// Worker threads for OpenMP-enabled workloads, also used for core pinning.
pub const DEFAULT_OPENMP_THREADS: u32 = 16;

/// Suffix appended to a C compiler path to find its C++ companion.
pub const CXX_SUFFIX: &str = "++";

pub const ENV_DEFAULT_CC: &str = "DEFAULT_C";
pub const ENV_FLOATZONE_CC: &str = "FLOATZONE_C";
pub const ENV_ASANMM_CC: &str = "ASANMM_14_C";
pub const ENV_SPEC06: &str = "FLOATZONE_SPEC06";
pub const ENV_SPEC17: &str = "FLOATZONE_SPEC17";
pub const ENV_INFRA: &str = "FLOATZONE_INFRA";
pub const ENV_OPENMP_THREADS: &str = "SANMATRIX_OPENMP_THREADS";
