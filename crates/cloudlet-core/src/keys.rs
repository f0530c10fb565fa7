//! Well-known descriptor and resource keys
//!
//! These are the wire names used by the directory server and by cloudlets.
//! Keys not listed here are still carried through untouched.

/// Application descriptor keys (sent to cloudlets under `"application"`)
pub mod app {
    /// Wrapper key of the probe request body
    pub const APPLICATION: &str = "application";
    pub const APP_ID: &str = "app-id";
    pub const REQUIRED_RTT: &str = "required-RTT";
    pub const REQUIRED_CACHE_FILES: &str = "required-files";
    pub const REQUIRED_CACHE_URLS: &str = "required-URLs";
    pub const REQUIRED_MIN_CPU_CLOCK: &str = "required-cpu-clocks";

    // Weighted preference is an extension point only; no built-in
    // strategy reads these.
    pub const WEIGHT_RTT: &str = "weight-RTT";
    pub const WEIGHT_CACHE: &str = "weight-cache";
    pub const WEIGHT_RESOURCE: &str = "weight-resource";
}

/// Mobile client descriptor keys
pub mod client {
    pub const LATITUDE: &str = "GPS_latitude";
    pub const LONGITUDE: &str = "GPS_longitude";
    pub const IP_ADDRESS: &str = "ip_address";
    pub const NETWORK_TYPE: &str = "network_type";
}

/// Cloudlet resource keys returned by a probe
pub mod resource {
    // static resource
    pub const TOTAL_CPU_NUMBER: &str = "total_cpu_num";
    pub const TOTAL_MEM_MB: &str = "total_mem_mb";
    pub const CLOCK_SPEED: &str = "cpu_clock_speed_mhz";

    // dynamic resource
    pub const TOTAL_CPU_PERCENT: &str = "total_cpu_usage_percent";
    pub const TOTAL_MEM_FREE_MB: &str = "total_free_memory_mb";
    pub const RTT_BETWEEN_CLIENT: &str = "dynamic_RTT";

    // cache status
    pub const APP_CACHE_FILES: &str = "app_cache_files";
    pub const APP_CACHE_URLS: &str = "app_cache_urls";
    pub const APP_CACHE_TOTAL_SCORE: &str = "app_cache_total_score";
}

/// Directory server response keys
pub mod directory {
    pub const CLOUDLET_LIST: &str = "cloudlet";
    pub const IP_ADDRESS: &str = "ip_address";
    pub const REST_API_PORT: &str = "rest_api_port";
    pub const REST_API_URL: &str = "rest_api_url";
}
