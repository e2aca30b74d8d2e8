//! Shared constants for test infrastructure

use std::time::Duration;

// Component ids
pub const SKIN_ID: &str = "skin.auramod";
pub const PLUGIN_ID: &str = "plugin.video.netflix";

// Versions as written in addon.xml
pub const VERSION_2_0_9: &str = "2.0.9";
pub const VERSION_2_1_0: &str = "2.1.0";

// Release tags
pub const TAG_V1_0: &str = "v1.0";
pub const TAG_V2_1_0: &str = "v2.1.0";

// Timings kept short so tests run in real time
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);
pub const PRIMARY_TIMEOUT: Duration = Duration::from_millis(150);
pub const FALLBACK_TIMEOUT: Duration = Duration::from_millis(150);

pub const FAKE_ARCHIVE_CONTENT: &[u8] = b"fake archive content for testing";
