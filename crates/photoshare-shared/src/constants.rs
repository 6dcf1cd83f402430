/// Application name
pub const APP_NAME: &str = "photoshare";

/// Key derivation context for stored credentials (BLAKE3)
pub const KDF_CONTEXT_PASSWORD: &str = "photoshare-password-v1";

/// Random salt size in bytes (hex-encoded when stored)
pub const SALT_SIZE: usize = 8;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Maximum accepted upload size in bytes (50 MiB)
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Number of entries returned by the public activity feed
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Capacity of the live activity channel
pub const BROADCAST_CAPACITY: usize = 256;

/// Event name carried by every live activity frame
pub const EVENT_NEW_ACTIVITY: &str = "new-activity";

/// Multipart field names accepted by the upload endpoint
pub const UPLOAD_FIELD_FILE: &str = "uploadedphoto";
pub const UPLOAD_FIELD_VISIBLE_TO: &str = "visibleTo";
pub const UPLOAD_FIELD_VISIBILITY_ENABLED: &str = "visibilityEnabled";

/// Display name used when an activity's actor no longer resolves
pub const UNKNOWN_USER_NAME: &str = "Unknown";

/// Session cookie name
pub const SESSION_COOKIE: &str = "session";
