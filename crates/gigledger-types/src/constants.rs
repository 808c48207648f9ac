//! System-wide constants for the GigLedger protocol.

/// First identifier handed out by the service registry.
pub const FIRST_SERVICE_ID: u64 = 1;

/// First identifier handed out by the receipt token ledger.
pub const FIRST_TOKEN_ID: u64 = 1;

/// Default maximum length of a service title, in characters.
pub const DEFAULT_MAX_TITLE_LEN: usize = 120;

/// Default maximum length of a free-text location, in characters.
pub const DEFAULT_MAX_LOCATION_LEN: usize = 256;

/// Default minimum escrow amount, in the smallest representable unit (1e-18).
pub const DEFAULT_MIN_AMOUNT_SCALE: u32 = 18;

/// Default polling interval for the client, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Default gateway prefix for retrieval URLs of stored content.
pub const DEFAULT_GATEWAY_URL: &str = "ipfs://";

/// Default maximum upload size for the content store (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Number of intermediate points the straight-line router interpolates.
pub const DEFAULT_ROUTE_SEGMENTS: usize = 16;

/// Mean Earth radius in metres, used for haversine distances.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol name.
pub const PROTOCOL_NAME: &str = "GigLedger";
