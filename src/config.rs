//! Configuration for the object store
//!
//! Every setting is store-wide; nothing is chosen per object.

/// Default zstd compression level
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Store-wide settings for an [`ObjectStore`](crate::ObjectStore)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// zstd level used when writing objects
    pub compression_level: i32,

    /// Embed the zstd content checksum in each object
    pub checksum: bool,

    /// fsync the temp file before it is renamed into place
    pub fsync: bool,

    /// On `put` of an object that already exists, read it back and
    /// rewrite it if it fails verification
    pub verify_existing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            checksum: true,
            fsync: true,
            verify_existing: false,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the zstd level, clamped to the range the codec supports
    pub fn compression_level(mut self, level: i32) -> Self {
        let range = zstd::compression_level_range();
        self.config.compression_level = level.clamp(*range.start(), *range.end());
        self
    }

    pub fn checksum(mut self, enabled: bool) -> Self {
        self.config.checksum = enabled;
        self
    }

    pub fn fsync(mut self, enabled: bool) -> Self {
        self.config.fsync = enabled;
        self
    }

    pub fn verify_existing(mut self, enabled: bool) -> Self {
        self.config.verify_existing = enabled;
        self
    }

    /// Build the final config
    pub fn build(self) -> StoreConfig {
        self.config
    }
}
