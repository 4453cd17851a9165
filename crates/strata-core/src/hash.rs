//! Content hashing for deterministic rendering verification.
//!
//! Produces a SHA-256 digest of a raster buffer's dimensions and pixel
//! data, enabling bit-exact output verification across platforms and runs.

use sha2::{Digest, Sha256};

use crate::raster::RasterBuffer;

/// A content hash digest (SHA-256, 32 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    bytes: [u8; 32],
}

impl ContentHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// The hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Compute the content hash of a raster buffer.
///
/// Dimensions are hashed along with the pixel bytes so that different-sized
/// buffers with identical data produce different hashes.
pub fn hash_raster(buf: &RasterBuffer) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(buf.width.to_le_bytes());
    hasher.update(buf.height.to_le_bytes());
    hasher.update(&buf.data);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    ContentHash::from_bytes(bytes)
}
