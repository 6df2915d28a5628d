//! Seed material generation
//!
//! Seeds come from the operating system CSPRNG. A failed read is retried once
//! and then reported; there is no weaker fallback source.

use crate::errors::{GameError, GameResult};
use rand_core::{OsRng, RngCore};
use std::sync::Arc;

/// Default seed size in bytes (64 hex characters)
pub const DEFAULT_SEED_BYTES: usize = 32;

/// Source of cryptographically secure random bytes
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand_core::Error>;
}

/// Operating system randomness (`getrandom`)
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

/// Produces hex-encoded seeds of a fixed length
#[derive(Clone)]
pub struct SeedGenerator {
    source: Arc<dyn EntropySource>,
    byte_length: usize,
}

impl SeedGenerator {
    /// Generator backed by the OS CSPRNG
    pub fn new(byte_length: usize) -> Self {
        Self::with_source(Arc::new(OsEntropy), byte_length)
    }

    pub fn with_source(source: Arc<dyn EntropySource>, byte_length: usize) -> Self {
        Self {
            source,
            byte_length,
        }
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// Draw a fresh seed, `2 * byte_length` hex characters long
    pub fn generate(&self) -> GameResult<String> {
        let mut bytes = vec![0u8; self.byte_length];

        if let Err(first) = self.source.fill(&mut bytes) {
            tracing::warn!("Entropy source read failed, retrying once: {}", first);
            if let Err(second) = self.source.fill(&mut bytes) {
                tracing::error!("Entropy source unavailable: {}", second);
                return Err(GameError::EntropySourceFailure(second.to_string()));
            }
        }

        Ok(hex::encode(bytes))
    }
}

impl Default for SeedGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED_BYTES)
    }
}

impl std::fmt::Debug for SeedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedGenerator")
            .field("byte_length", &self.byte_length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::num::NonZeroU32;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` reads, then fills with a counter byte
    pub(crate) struct FlakySource {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakySource {
        pub(crate) fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EntropySource for FlakySource {
        fn fill(&self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                let code = NonZeroU32::new(rand_core::Error::CUSTOM_START).unwrap();
                return Err(rand_core::Error::from(code));
            }
            dest.fill(call as u8);
            Ok(())
        }
    }

    #[test]
    fn test_seed_length_and_alphabet() {
        let generator = SeedGenerator::default();
        let seed = generator.generate().unwrap();
        assert_eq!(seed.len(), 2 * DEFAULT_SEED_BYTES);
        assert!(seed.chars().all(|c| c.is_ascii_hexdigit()));

        let short = SeedGenerator::new(16).generate().unwrap();
        assert_eq!(short.len(), 32);
    }

    #[test]
    fn test_consecutive_seeds_differ() {
        let generator = SeedGenerator::default();
        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_single_failure_is_retried() {
        let source = Arc::new(FlakySource::new(1));
        let generator = SeedGenerator::with_source(source.clone(), 4);
        let seed = generator.generate().expect("retry should succeed");
        assert_eq!(seed, "01010101");
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn test_repeated_failure_is_fatal() {
        let source = Arc::new(FlakySource::new(2));
        let generator = SeedGenerator::with_source(source.clone(), 4);
        match generator.generate() {
            Err(GameError::EntropySourceFailure(_)) => {}
            other => panic!("Expected entropy failure, got {:?}", other),
        }
        assert_eq!(source.calls(), 2);
    }
}
