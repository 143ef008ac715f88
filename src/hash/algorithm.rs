//! Hash algorithm catalogue and the streaming hasher
//!
//! `HashAlgorithm` describes an algorithm (name, digest width, family).
//! `AlgorithmRegistry` resolves user-supplied names and manifest hash
//! widths to a descriptor. `Hasher` is the closed set of streaming
//! implementations, driven through the [`StreamingHash`] trait.

use super::checksum::{hex32, Adler32, Crc32c};
use super::xxh3::XxHash3;
use super::xxh64::XxHash64;
use digest::Digest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Algorithm family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    /// MD5 / SHA family
    CryptographicDigest,
    /// CRC32, CRC32C, Adler-32
    RunningChecksum,
    /// XXH64
    XxHash64,
    /// XXH3 128-bit
    XxHash3_128,
}

/// Concrete algorithm identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmId {
    /// MD5
    Md5,
    /// SHA-1
    Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// SHA-512/224
    Sha512_224,
    /// SHA-512/256
    Sha512_256,
    /// SHA3-224
    Sha3_224,
    /// SHA3-256
    Sha3_256,
    /// SHA3-384
    Sha3_384,
    /// SHA3-512
    Sha3_512,
    /// CRC32 (IEEE)
    Crc32,
    /// CRC32C (Castagnoli)
    Crc32c,
    /// Adler-32
    Adler32,
    /// XXH64
    Xxh64,
    /// XXH3 128-bit
    Xxh3_128,
}

/// Immutable description of a supported algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HashAlgorithm {
    /// Which implementation backs this algorithm
    pub id: AlgorithmId,
    /// Canonical display name
    pub name: &'static str,
    /// Length of the lowercase hex digest
    pub hex_len: usize,
    /// Family
    pub kind: AlgorithmKind,
}

impl HashAlgorithm {
    /// Whether `hex` has this algorithm's width and only hex digits
    pub fn accepts(&self, hex: &str) -> bool {
        hex.len() == self.hex_len && hex.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Whether the seed changes the output (xxHash family only)
    pub fn uses_seed(&self) -> bool {
        matches!(self.kind, AlgorithmKind::XxHash64 | AlgorithmKind::XxHash3_128)
    }

    /// Create a fresh streaming context for this algorithm
    pub fn hasher(&self, seed: u64) -> Hasher {
        Hasher::new(self.id, seed)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Algorithm used when none is configured for create/update
pub const DEFAULT_ALGORITHM: HashAlgorithm = HashAlgorithm {
    id: AlgorithmId::Sha256,
    name: "SHA-256",
    hex_len: 64,
    kind: AlgorithmKind::CryptographicDigest,
};

struct RegistryEntry {
    algorithm: HashAlgorithm,
    aliases: &'static [&'static str],
    auto_detect: bool,
}

const fn entry(
    id: AlgorithmId,
    name: &'static str,
    hex_len: usize,
    kind: AlgorithmKind,
    aliases: &'static [&'static str],
    auto_detect: bool,
) -> RegistryEntry {
    RegistryEntry {
        algorithm: HashAlgorithm { id, name, hex_len, kind },
        aliases,
        auto_detect,
    }
}

/// Lookup table from names and hex widths to algorithms.
///
/// Built once at startup and passed to whatever needs it.
pub struct AlgorithmRegistry {
    entries: Vec<RegistryEntry>,
}

impl AlgorithmRegistry {
    /// The standard catalogue
    pub fn standard() -> Self {
        use AlgorithmId as Id;
        use AlgorithmKind as Kind;

        // Widths collide (xxHash vs MD5, SHA-3 vs SHA-2), so only MD5, SHA-1
        // and the plain SHA-2 digests take part in width detection.
        let entries = vec![
            entry(Id::Md5, "MD5", 32, Kind::CryptographicDigest, &["MD5"], true),
            entry(Id::Sha1, "SHA-1", 40, Kind::CryptographicDigest, &["SHA1", "SHA-1"], true),
            entry(Id::Sha224, "SHA-224", 56, Kind::CryptographicDigest, &["SHA224", "SHA-224"], true),
            RegistryEntry {
                algorithm: DEFAULT_ALGORITHM,
                aliases: &["SHA256", "SHA-256"],
                auto_detect: true,
            },
            entry(Id::Sha384, "SHA-384", 96, Kind::CryptographicDigest, &["SHA384", "SHA-384"], true),
            entry(Id::Sha512, "SHA-512", 128, Kind::CryptographicDigest, &["SHA512", "SHA-512"], true),
            entry(
                Id::Sha512_224,
                "SHA-512/224",
                56,
                Kind::CryptographicDigest,
                &["SHA-512/224", "SHA512/224", "SHA-512_224", "SHA512_224"],
                false,
            ),
            entry(
                Id::Sha512_256,
                "SHA-512/256",
                64,
                Kind::CryptographicDigest,
                &["SHA-512/256", "SHA512/256", "SHA-512_256", "SHA512_256"],
                false,
            ),
            entry(Id::Sha3_224, "SHA3-224", 56, Kind::CryptographicDigest, &["SHA3-224", "SHA3_224"], false),
            entry(Id::Sha3_256, "SHA3-256", 64, Kind::CryptographicDigest, &["SHA3-256", "SHA3_256"], false),
            entry(Id::Sha3_384, "SHA3-384", 96, Kind::CryptographicDigest, &["SHA3-384", "SHA3_384"], false),
            entry(Id::Sha3_512, "SHA3-512", 128, Kind::CryptographicDigest, &["SHA3-512", "SHA3_512"], false),
            entry(Id::Crc32, "CRC32", 8, Kind::RunningChecksum, &["CRC32", "CRC-32"], false),
            entry(Id::Crc32c, "CRC32C", 8, Kind::RunningChecksum, &["CRC32C", "CRC-32C"], false),
            entry(Id::Adler32, "ADLER32", 8, Kind::RunningChecksum, &["ADLER32", "ADLER-32"], false),
            entry(
                Id::Xxh64,
                "XXH64",
                16,
                Kind::XxHash64,
                &["XX", "XX64", "XXH64", "XXHASH64"],
                false,
            ),
            entry(
                Id::Xxh3_128,
                "XXH3-128",
                32,
                Kind::XxHash3_128,
                &["XX128", "XXH128", "XXHASH128", "XXH3_128", "XXH3-128"],
                false,
            ),
        ];

        Self { entries }
    }

    /// Resolve a user-supplied name (case-insensitive, aliases allowed)
    pub fn by_name(&self, name: &str) -> Option<HashAlgorithm> {
        let wanted = name.trim().to_ascii_uppercase();
        self.entries
            .iter()
            .find(|e| e.aliases.iter().any(|alias| *alias == wanted))
            .map(|e| e.algorithm)
    }

    /// Infer an algorithm from the width of a hex digest
    pub fn by_hex_len(&self, hex_len: usize) -> Option<HashAlgorithm> {
        self.entries
            .iter()
            .find(|e| e.auto_detect && e.algorithm.hex_len == hex_len)
            .map(|e| e.algorithm)
    }

    /// Canonical algorithm by identity
    pub fn get(&self, id: AlgorithmId) -> Option<HashAlgorithm> {
        self.entries
            .iter()
            .find(|e| e.algorithm.id == id)
            .map(|e| e.algorithm)
    }

    /// All registered algorithms in catalogue order
    pub fn algorithms(&self) -> impl Iterator<Item = HashAlgorithm> + '_ {
        self.entries.iter().map(|e| e.algorithm)
    }

    /// The algorithm used when none is configured for create/update
    pub fn default_algorithm(&self) -> HashAlgorithm {
        DEFAULT_ALGORITHM
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Streaming contract shared by every implementation
pub trait StreamingHash {
    /// Feed more input
    fn update(&mut self, data: &[u8]);

    /// Finish and return the lowercase hex digest.
    ///
    /// The context is reset afterwards and can be reused for the next input.
    fn digest(&mut self) -> String;

    /// Return to the initial state without releasing owned buffers
    fn reset(&mut self);
}

/// Unified hasher over every supported algorithm
pub enum Hasher {
    /// MD5
    Md5(md5::Md5),
    /// SHA-1
    Sha1(sha1::Sha1),
    /// SHA-224
    Sha224(sha2::Sha224),
    /// SHA-256
    Sha256(sha2::Sha256),
    /// SHA-384
    Sha384(sha2::Sha384),
    /// SHA-512
    Sha512(sha2::Sha512),
    /// SHA-512/224
    Sha512_224(sha2::Sha512_224),
    /// SHA-512/256
    Sha512_256(sha2::Sha512_256),
    /// SHA3-224
    Sha3_224(sha3::Sha3_224),
    /// SHA3-256
    Sha3_256(sha3::Sha3_256),
    /// SHA3-384
    Sha3_384(sha3::Sha3_384),
    /// SHA3-512
    Sha3_512(sha3::Sha3_512),
    /// CRC32
    Crc32(crc32fast::Hasher),
    /// CRC32C
    Crc32c(Crc32c),
    /// Adler-32
    Adler32(Adler32),
    /// XXH64
    Xxh64(XxHash64),
    /// XXH3 128-bit
    Xxh3_128(XxHash3),
}

impl Hasher {
    /// Create a new hasher for the given algorithm.
    ///
    /// `seed` only affects the xxHash family.
    pub fn new(id: AlgorithmId, seed: u64) -> Self {
        match id {
            AlgorithmId::Md5 => Self::Md5(md5::Md5::new()),
            AlgorithmId::Sha1 => Self::Sha1(sha1::Sha1::new()),
            AlgorithmId::Sha224 => Self::Sha224(sha2::Sha224::new()),
            AlgorithmId::Sha256 => Self::Sha256(sha2::Sha256::new()),
            AlgorithmId::Sha384 => Self::Sha384(sha2::Sha384::new()),
            AlgorithmId::Sha512 => Self::Sha512(sha2::Sha512::new()),
            AlgorithmId::Sha512_224 => Self::Sha512_224(sha2::Sha512_224::new()),
            AlgorithmId::Sha512_256 => Self::Sha512_256(sha2::Sha512_256::new()),
            AlgorithmId::Sha3_224 => Self::Sha3_224(sha3::Sha3_224::new()),
            AlgorithmId::Sha3_256 => Self::Sha3_256(sha3::Sha3_256::new()),
            AlgorithmId::Sha3_384 => Self::Sha3_384(sha3::Sha3_384::new()),
            AlgorithmId::Sha3_512 => Self::Sha3_512(sha3::Sha3_512::new()),
            AlgorithmId::Crc32 => Self::Crc32(crc32fast::Hasher::new()),
            AlgorithmId::Crc32c => Self::Crc32c(Crc32c::new()),
            AlgorithmId::Adler32 => Self::Adler32(Adler32::new()),
            AlgorithmId::Xxh64 => Self::Xxh64(XxHash64::new(seed)),
            AlgorithmId::Xxh3_128 => Self::Xxh3_128(XxHash3::new(seed)),
        }
    }

    /// Get the algorithm this hasher implements
    pub fn id(&self) -> AlgorithmId {
        match self {
            Self::Md5(_) => AlgorithmId::Md5,
            Self::Sha1(_) => AlgorithmId::Sha1,
            Self::Sha224(_) => AlgorithmId::Sha224,
            Self::Sha256(_) => AlgorithmId::Sha256,
            Self::Sha384(_) => AlgorithmId::Sha384,
            Self::Sha512(_) => AlgorithmId::Sha512,
            Self::Sha512_224(_) => AlgorithmId::Sha512_224,
            Self::Sha512_256(_) => AlgorithmId::Sha512_256,
            Self::Sha3_224(_) => AlgorithmId::Sha3_224,
            Self::Sha3_256(_) => AlgorithmId::Sha3_256,
            Self::Sha3_384(_) => AlgorithmId::Sha3_384,
            Self::Sha3_512(_) => AlgorithmId::Sha3_512,
            Self::Crc32(_) => AlgorithmId::Crc32,
            Self::Crc32c(_) => AlgorithmId::Crc32c,
            Self::Adler32(_) => AlgorithmId::Adler32,
            Self::Xxh64(_) => AlgorithmId::Xxh64,
            Self::Xxh3_128(_) => AlgorithmId::Xxh3_128,
        }
    }

    /// Seed of an xxHash context, `None` for every other family
    pub fn seed(&self) -> Option<u64> {
        match self {
            Self::Xxh64(h) => Some(h.seed()),
            Self::Xxh3_128(h) => Some(h.seed()),
            _ => None,
        }
    }
}

impl StreamingHash for Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => Digest::update(h, data),
            Self::Sha1(h) => Digest::update(h, data),
            Self::Sha224(h) => Digest::update(h, data),
            Self::Sha256(h) => Digest::update(h, data),
            Self::Sha384(h) => Digest::update(h, data),
            Self::Sha512(h) => Digest::update(h, data),
            Self::Sha512_224(h) => Digest::update(h, data),
            Self::Sha512_256(h) => Digest::update(h, data),
            Self::Sha3_224(h) => Digest::update(h, data),
            Self::Sha3_256(h) => Digest::update(h, data),
            Self::Sha3_384(h) => Digest::update(h, data),
            Self::Sha3_512(h) => Digest::update(h, data),
            Self::Crc32(h) => h.update(data),
            Self::Crc32c(h) => h.update(data),
            Self::Adler32(h) => h.update(data),
            Self::Xxh64(h) => h.update(data),
            Self::Xxh3_128(h) => h.update(data),
        }
    }

    fn digest(&mut self) -> String {
        let hex = match self {
            Self::Md5(h) => hex::encode(h.finalize_reset()),
            Self::Sha1(h) => hex::encode(h.finalize_reset()),
            Self::Sha224(h) => hex::encode(h.finalize_reset()),
            Self::Sha256(h) => hex::encode(h.finalize_reset()),
            Self::Sha384(h) => hex::encode(h.finalize_reset()),
            Self::Sha512(h) => hex::encode(h.finalize_reset()),
            Self::Sha512_224(h) => hex::encode(h.finalize_reset()),
            Self::Sha512_256(h) => hex::encode(h.finalize_reset()),
            Self::Sha3_224(h) => hex::encode(h.finalize_reset()),
            Self::Sha3_256(h) => hex::encode(h.finalize_reset()),
            Self::Sha3_384(h) => hex::encode(h.finalize_reset()),
            Self::Sha3_512(h) => hex::encode(h.finalize_reset()),
            Self::Crc32(h) => hex32(h.clone().finalize()),
            Self::Crc32c(h) => hex32(h.value()),
            Self::Adler32(h) => hex32(h.value()),
            Self::Xxh64(h) => format!("{:016x}", h.digest()),
            Self::Xxh3_128(h) => format!("{:032x}", h.digest128()),
        };
        self.reset();
        hex
    }

    fn reset(&mut self) {
        match self {
            Self::Md5(h) => Digest::reset(h),
            Self::Sha1(h) => Digest::reset(h),
            Self::Sha224(h) => Digest::reset(h),
            Self::Sha256(h) => Digest::reset(h),
            Self::Sha384(h) => Digest::reset(h),
            Self::Sha512(h) => Digest::reset(h),
            Self::Sha512_224(h) => Digest::reset(h),
            Self::Sha512_256(h) => Digest::reset(h),
            Self::Sha3_224(h) => Digest::reset(h),
            Self::Sha3_256(h) => Digest::reset(h),
            Self::Sha3_384(h) => Digest::reset(h),
            Self::Sha3_512(h) => Digest::reset(h),
            Self::Crc32(h) => h.reset(),
            Self::Crc32c(h) => h.reset(),
            Self::Adler32(h) => h.reset(),
            Self::Xxh64(h) => h.reset(),
            Self::Xxh3_128(h) => h.reset(),
        }
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hasher").field(&self.id()).finish()
    }
}

/// Hash an in-memory buffer
pub fn hash_bytes(algorithm: &HashAlgorithm, seed: u64, data: &[u8]) -> String {
    let mut hasher = algorithm.hasher(seed);
    hasher.update(data);
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AlgorithmRegistry {
        AlgorithmRegistry::standard()
    }

    #[test]
    fn test_lookup_by_name_and_alias() {
        let reg = registry();
        assert_eq!(reg.by_name("sha256").map(|a| a.id), Some(AlgorithmId::Sha256));
        assert_eq!(reg.by_name("SHA-256").map(|a| a.id), Some(AlgorithmId::Sha256));
        assert_eq!(reg.by_name("xx").map(|a| a.id), Some(AlgorithmId::Xxh64));
        assert_eq!(reg.by_name("xxh3-128").map(|a| a.id), Some(AlgorithmId::Xxh3_128));
        assert_eq!(reg.by_name("XXH3_128").map(|a| a.id), Some(AlgorithmId::Xxh3_128));
        assert_eq!(reg.by_name("crc32c").map(|a| a.id), Some(AlgorithmId::Crc32c));
        assert_eq!(reg.by_name("sha3_512").map(|a| a.id), Some(AlgorithmId::Sha3_512));
        assert_eq!(reg.by_name("sha512/224").map(|a| a.id), Some(AlgorithmId::Sha512_224));
        assert_eq!(reg.by_name("SHA-512_256").map(|a| a.name), Some("SHA-512/256"));
        assert!(reg.by_name("whirlpool").is_none());
    }

    #[test]
    fn test_lookup_by_hex_len() {
        let reg = registry();
        assert_eq!(reg.by_hex_len(32).map(|a| a.id), Some(AlgorithmId::Md5));
        assert_eq!(reg.by_hex_len(40).map(|a| a.id), Some(AlgorithmId::Sha1));
        assert_eq!(reg.by_hex_len(64).map(|a| a.id), Some(AlgorithmId::Sha256));
        assert_eq!(reg.by_hex_len(128).map(|a| a.id), Some(AlgorithmId::Sha512));
        assert_eq!(reg.by_hex_len(56).map(|a| a.id), Some(AlgorithmId::Sha224));
        assert!(reg.by_hex_len(16).is_none());
        assert!(reg.by_hex_len(8).is_none());
    }

    #[test]
    fn test_accepts() {
        let sha1 = registry().by_name("SHA1").unwrap();
        assert!(sha1.accepts("a9993e364706816aba3e25717850c26c9cd0d89d"));
        assert!(sha1.accepts("A9993E364706816ABA3E25717850C26C9CD0D89D"));
        assert!(!sha1.accepts("a9993e"));
        assert!(!sha1.accepts("z9993e364706816aba3e25717850c26c9cd0d89d"));
    }

    #[test]
    fn test_known_digests() {
        let reg = registry();
        let cases = [
            ("MD5", "900150983cd24fb0d6963f7d28e17f72"),
            ("SHA1", "a9993e364706816aba3e25717850c26c9cd0d89d"),
            ("SHA224", "23097d223405d8228642a477bda255b32aadbce4bda0b3f7e36c9da7"),
            ("SHA256", "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"),
            ("SHA-512/256", "53048e2681941ef99b2e29b76b4c7dabe4c2d0c634fc6d46e0e2f13107e7af23"),
            ("SHA3-256", "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"),
            ("CRC32", "352441c2"),
            ("ADLER32", "024d0127"),
            ("XXH64", "44bc2cf5ad770999"),
        ];
        for (name, expected) in cases {
            let algorithm = reg.by_name(name).unwrap();
            let hex = hash_bytes(&algorithm, 0, b"abc");
            assert_eq!(hex, expected, "{}", name);
            assert_eq!(hex.len(), algorithm.hex_len);
        }
    }

    #[test]
    fn test_every_algorithm_produces_declared_width() {
        let reg = registry();
        for algorithm in reg.algorithms() {
            let hex = hash_bytes(&algorithm, 3, b"some bytes");
            assert!(algorithm.accepts(&hex), "{} gave {}", algorithm, hex);
        }
    }

    #[test]
    fn test_digest_resets_context() {
        let reg = registry();
        for algorithm in reg.algorithms() {
            let mut hasher = algorithm.hasher(0);
            hasher.update(b"first input");
            let _ = hasher.digest();
            hasher.update(b"abc");
            assert_eq!(hasher.digest(), hash_bytes(&algorithm, 0, b"abc"), "{}", algorithm);
        }
    }

    #[test]
    fn test_xxh3_hex_puts_high_word_first() {
        let algorithm = registry().by_name("XXH128").unwrap();
        let expected = xxhash_rust::xxh3::xxh3_128(b"abc");
        assert_eq!(hash_bytes(&algorithm, 0, b"abc"), format!("{:032x}", expected));
    }

    #[test]
    fn test_default_algorithm_is_registered() {
        let reg = registry();
        assert_eq!(reg.get(DEFAULT_ALGORITHM.id), Some(reg.default_algorithm()));
        assert_eq!(reg.by_name("sha-256"), Some(DEFAULT_ALGORITHM));
    }

    #[test]
    fn test_only_xxhash_uses_seed() {
        let reg = registry();
        let seeded: Vec<&str> = reg.algorithms().filter(|a| a.uses_seed()).map(|a| a.name).collect();
        assert_eq!(seeded, vec!["XXH64", "XXH3-128"]);

        let sha3 = reg.by_name("SHA3-384").unwrap();
        assert_eq!(hash_bytes(&sha3, 0, b"x"), hash_bytes(&sha3, 99, b"x"));
    }
}
