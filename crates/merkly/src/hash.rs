//! Digest type and the combiner seam used by every tree operation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Digest as _;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use tracing::warn;

use crate::{MerkleError, MerkleResult, HASH_LENGTH};

/// Output of a combiner. Opaque bytes, compared by byte equality.
///
/// Digests are variable length so that any combiner can be plugged in. At textual
/// boundaries (display, serde) they are rendered as lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, bincode::Encode, bincode::Decode)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// Create a new Digest from owned bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Create a Digest from hex string
    pub fn from_hex(hex_str: &str) -> MerkleResult<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)
            .map_err(|e| MerkleError::InvalidHex(format!("{}: {}", hex_str, e)))?;
        Ok(Self(bytes))
    }

    /// Lowercase hex, no prefix
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Digest {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<[u8; HASH_LENGTH]> for Digest {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Digest {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A two-argument hash merging two child digests into their parent.
///
/// Any `Fn(&[u8], &[u8]) -> Vec<u8>` is a combiner, so callers can plug in their own
/// hash without defining a type:
///
/// ```
/// use merkly::{Combiner, Digest};
///
/// let concat = |x: &[u8], y: &[u8]| [x, y].concat();
/// assert_eq!(concat.combine(b"ab", b"cd"), Digest::from("abcd"));
/// ```
pub trait Combiner {
    /// Merge `left` and `right`, in that operand order.
    fn combine(&self, left: &[u8], right: &[u8]) -> Digest;

    /// Digest a raw leaf. Defaults to combining the leaf with an empty right operand.
    fn hash_leaf(&self, raw: &[u8]) -> Digest {
        self.combine(raw, &[])
    }

    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        "custom"
    }

    /// Fixed digest width, if the combiner has one.
    fn output_len(&self) -> Option<usize> {
        None
    }
}

impl<F> Combiner for F
where
    F: Fn(&[u8], &[u8]) -> Vec<u8>,
{
    fn combine(&self, left: &[u8], right: &[u8]) -> Digest {
        Digest(self(left, right))
    }
}

/// Built-in combiners. Each hashes `left || right`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    #[serde(rename = "keccak256")]
    Keccak256,
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "blake3")]
    Blake3,
    /// Keccak-256 whose digests are lowercase ASCII hex text rather than raw bytes.
    /// Parents hash the concatenated hex of their children.
    #[serde(rename = "keccak256-hex")]
    Keccak256Hex,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Keccak256,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Blake3,
        HashAlgorithm::Keccak256Hex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Keccak256 => "keccak256",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha3_256 => "sha3-256",
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Keccak256Hex => "keccak256-hex",
        }
    }
}

impl Combiner for HashAlgorithm {
    fn combine(&self, left: &[u8], right: &[u8]) -> Digest {
        match self {
            HashAlgorithm::Keccak256 => Digest(keccak256(left, right).to_vec()),
            HashAlgorithm::Sha256 => {
                let mut hasher = sha2::Sha256::new();
                hasher.update(left);
                hasher.update(right);
                Digest(hasher.finalize().to_vec())
            }
            HashAlgorithm::Sha3_256 => {
                let mut hasher = sha3::Sha3_256::new();
                hasher.update(left);
                hasher.update(right);
                Digest(hasher.finalize().to_vec())
            }
            HashAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(left);
                hasher.update(right);
                Digest(hasher.finalize().as_bytes().to_vec())
            }
            HashAlgorithm::Keccak256Hex => Digest(hex::encode(keccak256(left, right)).into_bytes()),
        }
    }

    fn name(&self) -> &str {
        self.as_str()
    }

    fn output_len(&self) -> Option<usize> {
        match self {
            HashAlgorithm::Keccak256Hex => Some(HASH_LENGTH * 2),
            _ => Some(HASH_LENGTH),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        HashAlgorithm::ALL
            .into_iter()
            .find(|algo| algo.as_str() == name)
            .ok_or_else(|| MerkleError::InvalidConfig(format!("unknown hash algorithm: {}", s)))
    }
}

fn keccak256(left: &[u8], right: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = sha3::Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    let result = hasher.finalize();
    let mut bytes = [0u8; HASH_LENGTH];
    bytes.copy_from_slice(&result);
    bytes
}

/// Inputs the combiner is probed with at tree construction.
const PROBES: [(&[u8], &[u8]); 2] = [(b"", b""), (b"merkly-left", b"merkly-right")];

/// Probe a combiner once before it is trusted with a tree.
///
/// The signature is already enforced by the type system; this catches combiners that
/// panic, are not deterministic, or break their declared digest width.
///
/// Panics are caught by unwinding: the panic hook still reports them on stderr, and a
/// build with `panic = "abort"` terminates instead of returning `InvalidHashFunction`.
pub fn validate_combiner<C: Combiner + ?Sized>(combiner: &C) -> MerkleResult<()> {
    let result = probe(combiner);
    if let Err(ref e) = result {
        warn!(combiner = combiner.name(), error = %e, "Rejected combiner");
    }
    result
}

fn probe<C: Combiner + ?Sized>(combiner: &C) -> MerkleResult<()> {
    for (left, right) in PROBES {
        let run = || {
            catch_unwind(AssertUnwindSafe(|| combiner.combine(left, right))).map_err(|_| {
                MerkleError::InvalidHashFunction(format!(
                    "{} panicked while combining probe input",
                    combiner.name()
                ))
            })
        };
        let first = run()?;
        let second = run()?;

        if first != second {
            return Err(MerkleError::InvalidHashFunction(format!(
                "{} is not deterministic: {} != {}",
                combiner.name(),
                first,
                second
            )));
        }

        if let Some(expected) = combiner.output_len() {
            if first.len() != expected {
                return Err(MerkleError::InvalidHashFunction(format!(
                    "{} declared {}-byte digests but produced {} bytes",
                    combiner.name(),
                    expected,
                    first.len()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_keccak_leaf_vectors() {
        let keccak = HashAlgorithm::Keccak256;
        assert_eq!(
            keccak.hash_leaf(b"a").to_hex(),
            "3ac225168df54212a25c1c01fd35bebfea408fdac2e31ddd6f80a4bbf9a5f1cb"
        );
        assert_eq!(
            keccak.hash_leaf(b"b").to_hex(),
            "b5553de315e0edf504d9150af82dafa5c4667fa618ed0a6f19c69b41166c5510"
        );
        assert_eq!(
            keccak.hash_leaf(b"").to_hex(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_combine_is_concatenation_hash() {
        // hash(l || r) must not depend on where the split falls
        for algo in HashAlgorithm::ALL {
            assert_eq!(algo.combine(b"ab", b"cd"), algo.combine(b"abc", b"d"));
            assert_eq!(algo.combine(b"abcd", b""), algo.hash_leaf(b"abcd"));
        }
    }

    #[test]
    fn test_sha3_differs_from_keccak() {
        assert_eq!(
            HashAlgorithm::Sha3_256.combine(b"a", b"b").to_hex(),
            "5c828b33397f4762922e39a60c35699d2550466a52dd15ed44da37eb0bdc61e6"
        );
        assert_ne!(
            HashAlgorithm::Sha3_256.combine(b"a", b"b"),
            HashAlgorithm::Keccak256.combine(b"a", b"b")
        );
    }

    #[test]
    fn test_keccak_hex_is_text() {
        let digest = HashAlgorithm::Keccak256Hex.hash_leaf(b"a");
        assert_eq!(
            digest.as_bytes(),
            b"3ac225168df54212a25c1c01fd35bebfea408fdac2e31ddd6f80a4bbf9a5f1cb"
        );
    }

    #[test]
    fn test_output_len() {
        for algo in HashAlgorithm::ALL {
            let digest = algo.combine(b"x", b"y");
            assert_eq!(Some(digest.len()), algo.output_len(), "{}", algo);
        }
    }

    #[test]
    fn test_digest_hex_roundtrip() {
        let digest = Digest::from_hex("0xDEADbeef").unwrap();
        assert_eq!(digest.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(digest.to_string(), "deadbeef");
        assert_eq!(format!("{:?}", digest), "Digest(deadbeef)");

        assert!(matches!(Digest::from_hex("xyz"), Err(MerkleError::InvalidHex(_))));
    }

    #[test]
    fn test_digest_serde_as_hex() {
        let digest = Digest::from(vec![0x00, 0xab]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, "\"00ab\"");
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("keccak256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Keccak256);
        assert_eq!(" SHA3-256 ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha3_256);
        assert!(matches!(
            "md5".parse::<HashAlgorithm>(),
            Err(MerkleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_closure_is_combiner() {
        let concat = |x: &[u8], y: &[u8]| [x, y].concat();
        assert_eq!(concat.combine(b"a", b"b"), Digest::from("ab"));
        assert_eq!(concat.hash_leaf(b"a"), Digest::from("a"));
        assert_eq!(concat.name(), "custom");
        assert!(validate_combiner(&concat).is_ok());
    }

    #[test]
    fn test_builtins_pass_validation() {
        for algo in HashAlgorithm::ALL {
            assert!(validate_combiner(&algo).is_ok(), "{}", algo);
        }
    }

    #[test]
    fn test_panicking_combiner_rejected() {
        let broken = |_: &[u8], _: &[u8]| -> Vec<u8> { panic!("not a hash") };
        assert!(matches!(
            validate_combiner(&broken),
            Err(MerkleError::InvalidHashFunction(_))
        ));
    }

    #[test]
    fn test_nondeterministic_combiner_rejected() {
        let counter = Cell::new(0u8);
        let drifting = |x: &[u8], y: &[u8]| {
            counter.set(counter.get().wrapping_add(1));
            let mut out = [x, y].concat();
            out.push(counter.get());
            out
        };
        let err = validate_combiner(&drifting).unwrap_err();
        assert!(err.to_string().contains("not deterministic"));
    }

    struct Truncated;

    impl Combiner for Truncated {
        fn combine(&self, left: &[u8], right: &[u8]) -> Digest {
            let full = HashAlgorithm::Keccak256.combine(left, right);
            Digest::from(&full.as_bytes()[..16])
        }

        fn name(&self) -> &str {
            "truncated"
        }

        fn output_len(&self) -> Option<usize> {
            Some(32)
        }
    }

    #[test]
    fn test_wrong_width_rejected() {
        let err = validate_combiner(&Truncated).unwrap_err();
        assert_eq!(
            err,
            MerkleError::InvalidHashFunction(
                "truncated declared 32-byte digests but produced 16 bytes".to_string()
            )
        );
    }
}
