use sha2::{Digest as _, Sha256};
use std::fmt;

pub const DIGEST_LEN: usize = 32;

/// SHA-256 output for one segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// One-shot digest of `data`.
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Lowercase hex, two characters per byte, no separators.
pub fn digest_to_hex(digest: &Digest) -> String {
    digest.to_hex()
}

/// Terminal state of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashOutcome {
    Digest(Digest),
    Cancelled,
}

impl HashOutcome {
    pub fn digest(&self) -> Option<&Digest> {
        match self {
            HashOutcome::Digest(d) => Some(d),
            HashOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, HashOutcome::Cancelled)
    }
}

impl From<Digest> for HashOutcome {
    fn from(d: Digest) -> Self {
        HashOutcome::Digest(d)
    }
}

/// Incremental accumulator for one segment. Each worker owns its own.
#[derive(Default, Clone)]
pub struct SegmentHasher {
    inner: Sha256,
    consumed: u64,
}

impl SegmentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.consumed += chunk.len() as u64;
    }

    /// Bytes fed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Feed the terminating block and produce the digest.
    pub fn finalize_with(mut self, last: &[u8]) -> Digest {
        self.inner.update(last);
        Digest(self.inner.finalize().into())
    }
}
