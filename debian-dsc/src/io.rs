// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Content digests and I/O helpers. */

use {
    crate::error::{DebianError, Result},
    digest::DynDigest,
    std::{
        fmt::Formatter,
        io::{BufRead, BufReader, Read},
        path::Path,
    },
};

/// Checksum flavors recorded in source control files.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ChecksumType {
    /// MD5.
    Md5,

    /// SHA-1.
    Sha1,

    /// SHA-256.
    Sha256,
}

impl ChecksumType {
    /// Emit variants in their preferred usage order.
    pub fn preferred_order() -> impl Iterator<Item = ChecksumType> {
        [Self::Sha256, Self::Sha1, Self::Md5].into_iter()
    }

    /// Name of the field in `.dsc` files holding entries of this flavor.
    pub fn source_field_name(&self) -> &'static str {
        match self {
            Self::Md5 => "Files",
            Self::Sha1 => "Checksums-Sha1",
            Self::Sha256 => "Checksums-Sha256",
        }
    }

    /// Obtain a new hasher for this checksum flavor.
    pub fn new_hasher(&self) -> Box<dyn DynDigest + Send> {
        match self {
            Self::Md5 => Box::new(md5::Md5::default()),
            Self::Sha1 => Box::new(sha1::Sha1::default()),
            Self::Sha256 => Box::new(sha2::Sha256::default()),
        }
    }
}

/// Represents a content digest.
#[derive(Clone, Eq, Hash, PartialEq, PartialOrd)]
pub enum ContentDigest {
    /// An MD5 digest.
    Md5(Vec<u8>),
    /// A SHA-1 digest.
    Sha1(Vec<u8>),
    /// A SHA-256 digest.
    Sha256(Vec<u8>),
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Md5(data) => write!(f, "Md5({})", hex::encode(data)),
            Self::Sha1(data) => write!(f, "Sha1({})", hex::encode(data)),
            Self::Sha256(data) => write!(f, "Sha256({})", hex::encode(data)),
        }
    }
}

impl ContentDigest {
    /// Create a new MD5 instance by parsing a hex digest.
    pub fn md5_hex(digest: &str) -> Result<Self> {
        Self::from_hex_digest(ChecksumType::Md5, digest)
    }

    /// Create a new SHA-1 instance by parsing a hex digest.
    pub fn sha1_hex(digest: &str) -> Result<Self> {
        Self::from_hex_digest(ChecksumType::Sha1, digest)
    }

    /// Create a new SHA-256 instance by parsing a hex digest.
    pub fn sha256_hex(digest: &str) -> Result<Self> {
        Self::from_hex_digest(ChecksumType::Sha256, digest)
    }

    /// Obtain an instance by parsing a hex string as a [ChecksumType].
    pub fn from_hex_digest(checksum: ChecksumType, digest: &str) -> Result<Self> {
        let digest = hex::decode(digest)
            .map_err(|e| DebianError::ContentDigestBadHex(digest.to_string(), e))?;

        Ok(Self::from_bytes(checksum, digest))
    }

    fn from_bytes(checksum: ChecksumType, digest: Vec<u8>) -> Self {
        match checksum {
            ChecksumType::Md5 => Self::Md5(digest),
            ChecksumType::Sha1 => Self::Sha1(digest),
            ChecksumType::Sha256 => Self::Sha256(digest),
        }
    }

    /// Obtain the digest bytes for this content digest.
    pub fn digest_bytes(&self) -> &[u8] {
        match self {
            Self::Md5(x) => x,
            Self::Sha1(x) => x,
            Self::Sha256(x) => x,
        }
    }

    /// Obtain the hex encoded content digest.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest_bytes())
    }

    /// Obtain the [ChecksumType] for this digest.
    pub fn checksum_type(&self) -> ChecksumType {
        match self {
            Self::Md5(_) => ChecksumType::Md5,
            Self::Sha1(_) => ChecksumType::Sha1,
            Self::Sha256(_) => ChecksumType::Sha256,
        }
    }
}

/// Compute the size and digest of everything readable from `reader`.
pub fn digest_reader(
    checksum: ChecksumType,
    reader: impl Read,
) -> std::io::Result<(u64, ContentDigest)> {
    let mut hasher = checksum.new_hasher();
    let mut reader = BufReader::new(reader);
    let mut size = 0u64;

    loop {
        let buf = reader.fill_buf()?;

        if buf.is_empty() {
            break;
        }

        hasher.update(buf);
        let len = buf.len();
        size += len as u64;
        reader.consume(len);
    }

    Ok((
        size,
        ContentDigest::from_bytes(checksum, hasher.finalize().to_vec()),
    ))
}

/// Compute the size and digest of a file.
///
/// Errors are reported as [DebianError::IoTransfer] bound to `path`.
pub fn digest_path(checksum: ChecksumType, path: &Path) -> Result<(u64, ContentDigest)> {
    let fh = std::fs::File::open(path).map_err(|e| DebianError::io_transfer(path, e))?;

    digest_reader(checksum, fh).map_err(|e| DebianError::io_transfer(path, e))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hex_round_trip() -> Result<()> {
        let digest = ContentDigest::md5_hex("943bed8b8d98a50c8d8a101b12693bb4")?;
        assert_eq!(digest.checksum_type(), ChecksumType::Md5);
        assert_eq!(digest.digest_hex(), "943bed8b8d98a50c8d8a101b12693bb4");
        assert!(ContentDigest::sha1_hex("zz").is_err());

        Ok(())
    }

    #[test]
    fn digest_known_values() -> Result<()> {
        let (size, digest) = digest_reader(ChecksumType::Md5, &b"hello world"[..])?;
        assert_eq!(size, 11);
        assert_eq!(digest.digest_hex(), "5eb63bbbe01eeed093cb22bb8f5acdc3");

        let (_, digest) = digest_reader(ChecksumType::Sha1, &b"hello world"[..])?;
        assert_eq!(digest.digest_hex(), "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");

        let (_, digest) = digest_reader(ChecksumType::Sha256, &b""[..])?;
        assert_eq!(
            digest.digest_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );

        Ok(())
    }
}
