#![forbid(unsafe_code)]

//! `ds:DigestMethod` algorithms used by reference digests.

use ::digest::Digest;
use firma_core::{algorithm, Error};

/// A digest algorithm named by a `DigestMethod/@Algorithm` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMethod {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestMethod {
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        Ok(match uri {
            algorithm::SHA1 => Self::Sha1,
            algorithm::SHA224 => Self::Sha224,
            algorithm::SHA256 => Self::Sha256,
            algorithm::SHA384 => Self::Sha384,
            algorithm::SHA512 => Self::Sha512,
            _ => return Err(Error::UnsupportedAlgorithm(format!("digest method {uri}"))),
        })
    }

    pub fn uri(&self) -> &'static str {
        match self {
            Self::Sha1 => algorithm::SHA1,
            Self::Sha224 => algorithm::SHA224,
            Self::Sha256 => algorithm::SHA256,
            Self::Sha384 => algorithm::SHA384,
            Self::Sha512 => algorithm::SHA512,
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    pub fn compute(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => sha1::Sha1::digest(data).to_vec(),
            Self::Sha224 => sha2::Sha224::digest(data).to_vec(),
            Self::Sha256 => sha2::Sha256::digest(data).to_vec(),
            Self::Sha384 => sha2::Sha384::digest(data).to_vec(),
            Self::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }
}

/// Digest `data` with the algorithm named by `uri`.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    Ok(DigestMethod::from_uri(uri)?.compute(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            hex(&digest(algorithm::SHA256, b"factura").unwrap()),
            hex(&sha2::Sha256::digest(b"factura"))
        );
        assert_eq!(
            hex(&digest(algorithm::SHA1, b"abc").unwrap()),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hex(&digest(algorithm::SHA256, b"abc").unwrap()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_output_lengths() {
        for method in [
            DigestMethod::Sha1,
            DigestMethod::Sha224,
            DigestMethod::Sha256,
            DigestMethod::Sha384,
            DigestMethod::Sha512,
        ] {
            assert_eq!(DigestMethod::from_uri(method.uri()).unwrap(), method);
            assert_eq!(method.compute(b"x").len(), method.output_len());
        }
    }

    #[test]
    fn test_md5_rejected() {
        let err = digest("http://www.w3.org/2001/04/xmldsig-more#md5", b"x");
        assert!(matches!(err, Err(Error::UnsupportedAlgorithm(_))));
    }
}
