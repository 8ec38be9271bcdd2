#![forbid(unsafe_code)]

//! Signature value verification against a certificate's public key.

use crate::digest::DigestMethod;
use const_oid::db::rfc5912::{
    ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1,
};
use firma_core::Error;
use signature::hazmat::PrehashVerifier;
use spki::DecodePublicKey;

/// Hash used to compute the signed digest of the canonical SignedInfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Pick the hash named in a SignatureMethod URI.
    ///
    /// Matching is by substring so that both the RSA and ECDSA families are
    /// covered. Anything that mentions neither SHA-256 nor SHA-512 falls back
    /// to SHA-1.
    pub fn from_signature_method(uri: &str) -> Self {
        let uri = uri.to_ascii_lowercase();
        if uri.contains("sha256") {
            Self::Sha256
        } else if uri.contains("sha512") {
            Self::Sha512
        } else {
            Self::Sha1
        }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        DigestMethod::from(*self).compute(data)
    }

    /// The matching digest URI.
    pub fn uri(&self) -> &'static str {
        DigestMethod::from(*self).uri()
    }
}

impl From<HashAlgorithm> for DigestMethod {
    fn from(hash: HashAlgorithm) -> Self {
        match hash {
            HashAlgorithm::Sha1 => Self::Sha1,
            HashAlgorithm::Sha256 => Self::Sha256,
            HashAlgorithm::Sha512 => Self::Sha512,
        }
    }
}

/// A signer public key taken from a certificate.
#[derive(Clone)]
pub enum PublicKey {
    Rsa(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::VerifyingKey),
    EcP521(p521::ecdsa::VerifyingKey),
}

// `p521::ecdsa::VerifyingKey` does not implement `Debug`, so it cannot be derived.
impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa(k) => f.debug_tuple("Rsa").field(k).finish(),
            Self::EcP256(k) => f.debug_tuple("EcP256").field(k).finish(),
            Self::EcP384(k) => f.debug_tuple("EcP384").field(k).finish(),
            Self::EcP521(k) => f
                .debug_tuple("EcP521")
                .field(&k.to_encoded_point(false))
                .finish(),
        }
    }
}

impl PublicKey {
    /// Decode a DER SubjectPublicKeyInfo.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, Error> {
        let info = spki::SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| Error::Crypto(format!("invalid SubjectPublicKeyInfo: {e}")))?;
        let oid = info.algorithm.oid;

        let key = if oid == RSA_ENCRYPTION {
            rsa::RsaPublicKey::from_public_key_der(der)
                .map(Self::Rsa)
                .map_err(|e| Error::Crypto(format!("invalid RSA public key: {e}")))?
        } else if oid == ID_EC_PUBLIC_KEY {
            let curve = info
                .algorithm
                .parameters_oid()
                .map_err(|e| Error::Crypto(format!("EC key without named curve: {e}")))?;
            if curve == SECP_256_R_1 {
                p256::ecdsa::VerifyingKey::from_public_key_der(der)
                    .map(Self::EcP256)
                    .map_err(|e| Error::Crypto(format!("invalid P-256 public key: {e}")))?
            } else if curve == SECP_384_R_1 {
                p384::ecdsa::VerifyingKey::from_public_key_der(der)
                    .map(Self::EcP384)
                    .map_err(|e| Error::Crypto(format!("invalid P-384 public key: {e}")))?
            } else if curve == SECP_521_R_1 {
                p521::ecdsa::VerifyingKey::from_sec1_bytes(info.subject_public_key.raw_bytes())
                    .map(Self::EcP521)
                    .map_err(|e| Error::Crypto(format!("invalid P-521 public key: {e}")))?
            } else {
                return Err(Error::UnsupportedAlgorithm(format!("EC curve {curve}")));
            }
        } else {
            return Err(Error::UnsupportedAlgorithm(format!("public key algorithm {oid}")));
        };

        tracing::debug!(key = key.family(), "decoded signer public key");
        Ok(key)
    }

    pub fn family(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "RSA",
            Self::EcP256(_) => "EC P-256",
            Self::EcP384(_) => "EC P-384",
            Self::EcP521(_) => "EC P-521",
        }
    }

    /// Verify `signature` over `data` hashed with `hash`.
    ///
    /// `Ok(false)` means the signature is well formed but does not match.
    /// Malformed signature bytes are an error.
    pub fn verify(&self, hash: HashAlgorithm, data: &[u8], signature: &[u8]) -> Result<bool, Error> {
        match self {
            Self::Rsa(key) => verify_rsa(key, hash, data, signature),
            Self::EcP256(vk) => {
                let sig = decode_p256_signature(signature)?;
                Ok(vk.verify_prehash(&ec_prehash(hash, data, 32), &sig).is_ok())
            }
            Self::EcP384(vk) => {
                let sig = decode_p384_signature(signature)?;
                Ok(vk.verify_prehash(&ec_prehash(hash, data, 48), &sig).is_ok())
            }
            Self::EcP521(vk) => {
                let sig = decode_p521_signature(signature)?;
                Ok(vk.verify_prehash(&ec_prehash(hash, data, 66), &sig).is_ok())
            }
        }
    }
}

/// Digest `data` for ECDSA over a field of `field_len` bytes.
///
/// A digest shorter than the field is left-padded with zeros. The integer it
/// encodes is unchanged, and the ecdsa crate rejects prehashes shorter than
/// half the field (SHA-1 on P-384, SHA-1 and SHA-256 on P-521).
fn ec_prehash(hash: HashAlgorithm, data: &[u8], field_len: usize) -> Vec<u8> {
    let digest = hash.digest(data);
    if digest.len() >= field_len {
        return digest;
    }
    let mut padded = vec![0u8; field_len - digest.len()];
    padded.extend_from_slice(&digest);
    padded
}

fn verify_rsa(
    public_key: &rsa::RsaPublicKey,
    hash: HashAlgorithm,
    data: &[u8],
    sig_bytes: &[u8],
) -> Result<bool, Error> {
    use signature::Verifier;
    let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
        .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
    macro_rules! do_verify {
        ($hasher:ty) => {{
            let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
            Ok(vk.verify(data, &sig).is_ok())
        }};
    }
    match hash {
        HashAlgorithm::Sha1 => do_verify!(sha1::Sha1),
        HashAlgorithm::Sha256 => do_verify!(sha2::Sha256),
        HashAlgorithm::Sha512 => do_verify!(sha2::Sha512),
    }
}

/// XML-DSig carries ECDSA values as r||s. Some signers emit DER instead.
fn decode_p256_signature(bytes: &[u8]) -> Result<p256::ecdsa::Signature, Error> {
    p256::ecdsa::Signature::from_slice(bytes)
        .or_else(|_| p256::ecdsa::Signature::from_der(bytes))
        .map_err(|e| Error::Crypto(format!("invalid P-256 signature: {e}")))
}

fn decode_p384_signature(bytes: &[u8]) -> Result<p384::ecdsa::Signature, Error> {
    p384::ecdsa::Signature::from_slice(bytes)
        .or_else(|_| p384::ecdsa::Signature::from_der(bytes))
        .map_err(|e| Error::Crypto(format!("invalid P-384 signature: {e}")))
}

fn decode_p521_signature(bytes: &[u8]) -> Result<p521::ecdsa::Signature, Error> {
    p521::ecdsa::Signature::from_slice(bytes)
        .or_else(|_| p521::ecdsa::Signature::from_der(bytes))
        .map_err(|e| Error::Crypto(format!("invalid P-521 signature: {e}")))
}
