//! Self-signed P-256 certificates for unit tests.

use const_oid::db::rfc4519::{C, CN, O, SERIAL_NUMBER};
use const_oid::db::rfc5912::ECDSA_WITH_SHA_256;
use const_oid::{AssociatedOid, ObjectIdentifier};
use der::asn1::{BitString, GeneralizedTime, Ia5String, OctetString, SetOfVec};
use der::{Any, Decode, Encode, Tag};
use p256::ecdsa::signature::Signer;
use p256::pkcs8::EncodePublicKey;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use std::time::Duration;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{AccessDescription, AuthorityInfoAccessSyntax, SubjectAltName};
use x509_cert::ext::Extension;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

/// 2020-01-01T00:00:00Z
pub const JAN_2020: u64 = 1_577_836_800;
/// 2040-01-01T00:00:00Z
pub const JAN_2040: u64 = 2_208_988_800;

pub struct CertParams<'a> {
    pub issuer_cn: Option<&'a str>,
    pub subject_serial: Option<&'a str>,
    pub organization: Option<&'a str>,
    pub email: Option<&'a str>,
    pub ocsp_urls: &'a [&'a str],
    pub not_before: u64,
    pub not_after: u64,
}

impl Default for CertParams<'_> {
    fn default() -> Self {
        Self {
            issuer_cn: Some("AC Pruebas Facturae"),
            subject_serial: Some("IDCES-12345678Z"),
            organization: Some("Empresa de Prueba SL"),
            email: None,
            ocsp_urls: &[],
            not_before: JAN_2020,
            not_after: JAN_2040,
        }
    }
}

/// Build a Name from (attribute, UTF8String value) pairs in encoding order.
pub fn name(attrs: &[(ObjectIdentifier, &str)]) -> Name {
    let rdns = attrs
        .iter()
        .map(|(oid, value)| {
            let atv = AttributeTypeAndValue {
                oid: *oid,
                value: Any::new(Tag::Utf8String, value.as_bytes().to_vec()).unwrap(),
            };
            RelativeDistinguishedName(SetOfVec::try_from(vec![atv]).unwrap())
        })
        .collect();
    RdnSequence(rdns)
}

fn extension<T: AssociatedOid + Encode>(value: &T) -> Extension {
    Extension {
        extn_id: T::OID,
        critical: false,
        extn_value: OctetString::new(value.to_der().unwrap()).unwrap(),
    }
}

fn time(secs: u64) -> Time {
    Time::GeneralTime(GeneralizedTime::from_unix_duration(Duration::from_secs(secs)).unwrap())
}

pub fn build(params: &CertParams<'_>) -> Certificate {
    let key = p256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng);
    let spki_der = key.verifying_key().to_public_key_der().unwrap();

    let mut issuer = vec![(C, "ES"), (O, "Autoridad de Prueba")];
    if let Some(cn) = params.issuer_cn {
        issuer.push((CN, cn));
    }
    let mut subject = vec![(C, "ES")];
    if let Some(org) = params.organization {
        subject.push((O, org));
    }
    if let Some(serial) = params.subject_serial {
        subject.push((SERIAL_NUMBER, serial));
    }
    subject.push((CN, "JUAN ESPAÑOL GARCIA"));

    let mut extensions = Vec::new();
    if let Some(email) = params.email {
        let san = SubjectAltName(vec![GeneralName::Rfc822Name(Ia5String::new(email).unwrap())]);
        extensions.push(extension(&san));
    }
    if !params.ocsp_urls.is_empty() {
        let aia = AuthorityInfoAccessSyntax(
            params
                .ocsp_urls
                .iter()
                .map(|url| AccessDescription {
                    access_method: ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1"),
                    access_location: GeneralName::UniformResourceIdentifier(
                        Ia5String::new(url).unwrap(),
                    ),
                })
                .collect(),
        );
        extensions.push(extension(&aia));
    }

    let algorithm = AlgorithmIdentifierOwned {
        oid: ECDSA_WITH_SHA_256,
        parameters: None,
    };
    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(&[0x01, 0x00, 0x01]).unwrap(),
        signature: algorithm.clone(),
        issuer: name(&issuer),
        validity: Validity {
            not_before: time(params.not_before),
            not_after: time(params.not_after),
        },
        subject: name(&subject),
        subject_public_key_info: SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes()).unwrap(),
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: if extensions.is_empty() {
            None
        } else {
            Some(extensions)
        },
    };
    let signature: p256::ecdsa::DerSignature = key.sign(&tbs_certificate.to_der().unwrap());
    Certificate {
        tbs_certificate,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(signature.as_bytes()).unwrap(),
    }
}
