//! Signed Facturae fixtures for end-to-end tests.
//!
//! Documents are signed the way Facturae signers do it: an enveloped
//! `ds:Signature` with exclusive C14N, a whole-document reference and, for
//! XAdES, a second reference over `xades:SignedProperties`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use const_oid::db::rfc4519::{C, CN, O, SERIAL_NUMBER};
use const_oid::db::rfc5912::{ECDSA_WITH_SHA_256, SHA_256_WITH_RSA_ENCRYPTION};
use const_oid::{AssociatedOid, ObjectIdentifier};
use der::asn1::{BitString, GeneralizedTime, Ia5String, OctetString, SetOfVec};
use der::{Any, Decode, Encode, Tag};
use firma_c14n::C14nMode;
use firma_core::{algorithm, ns};
use firma_xml::NodeSet;
use rsa::pkcs8::EncodePublicKey;
use signature::{SignatureEncoding, Signer};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use std::sync::OnceLock;
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

pub const SIGNER_EMAIL: &str = "juan@example.es";

/// Unsigned properties that make a signature XAdES-XL.
pub const XL_UNSIGNED: &str = "<xades:SignatureTimeStamp><xades:EncapsulatedTimeStamp>MIIBdGVzdA==</xades:EncapsulatedTimeStamp></xades:SignatureTimeStamp><xades:CompleteCertificateRefs/><xades:CompleteRevocationRefs/>";

const DOCUMENT_DIGEST: &str = "@DOCUMENT_DIGEST@";
const PROPERTIES_DIGEST: &str = "@PROPERTIES_DIGEST@";
const SIGNATURE_VALUE: &str = "@SIGNATURE_VALUE@";

pub enum TestKey {
    Rsa(rsa::RsaPrivateKey),
    P256(p256::ecdsa::SigningKey),
}

impl TestKey {
    /// A 1024-bit RSA key, generated once per test binary.
    pub fn rsa() -> Self {
        static KEY: OnceLock<rsa::RsaPrivateKey> = OnceLock::new();
        let key = KEY.get_or_init(|| rsa::RsaPrivateKey::new(&mut rand::rngs::OsRng, 1024).unwrap());
        Self::Rsa(key.clone())
    }

    pub fn p256() -> Self {
        Self::P256(p256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng))
    }

    pub fn signature_method(&self) -> &'static str {
        match self {
            Self::Rsa(_) => algorithm::RSA_SHA256,
            Self::P256(_) => algorithm::ECDSA_SHA256,
        }
    }

    /// XML-DSig signature bytes: PKCS#1 v1.5 for RSA, raw r||s for ECDSA.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Rsa(key) => {
                let signer = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(key.clone());
                signer.sign(data).to_vec()
            }
            Self::P256(key) => {
                let sig: p256::ecdsa::Signature = key.sign(data);
                sig.to_bytes().to_vec()
            }
        }
    }

    /// X.509 signature bytes: DER-encoded for ECDSA.
    fn sign_certificate(&self, tbs: &[u8]) -> Vec<u8> {
        match self {
            Self::Rsa(_) => self.sign(tbs),
            Self::P256(key) => {
                let sig: p256::ecdsa::DerSignature = key.sign(tbs);
                sig.to_vec()
            }
        }
    }

    fn certificate_algorithm(&self) -> AlgorithmIdentifierOwned {
        let oid = match self {
            Self::Rsa(_) => SHA_256_WITH_RSA_ENCRYPTION,
            Self::P256(_) => ECDSA_WITH_SHA_256,
        };
        AlgorithmIdentifierOwned {
            oid,
            parameters: None,
        }
    }

    fn spki(&self) -> SubjectPublicKeyInfoOwned {
        let der = match self {
            Self::Rsa(key) => key.to_public_key().to_public_key_der().unwrap(),
            Self::P256(key) => key.verifying_key().to_public_key_der().unwrap(),
        };
        SubjectPublicKeyInfoOwned::from_der(der.as_bytes()).unwrap()
    }
}

pub struct CertParams<'a> {
    pub not_before: u64,
    pub not_after: u64,
    pub ocsp_urls: &'a [&'a str],
}

impl Default for CertParams<'_> {
    fn default() -> Self {
        Self {
            not_before: JAN_2020,
            not_after: JAN_2040,
            ocsp_urls: &[],
        }
    }
}

fn name(attrs: &[(ObjectIdentifier, &str)]) -> Name {
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

/// A self-signed signer certificate for `key`.
pub fn certificate(key: &TestKey, params: &CertParams<'_>) -> Certificate {
    let mut extensions = vec![extension(&SubjectAltName(vec![GeneralName::Rfc822Name(
        Ia5String::new(SIGNER_EMAIL).unwrap(),
    )]))];
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

    let algorithm = key.certificate_algorithm();
    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(&[0x01, 0x00, 0x01]).unwrap(),
        signature: algorithm.clone(),
        issuer: name(&[
            (C, "ES"),
            (O, "Autoridad de Prueba"),
            (CN, "AC Pruebas Facturae"),
        ]),
        validity: Validity {
            not_before: time(params.not_before),
            not_after: time(params.not_after),
        },
        subject: name(&[
            (C, "ES"),
            (O, "Empresa de Prueba SL"),
            (SERIAL_NUMBER, "IDCES-12345678Z"),
            (CN, "JUAN ESPAÑOL GARCIA"),
        ]),
        subject_public_key_info: key.spki(),
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: Some(extensions),
    };
    let signature = key.sign_certificate(&tbs_certificate.to_der().unwrap());
    Certificate {
        tbs_certificate,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(&signature).unwrap(),
    }
}

/// XAdES qualifying properties to embed in the signature.
pub struct Xades<'a> {
    /// `xades:SigningTime` content; omitted when empty.
    pub signing_time: &'a str,
    /// Content of `xades:UnsignedSignatureProperties`; omitted when empty.
    pub unsigned: &'a str,
}

fn b64_sha256(data: &[u8]) -> String {
    STANDARD.encode(firma_crypto::digest::digest(algorithm::SHA256, data).unwrap())
}

fn qualifying_properties(xades: &Xades<'_>) -> String {
    let signing_time = if xades.signing_time.is_empty() {
        String::new()
    } else {
        format!("<xades:SigningTime>{}</xades:SigningTime>", xades.signing_time)
    };
    let unsigned = if xades.unsigned.is_empty() {
        String::new()
    } else {
        format!(
            "<xades:UnsignedProperties><xades:UnsignedSignatureProperties>{}</xades:UnsignedSignatureProperties></xades:UnsignedProperties>",
            xades.unsigned
        )
    };
    format!(
        r##"<ds:Object><xades:QualifyingProperties xmlns:xades="{xades_ns}" Target="#Signature-1"><xades:SignedProperties Id="SignedProperties-1"><xades:SignedSignatureProperties>{signing_time}</xades:SignedSignatureProperties></xades:SignedProperties>{unsigned}</xades:QualifyingProperties></ds:Object>"##,
        xades_ns = ns::XADES,
    )
}

fn reference(uri: &str, digest: &str, enveloped: bool) -> String {
    let enveloped = if enveloped {
        format!(r#"<ds:Transform Algorithm="{}"/>"#, algorithm::ENVELOPED_SIGNATURE)
    } else {
        String::new()
    };
    format!(
        r#"<ds:Reference URI="{uri}"><ds:Transforms>{enveloped}<ds:Transform Algorithm="{exc}"/></ds:Transforms><ds:DigestMethod Algorithm="{sha256}"/><ds:DigestValue>{digest}</ds:DigestValue></ds:Reference>"#,
        exc = algorithm::EXC_C14N,
        sha256 = algorithm::SHA256,
    )
}

/// A Facturae 3.2.2 invoice carrying an enveloped signature by `key` over
/// `cert`.
pub fn signed_invoice(key: &TestKey, cert: &Certificate, xades: Option<&Xades<'_>>) -> String {
    let cert_b64 = STANDARD.encode(cert.to_der().unwrap());
    let mut references = reference("", DOCUMENT_DIGEST, true);
    let mut object = String::new();
    if let Some(xades) = xades {
        references.push_str(&reference("#SignedProperties-1", PROPERTIES_DIGEST, false));
        object = qualifying_properties(xades);
    }

    let template = format!(
        r#"<fe:Facturae xmlns:fe="{fe}"><FileHeader><SchemaVersion>3.2.2</SchemaVersion></FileHeader><Invoices><Invoice><Items><InvoiceLine><ItemDescription>Diseño gráfico</ItemDescription></InvoiceLine></Items><InvoiceTotal>100.00</InvoiceTotal></Invoice></Invoices><ds:Signature xmlns:ds="{ds}" Id="Signature-1"><ds:SignedInfo><ds:CanonicalizationMethod Algorithm="{exc}"/><ds:SignatureMethod Algorithm="{method}"/>{references}</ds:SignedInfo><ds:SignatureValue>{SIGNATURE_VALUE}</ds:SignatureValue><ds:KeyInfo><ds:X509Data><ds:X509Certificate>{cert_b64}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>{object}</ds:Signature></fe:Facturae>"#,
        fe = ns::FACTURAE_322,
        ds = ns::DSIG,
        exc = algorithm::EXC_C14N,
        method = key.signature_method(),
    );

    let doc = firma_xml::parse(&template).unwrap();
    let signature = doc
        .descendants()
        .find(|n| n.has_tag_name((ns::DSIG, ns::node::SIGNATURE)))
        .unwrap();
    let mut node_set = NodeSet::all_without_comments(&doc);
    node_set.remove_subtree(signature);
    let body = firma_c14n::canonicalize_doc(&doc, C14nMode::Exclusive, Some(&node_set), &[]).unwrap();
    let mut xml = template.replace(DOCUMENT_DIGEST, &b64_sha256(&body));
    if let Some(props) = doc
        .descendants()
        .find(|n| n.has_tag_name((ns::XADES, "SignedProperties")))
    {
        let canonical = firma_c14n::canonicalize_subtree(props, C14nMode::Exclusive, &[]).unwrap();
        xml = xml.replace(PROPERTIES_DIGEST, &b64_sha256(&canonical));
    }

    let doc = firma_xml::parse(&xml).unwrap();
    let signed_info = doc
        .descendants()
        .find(|n| n.has_tag_name((ns::DSIG, ns::node::SIGNED_INFO)))
        .unwrap();
    let canonical = firma_c14n::canonicalize_subtree(signed_info, C14nMode::Exclusive, &[]).unwrap();
    xml.replace(SIGNATURE_VALUE, &STANDARD.encode(key.sign(&canonical)))
}

/// Replace the SignatureValue content, keeping everything else.
pub fn with_signature_value(xml: &str, value: &[u8]) -> String {
    let start = xml.find("<ds:SignatureValue>").unwrap() + "<ds:SignatureValue>".len();
    let end = xml.find("</ds:SignatureValue>").unwrap();
    format!("{}{}{}", &xml[..start], STANDARD.encode(value), &xml[end..])
}
