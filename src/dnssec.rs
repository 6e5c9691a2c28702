// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Signing-side DNSSEC primitives.
//!
//! The zone engine consumes three things from this module: decoding of
//! private-key material ([`PrivateKey`]), construction of the zone's
//! DNSKEY record ([`make_dnskey`]), and RRSIG generation over the
//! canonical RRset form ([`SigningKey::sign_rrset`], per
//! [RFC 4034 § 3.1.8.1]). Canonical ordering of the records within the
//! RRset is this module's responsibility; the caller hands over the
//! RRset exactly as it will appear in the answer.
//!
//! Only Ed25519 ([RFC 8080]) is implemented for signing. Key material
//! is accepted in the BIND private-key file format (`Algorithm:` and
//! `PrivateKey:` lines), with the Ed25519 seed carried as base64.
//!
//! [RFC 4034 § 3.1.8.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-3.1.8.1
//! [RFC 8080]: https://datatracker.ietf.org/doc/html/rfc8080

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ring::signature::{Ed25519KeyPair, KeyPair as _};

use crate::class::Class;
use crate::name::Name;
use crate::rr::{Rdata, Record, Ttl, Type};

/// The DNSKEY flags value for a zone key ([RFC 4034 § 2.1.1]).
///
/// [RFC 4034 § 2.1.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-2.1.1
pub const FLAGS_ZONE: u16 = 0x0100;

/// The DNSKEY protocol field, which must be 3 ([RFC 4034 § 2.1.2]).
///
/// [RFC 4034 § 2.1.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-2.1.2
pub const PROTOCOL_DNSSEC: u8 = 3;

/// The TTL assigned to generated DNSKEY records.
const DNSKEY_TTL: u32 = 3600;

/// How far in the past generated signatures become valid.
const INCEPTION_OFFSET: u64 = 3600;

/// How long generated signatures stay valid.
const SIGNATURE_VALIDITY: u64 = 30 * 86400;

////////////////////////////////////////////////////////////////////////
// ALGORITHMS                                                         //
////////////////////////////////////////////////////////////////////////

/// DNSSEC algorithm numbers ([RFC 4034 App. A.1] and successors).
/// Only the algorithms in current recommended use are listed; of
/// these, only [`Ed25519`](Algorithm::Ed25519) is supported for
/// signing.
///
/// [RFC 4034 App. A.1]: https://datatracker.ietf.org/doc/html/rfc4034#appendix-A.1
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Algorithm {
    /// RSA/SHA-256 (RFC 5702)
    RsaSha256 = 8,
    /// RSA/SHA-512 (RFC 5702)
    RsaSha512 = 10,
    /// ECDSA Curve P-256 with SHA-256 (RFC 6605)
    EcdsaP256Sha256 = 13,
    /// ECDSA Curve P-384 with SHA-384 (RFC 6605)
    EcdsaP384Sha384 = 14,
    /// Ed25519 (RFC 8080)
    Ed25519 = 15,
}

impl Algorithm {
    /// Creates an `Algorithm` from its IANA number.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            _ => None,
        }
    }

    /// Returns the IANA number of the algorithm.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RsaSha256 => f.write_str("RSASHA256"),
            Self::RsaSha512 => f.write_str("RSASHA512"),
            Self::EcdsaP256Sha256 => f.write_str("ECDSAP256SHA256"),
            Self::EcdsaP384Sha384 => f.write_str("ECDSAP384SHA384"),
            Self::Ed25519 => f.write_str("ED25519"),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// PRIVATE KEYS                                                       //
////////////////////////////////////////////////////////////////////////

/// Decoded zone-signing key material.
///
/// Parsed from the BIND private-key file format via [`FromStr`]:
///
/// ```text
/// Private-key-format: v1.3
/// Algorithm: 15 (ED25519)
/// PrivateKey: ODIyNjAzODQ2MjgwODAxMjI2NDUxOTAyMDQxNDIyNjI=
/// ```
///
/// Unrecognized fields are ignored. The `PrivateKey` field must hold
/// the base64 of a 32-octet Ed25519 seed.
pub struct PrivateKey {
    algorithm: Algorithm,
    key: Ed25519KeyPair,
}

impl PrivateKey {
    /// Returns the key's algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the public key in DNSKEY wire form (for Ed25519, the
    /// raw 32-octet public key per RFC 8080 § 3).
    pub fn public_key(&self) -> &[u8] {
        self.key.public_key().as_ref()
    }

    /// Signs `data`, returning the raw signature octets.
    fn sign_data(&self, data: &[u8]) -> Vec<u8> {
        self.key.sign(data).as_ref().to_vec()
    }
}

impl FromStr for PrivateKey {
    type Err = KeyDecodeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut algorithm = None;
        let mut seed = None;
        for line in text.lines() {
            let (field, value) = match line.split_once(':') {
                Some(split) => split,
                None => continue,
            };
            let value = value.trim();
            if field.eq_ignore_ascii_case("Algorithm") {
                // The numeric value may be followed by a mnemonic in
                // parentheses, e.g. "15 (ED25519)".
                let number = value.split_whitespace().next().unwrap_or("");
                algorithm = Some(
                    number
                        .parse::<u8>()
                        .map_err(|_| KeyDecodeError::MissingAlgorithm)?,
                );
            } else if field.eq_ignore_ascii_case("PrivateKey") {
                seed = Some(
                    BASE64
                        .decode(value)
                        .map_err(|_| KeyDecodeError::InvalidBase64)?,
                );
            }
        }

        let number = algorithm.ok_or(KeyDecodeError::MissingAlgorithm)?;
        if Algorithm::from_u8(number) != Some(Algorithm::Ed25519) {
            return Err(KeyDecodeError::UnsupportedAlgorithm(number));
        }
        let seed = seed.ok_or(KeyDecodeError::MissingPrivateKey)?;
        let key = Ed25519KeyPair::from_seed_unchecked(&seed)
            .map_err(|_| KeyDecodeError::RejectedKey)?;
        Ok(Self {
            algorithm: Algorithm::Ed25519,
            key,
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // The key material stays out of debug output.
        write!(f, "PrivateKey({})", self.algorithm)
    }
}

////////////////////////////////////////////////////////////////////////
// KEY TAGS AND DNSKEY RECORDS                                        //
////////////////////////////////////////////////////////////////////////

/// Calculates the key tag of a DNSKEY ([RFC 4034 App. B]).
///
/// [RFC 4034 App. B]: https://datatracker.ietf.org/doc/html/rfc4034#appendix-B
pub fn key_tag(flags: u16, protocol: u8, algorithm: u8, public_key: &[u8]) -> u16 {
    let mut rdata = Vec::with_capacity(4 + public_key.len());
    rdata.extend_from_slice(&flags.to_be_bytes());
    rdata.push(protocol);
    rdata.push(algorithm);
    rdata.extend_from_slice(public_key);

    let mut accumulator: u32 = 0;
    for (i, &octet) in rdata.iter().enumerate() {
        if i % 2 == 0 {
            accumulator += u32::from(octet) << 8;
        } else {
            accumulator += u32::from(octet);
        }
    }
    accumulator += accumulator >> 16;
    (accumulator & 0xffff) as u16
}

/// Builds the zone-key DNSKEY record for `owner` bound to `key`.
pub fn make_dnskey(owner: Name, class: Class, key: &PrivateKey) -> Record {
    Record::new(
        owner,
        Type::DNSKEY,
        class,
        Ttl::from(DNSKEY_TTL),
        Rdata::Dnskey {
            flags: FLAGS_ZONE,
            protocol: PROTOCOL_DNSSEC,
            algorithm: key.algorithm().to_u8(),
            public_key: key.public_key().to_vec(),
        },
    )
}

////////////////////////////////////////////////////////////////////////
// RRSET SIGNING                                                      //
////////////////////////////////////////////////////////////////////////

/// A zone signing key: the DNSKEY record published at the zone apex
/// together with the private material that signs RRsets in its name.
#[derive(Debug)]
pub struct SigningKey {
    dnskey: Record,
    tag: u16,
    key: PrivateKey,
}

impl SigningKey {
    /// Creates a `SigningKey` for the zone rooted at `origin`,
    /// deriving the published DNSKEY record from `key`.
    pub fn new(origin: Name, class: Class, key: PrivateKey) -> Self {
        let dnskey = make_dnskey(origin, class, &key);
        let tag = key_tag(
            FLAGS_ZONE,
            PROTOCOL_DNSSEC,
            key.algorithm().to_u8(),
            key.public_key(),
        );
        Self { dnskey, tag, key }
    }

    /// Returns the DNSKEY record published for this key.
    pub fn dnskey(&self) -> &Record {
        &self.dnskey
    }

    /// Returns the key tag of the published DNSKEY.
    pub fn key_tag(&self) -> u16 {
        self.tag
    }

    /// Signs an RRset, producing its RRSIG record ([RFC 4034
    /// § 3.1.8.1]).
    ///
    /// All records must share one owner and type. The records are
    /// serialized to canonical wire form and sorted per
    /// [RFC 4034 § 6.3] before hashing; the caller may pass them in
    /// any order. The signature validity window is placed around the
    /// current time.
    ///
    /// [RFC 4034 § 3.1.8.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-3.1.8.1
    /// [RFC 4034 § 6.3]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.3
    pub fn sign_rrset(&self, rrset: &[Record]) -> Result<Record, SignError> {
        let first = rrset.first().ok_or(SignError::EmptyRrset)?;
        if rrset
            .iter()
            .any(|rr| rr.owner != first.owner || rr.rr_type != first.rr_type)
        {
            return Err(SignError::MixedRrset);
        }

        // The labels field excludes both the root label and a leading
        // asterisk label (RFC 4034 § 3.1.3).
        let owner = &first.owner;
        let labels = (owner.label_count() - usize::from(owner.is_wildcard())) as u8;
        let original_ttl = u32::from(first.ttl);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let inception = now.saturating_sub(INCEPTION_OFFSET) as u32;
        let expiration = (now + SIGNATURE_VALIDITY) as u32;

        // Signed data: the RRSIG RDATA through the signer's name,
        // followed by the RRset in canonical form and order.
        let mut data = Vec::new();
        data.extend_from_slice(&u16::from(first.rr_type).to_be_bytes());
        data.push(self.key.algorithm().to_u8());
        data.push(labels);
        data.extend_from_slice(&original_ttl.to_be_bytes());
        data.extend_from_slice(&expiration.to_be_bytes());
        data.extend_from_slice(&inception.to_be_bytes());
        data.extend_from_slice(&self.tag.to_be_bytes());
        self.dnskey.owner.write_wire(&mut data);

        let mut wires: Vec<Vec<u8>> = rrset.iter().map(Record::canonical_wire).collect();
        wires.sort_unstable();
        for wire in &wires {
            data.extend_from_slice(wire);
        }

        let signature = self.key.sign_data(&data);
        Ok(Record::new(
            owner.clone(),
            Type::RRSIG,
            first.class,
            first.ttl,
            Rdata::Rrsig {
                type_covered: first.rr_type,
                algorithm: self.key.algorithm().to_u8(),
                labels,
                original_ttl,
                expiration,
                inception,
                key_tag: self.tag,
                signer_name: self.dnskey.owner.clone(),
                signature,
            },
        ))
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// Errors that arise when decoding private-key material.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyDecodeError {
    /// No parseable `Algorithm` field was present.
    MissingAlgorithm,

    /// No `PrivateKey` field was present.
    MissingPrivateKey,

    /// The `PrivateKey` field was not valid base64.
    InvalidBase64,

    /// The algorithm is not supported for signing.
    UnsupportedAlgorithm(u8),

    /// The decoded material was rejected by the cryptography backend.
    RejectedKey,
}

impl fmt::Display for KeyDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::MissingAlgorithm => f.write_str("no Algorithm field found"),
            Self::MissingPrivateKey => f.write_str("no PrivateKey field found"),
            Self::InvalidBase64 => f.write_str("PrivateKey field is not valid base64"),
            Self::UnsupportedAlgorithm(number) => {
                write!(f, "algorithm {number} is not supported for signing")
            }
            Self::RejectedKey => f.write_str("key material rejected"),
        }
    }
}

impl std::error::Error for KeyDecodeError {}

/// Errors that arise when signing an RRset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignError {
    /// An empty RRset cannot be signed.
    EmptyRrset,

    /// The records do not share a single owner and type.
    MixedRrset,
}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::EmptyRrset => f.write_str("cannot sign an empty RRset"),
            Self::MixedRrset => f.write_str("records do not form a single RRset"),
        }
    }
}

impl std::error::Error for SignError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> PrivateKey {
        let text = format!(
            "Private-key-format: v1.3\n\
             Algorithm: 15 (ED25519)\n\
             PrivateKey: {}\n",
            BASE64.encode([7u8; 32]),
        );
        text.parse().unwrap()
    }

    fn a_record(owner: &str) -> Record {
        Record::new(
            owner.parse().unwrap(),
            Type::A,
            Class::IN,
            Ttl::from(3600),
            Rdata::A("192.0.2.1".parse().unwrap()),
        )
    }

    #[test]
    fn key_tag_matches_rfc4034_test_vector() {
        // Test vector from RFC 4034 Appendix B.5.
        let public_key = hex::decode(
            "030101a80020a95566ba42e886bb804cda84e47ef56dbd7aec612615552cec906d3e9b72dc4f\
             90d3fc09b8e9d0ff2ae8ee5ed8cd61d7622c39ee2d76a2153bc0ac8b9e254125c46e0a224507\
             fb358d7f6b5d7a42f75e60b9748e7c0747e2447f4bd7d10ca24bb1498de34a504406bbeb3b04\
             1fe48d0ad2b1de5adadb87d0c8824e7cc4dc3e5b7f0b3e8ac72c3d3d8aa7251abcaad82ad5ec\
             eced8cd83825d19ffd95e93bca729fdd88901b20fc598fb6a0779ddfa95e3e42ca9d0a7739d3\
             c4ad3a7a5a30b3c60a73a6f09fdb812746e0d69edfba06754465f2e1dd5e3802e6d05bd6148e\
             38fd8ca1632b71f6559fe9b6e18d73c5a750e3e2f2f205972e7b28ae04ddae5e27915a08d217\
             db5ce090c119d23f79fb",
        )
        .unwrap();
        assert_eq!(key_tag(0x0101, 3, 5, &public_key), 55495);
    }

    #[test]
    fn private_key_decoding_reports_problems() {
        assert_eq!(
            "PrivateKey: AQ==\n".parse::<PrivateKey>().unwrap_err(),
            KeyDecodeError::MissingAlgorithm,
        );
        assert_eq!(
            "Algorithm: 15\n".parse::<PrivateKey>().unwrap_err(),
            KeyDecodeError::MissingPrivateKey,
        );
        assert_eq!(
            "Algorithm: 8 (RSASHA256)\nPrivateKey: AQ==\n"
                .parse::<PrivateKey>()
                .unwrap_err(),
            KeyDecodeError::UnsupportedAlgorithm(8),
        );
        assert_eq!(
            "Algorithm: 15\nPrivateKey: not-base64!\n"
                .parse::<PrivateKey>()
                .unwrap_err(),
            KeyDecodeError::InvalidBase64,
        );
        // A seed of the wrong length decodes as base64 but is rejected
        // by the backend.
        assert_eq!(
            "Algorithm: 15\nPrivateKey: AQID\n"
                .parse::<PrivateKey>()
                .unwrap_err(),
            KeyDecodeError::RejectedKey,
        );
    }

    #[test]
    fn dnskey_record_carries_the_public_key() {
        let key = test_key();
        let dnskey = make_dnskey("example.".parse().unwrap(), Class::IN, &key);
        assert_eq!(dnskey.rr_type, Type::DNSKEY);
        match &dnskey.rdata {
            Rdata::Dnskey {
                flags,
                protocol,
                algorithm,
                public_key,
            } => {
                assert_eq!(*flags, FLAGS_ZONE);
                assert_eq!(*protocol, PROTOCOL_DNSSEC);
                assert_eq!(*algorithm, 15);
                assert_eq!(public_key.len(), 32);
            }
            other => panic!("expected DNSKEY RDATA, got {other:?}"),
        }
    }

    #[test]
    fn signatures_verify_with_the_published_key() {
        let signing_key = SigningKey::new("example.".parse().unwrap(), Class::IN, test_key());
        let rrset = [a_record("host.example."), {
            let mut second = a_record("host.example.");
            second.rdata = Rdata::A("192.0.2.2".parse().unwrap());
            second
        }];
        let rrsig = signing_key.sign_rrset(&rrset).unwrap();
        assert_eq!(rrsig.rr_type, Type::RRSIG);
        assert_eq!(rrsig.owner, rrset[0].owner);

        let (expiration, inception, signature) = match &rrsig.rdata {
            Rdata::Rrsig {
                type_covered,
                algorithm,
                labels,
                original_ttl,
                expiration,
                inception,
                key_tag,
                signer_name,
                signature,
            } => {
                assert_eq!(*type_covered, Type::A);
                assert_eq!(*algorithm, 15);
                assert_eq!(*labels, 2);
                assert_eq!(*original_ttl, 3600);
                assert_eq!(*key_tag, signing_key.key_tag());
                assert_eq!(signer_name, &"example.".parse().unwrap());
                (*expiration, *inception, signature.clone())
            }
            other => panic!("expected RRSIG RDATA, got {other:?}"),
        };

        // Rebuild the signed data and verify the signature against the
        // published public key.
        let mut data = Vec::new();
        data.extend_from_slice(&u16::from(Type::A).to_be_bytes());
        data.push(15);
        data.push(2);
        data.extend_from_slice(&3600u32.to_be_bytes());
        data.extend_from_slice(&expiration.to_be_bytes());
        data.extend_from_slice(&inception.to_be_bytes());
        data.extend_from_slice(&signing_key.key_tag().to_be_bytes());
        "example.".parse::<Name>().unwrap().write_wire(&mut data);
        let mut wires: Vec<Vec<u8>> = rrset.iter().map(Record::canonical_wire).collect();
        wires.sort_unstable();
        for wire in &wires {
            data.extend_from_slice(wire);
        }

        let public_key = match &signing_key.dnskey().rdata {
            Rdata::Dnskey { public_key, .. } => public_key.clone(),
            other => panic!("expected DNSKEY RDATA, got {other:?}"),
        };
        ring::signature::UnparsedPublicKey::new(&ring::signature::ED25519, &public_key)
            .verify(&data, &signature)
            .expect("signature must verify");
    }

    #[test]
    fn wildcard_owners_reduce_the_labels_field() {
        let signing_key = SigningKey::new("example.".parse().unwrap(), Class::IN, test_key());
        let rrsig = signing_key.sign_rrset(&[a_record("*.example.")]).unwrap();
        match &rrsig.rdata {
            Rdata::Rrsig { labels, .. } => assert_eq!(*labels, 1),
            other => panic!("expected RRSIG RDATA, got {other:?}"),
        }
    }

    #[test]
    fn mixed_rrsets_are_rejected() {
        let signing_key = SigningKey::new("example.".parse().unwrap(), Class::IN, test_key());
        assert_eq!(
            signing_key.sign_rrset(&[]).unwrap_err(),
            SignError::EmptyRrset,
        );
        assert_eq!(
            signing_key
                .sign_rrset(&[a_record("a.example."), a_record("b.example.")])
                .unwrap_err(),
            SignError::MixedRrset,
        );
    }
}
