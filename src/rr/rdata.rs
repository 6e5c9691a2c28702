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

//! Typed RDATA for the RR types the zone engine inspects.
//!
//! The engine needs structured access to RDATA in three places: the
//! chasing table (embedded domain names in CNAME, DNAME, NS, SOA, MX,
//! and SRV records), the signature index (the type-covered field of
//! RRSIG records), and the denial-of-existence machinery (the next
//! name of NSEC records). The [`Rdata`] enumeration therefore carries
//! typed variants for those RR types, plus A/AAAA (glue), TXT, DS, and
//! DNSKEY. Every other type is held as opaque octets in
//! [`Rdata::Other`], in the spirit of [RFC 3597].
//!
//! Embedded names are [`Name`]s and so are lowercase by construction,
//! which is what makes [`Rdata::write_wire`] produce the canonical
//! form of [RFC 4034 § 6.2] without any further processing.
//!
//! [RFC 3597]: https://datatracker.ietf.org/doc/html/rfc3597
//! [RFC 4034 § 6.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.2

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::name::Name;
use crate::rr::Type;

////////////////////////////////////////////////////////////////////////
// RDATA                                                              //
////////////////////////////////////////////////////////////////////////

/// The RDATA of a resource record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Rdata {
    /// An IPv4 host address.
    A(Ipv4Addr),

    /// An IPv6 host address ([RFC 3596]).
    ///
    /// [RFC 3596]: https://datatracker.ietf.org/doc/html/rfc3596
    Aaaa(Ipv6Addr),

    /// An authoritative nameserver for the owner.
    Ns(Name),

    /// The canonical name of the owner.
    Cname(Name),

    /// A delegation of an entire subtree ([RFC 6672]).
    ///
    /// [RFC 6672]: https://datatracker.ietf.org/doc/html/rfc6672
    Dname(Name),

    /// The start of a zone of authority.
    Soa {
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },

    /// A mail exchanger for the owner.
    Mx { preference: u16, exchange: Name },

    /// The location of a service ([RFC 2782]).
    ///
    /// [RFC 2782]: https://datatracker.ietf.org/doc/html/rfc2782
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: Name,
    },

    /// Descriptive text: one or more character-strings.
    Txt(Vec<Vec<u8>>),

    /// A delegation signer digest ([RFC 4034 § 5]).
    ///
    /// [RFC 4034 § 5]: https://datatracker.ietf.org/doc/html/rfc4034#section-5
    Ds {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Vec<u8>,
    },

    /// A DNS public key ([RFC 4034 § 2]).
    ///
    /// [RFC 4034 § 2]: https://datatracker.ietf.org/doc/html/rfc4034#section-2
    Dnskey {
        flags: u16,
        protocol: u8,
        algorithm: u8,
        public_key: Vec<u8>,
    },

    /// A signature over an RRset ([RFC 4034 § 3]). The `type_covered`
    /// field names the RRset being signed and drives the signature
    /// index of the zone engine.
    ///
    /// [RFC 4034 § 3]: https://datatracker.ietf.org/doc/html/rfc4034#section-3
    Rrsig {
        type_covered: Type,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer_name: Name,
        signature: Vec<u8>,
    },

    /// An authenticated denial-of-existence record ([RFC 4034 § 4]):
    /// the next owner name in the zone's canonical ordering, plus the
    /// RR types present at this owner.
    ///
    /// [RFC 4034 § 4]: https://datatracker.ietf.org/doc/html/rfc4034#section-4
    Nsec { next: Name, types: Vec<Type> },

    /// RDATA of a type the engine does not inspect, as opaque octets.
    Other(Box<[u8]>),
}

impl Rdata {
    /// Returns the target name of a CNAME or DNAME record, i.e. the
    /// name that answer-section chasing continues with.
    pub fn target(&self) -> Option<&Name> {
        match self {
            Self::Cname(target) | Self::Dname(target) => Some(target),
            _ => None,
        }
    }

    /// Returns the embedded name for which additional-section address
    /// processing is performed (the nameserver of an NS record, the
    /// primary master of an SOA record, the exchanger of an MX record,
    /// or the target of an SRV record).
    pub fn additional_name(&self) -> Option<&Name> {
        match self {
            Self::Ns(nsdname) => Some(nsdname),
            Self::Soa { mname, .. } => Some(mname),
            Self::Mx { exchange, .. } => Some(exchange),
            Self::Srv { target, .. } => Some(target),
            _ => None,
        }
    }

    /// For RRSIG RDATA, returns the type of the RRset the signature
    /// covers.
    pub fn type_covered(&self) -> Option<Type> {
        match self {
            Self::Rrsig { type_covered, .. } => Some(*type_covered),
            _ => None,
        }
    }

    /// Appends the canonical wire form of the RDATA ([RFC 4034 § 6.2])
    /// to `out`. Embedded names are written uncompressed; they are
    /// already lowercase.
    ///
    /// [RFC 4034 § 6.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.2
    pub fn write_wire(&self, out: &mut Vec<u8>) {
        match self {
            Self::A(addr) => out.extend_from_slice(&addr.octets()),
            Self::Aaaa(addr) => out.extend_from_slice(&addr.octets()),
            Self::Ns(name) | Self::Cname(name) | Self::Dname(name) => name.write_wire(out),
            Self::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                mname.write_wire(out);
                rname.write_wire(out);
                for field in [serial, refresh, retry, expire, minimum] {
                    out.extend_from_slice(&field.to_be_bytes());
                }
            }
            Self::Mx {
                preference,
                exchange,
            } => {
                out.extend_from_slice(&preference.to_be_bytes());
                exchange.write_wire(out);
            }
            Self::Srv {
                priority,
                weight,
                port,
                target,
            } => {
                out.extend_from_slice(&priority.to_be_bytes());
                out.extend_from_slice(&weight.to_be_bytes());
                out.extend_from_slice(&port.to_be_bytes());
                target.write_wire(out);
            }
            Self::Txt(strings) => {
                for string in strings {
                    out.push(string.len() as u8);
                    out.extend_from_slice(string);
                }
            }
            Self::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => {
                out.extend_from_slice(&key_tag.to_be_bytes());
                out.push(*algorithm);
                out.push(*digest_type);
                out.extend_from_slice(digest);
            }
            Self::Dnskey {
                flags,
                protocol,
                algorithm,
                public_key,
            } => {
                out.extend_from_slice(&flags.to_be_bytes());
                out.push(*protocol);
                out.push(*algorithm);
                out.extend_from_slice(public_key);
            }
            Self::Rrsig {
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
                out.extend_from_slice(&u16::from(*type_covered).to_be_bytes());
                out.push(*algorithm);
                out.push(*labels);
                out.extend_from_slice(&original_ttl.to_be_bytes());
                out.extend_from_slice(&expiration.to_be_bytes());
                out.extend_from_slice(&inception.to_be_bytes());
                out.extend_from_slice(&key_tag.to_be_bytes());
                signer_name.write_wire(out);
                out.extend_from_slice(signature);
            }
            Self::Nsec { next, types } => {
                next.write_wire(out);
                write_type_bitmap(types, out);
            }
            Self::Other(octets) => out.extend_from_slice(octets),
        }
    }
}

/// Appends the NSEC type bitmap ([RFC 4034 § 4.1.2]) for `types` to
/// `out`.
///
/// [RFC 4034 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-4.1.2
fn write_type_bitmap(types: &[Type], out: &mut Vec<u8>) {
    let mut values: Vec<u16> = types.iter().copied().map(u16::from).collect();
    values.sort_unstable();
    values.dedup();

    let mut window = 0u8;
    let mut bitmap = [0u8; 32];
    let mut bitmap_len = 0usize;
    let mut window_used = false;
    for value in values {
        let [hi, lo] = value.to_be_bytes();
        if hi != window && window_used {
            out.push(window);
            out.push(bitmap_len as u8);
            out.extend_from_slice(&bitmap[..bitmap_len]);
            bitmap = [0; 32];
            bitmap_len = 0;
        }
        window = hi;
        window_used = true;
        let index = (lo / 8) as usize;
        bitmap[index] |= 0x80 >> (lo % 8);
        bitmap_len = bitmap_len.max(index + 1);
    }
    if window_used {
        out.push(window);
        out.push(bitmap_len as u8);
        out.extend_from_slice(&bitmap[..bitmap_len]);
    }
}

////////////////////////////////////////////////////////////////////////
// PRESENTATION FORMAT                                                //
////////////////////////////////////////////////////////////////////////

impl fmt::Display for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::A(addr) => write!(f, "{addr}"),
            Self::Aaaa(addr) => write!(f, "{addr}"),
            Self::Ns(name) | Self::Cname(name) | Self::Dname(name) => write!(f, "{name}"),
            Self::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => write!(
                f,
                "{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}",
            ),
            Self::Mx {
                preference,
                exchange,
            } => write!(f, "{preference} {exchange}"),
            Self::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{priority} {weight} {port} {target}"),
            Self::Txt(strings) => {
                for (i, string) in strings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "\"{}\"", String::from_utf8_lossy(string))?;
                }
                Ok(())
            }
            Self::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => {
                write!(f, "{key_tag} {algorithm} {digest_type} ")?;
                write_hex(f, digest)
            }
            Self::Dnskey {
                flags,
                protocol,
                algorithm,
                public_key,
            } => write!(
                f,
                "{flags} {protocol} {algorithm} {}",
                BASE64.encode(public_key),
            ),
            Self::Rrsig {
                type_covered,
                algorithm,
                labels,
                original_ttl,
                expiration,
                inception,
                key_tag,
                signer_name,
                signature,
            } => write!(
                f,
                "{type_covered} {algorithm} {labels} {original_ttl} {expiration} {inception} \
                 {key_tag} {signer_name} {}",
                BASE64.encode(signature),
            ),
            Self::Nsec { next, types } => {
                write!(f, "{next}")?;
                for rr_type in types {
                    write!(f, " {rr_type}")?;
                }
                Ok(())
            }
            Self::Other(octets) => {
                // RFC 3597 § 5 unknown-RDATA form.
                write!(f, "\\# {} ", octets.len())?;
                write_hex(f, octets)
            }
        }
    }
}

fn write_hex(f: &mut fmt::Formatter, octets: &[u8]) -> fmt::Result {
    for octet in octets {
        write!(f, "{octet:02X}")?;
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    #[test]
    fn type_bitmap_matches_rfc4034_example() {
        // RFC 4034 § 4.1.2 gives the bitmap for an owner with A, MX,
        // RRSIG, NSEC, and TYPE1234 records.
        let mut out = Vec::new();
        write_type_bitmap(
            &[
                Type::A,
                Type::MX,
                Type::RRSIG,
                Type::NSEC,
                Type::from(1234),
            ],
            &mut out,
        );
        let mut expected = vec![0x00, 0x06, 0x40, 0x01, 0x00, 0x00, 0x00, 0x03];
        expected.extend_from_slice(&[0x04, 0x1b]);
        expected.extend_from_slice(&[0x00; 26]);
        expected.push(0x20);
        assert_eq!(out, expected);
    }

    #[test]
    fn wire_form_embeds_uncompressed_names() {
        let mut out = Vec::new();
        Rdata::Mx {
            preference: 10,
            exchange: name("mail.example."),
        }
        .write_wire(&mut out);
        assert_eq!(out, b"\x00\x0a\x04mail\x07example\x00");
    }

    #[test]
    fn soa_wire_form_is_rfc1035() {
        let mut out = Vec::new();
        Rdata::Soa {
            mname: name("ns.example."),
            rname: name("admin.example."),
            serial: 1,
            refresh: 2,
            retry: 3,
            expire: 4,
            minimum: 5,
        }
        .write_wire(&mut out);
        let mut expected = b"\x02ns\x07example\x00\x05admin\x07example\x00".to_vec();
        for field in [1u32, 2, 3, 4, 5] {
            expected.extend_from_slice(&field.to_be_bytes());
        }
        assert_eq!(out, expected);
    }

    #[test]
    fn chasing_accessors_pick_the_embedded_name() {
        let cname = Rdata::Cname(name("target.example."));
        assert_eq!(cname.target(), Some(&name("target.example.")));
        assert_eq!(cname.additional_name(), None);

        let mx = Rdata::Mx {
            preference: 10,
            exchange: name("mail.example."),
        };
        assert_eq!(mx.target(), None);
        assert_eq!(mx.additional_name(), Some(&name("mail.example.")));

        let a = Rdata::A("127.0.0.1".parse().unwrap());
        assert_eq!(a.target(), None);
        assert_eq!(a.additional_name(), None);
    }

    #[test]
    fn presentation_format_looks_like_a_master_file() {
        let ds = Rdata::Ds {
            key_tag: 60485,
            algorithm: 5,
            digest_type: 1,
            digest: vec![0x2b, 0xb1, 0x83],
        };
        assert_eq!(ds.to_string(), "60485 5 1 2BB183");

        let nsec = Rdata::Nsec {
            next: name("host.example."),
            types: vec![Type::A, Type::RRSIG, Type::NSEC],
        };
        assert_eq!(nsec.to_string(), "host.example. A RRSIG NSEC");
    }
}
