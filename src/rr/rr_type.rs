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

//! DNS RR type handling.

use std::fmt;
use std::str::FromStr;

/// The RR type of a DNS record.
///
/// Like [`Class`](crate::class::Class), this wraps the 16-bit wire
/// value. Constants cover the types the zone engine dispatches on —
/// the classic RFC 1035 set the chasing table knows, plus the DNSSEC
/// types of [RFC 4034] that drive the signature and denial machinery.
/// Types outside that set still work everywhere (the index is keyed
/// on the value, not the mnemonic); they just print and parse in the
/// `TYPEnnn` notation of [RFC 3597 § 5].
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
/// [RFC 4034]: https://datatracker.ietf.org/doc/html/rfc4034
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Type(u16);

impl Type {
    pub const A: Type = Type(1);
    pub const NS: Type = Type(2);
    pub const CNAME: Type = Type(5);
    pub const SOA: Type = Type(6);
    pub const PTR: Type = Type(12);
    pub const MX: Type = Type(15);
    pub const TXT: Type = Type(16);
    pub const AAAA: Type = Type(28);
    pub const SRV: Type = Type(33);
    pub const DNAME: Type = Type(39);
    pub const DS: Type = Type(43);
    pub const RRSIG: Type = Type(46);
    pub const NSEC: Type = Type(47);
    pub const DNSKEY: Type = Type(48);
    pub const ANY: Type = Type(255);
}

/// The types the engine knows by mnemonic; both text directions are
/// driven from this one table.
const MNEMONICS: &[(Type, &str)] = &[
    (Type::A, "A"),
    (Type::NS, "NS"),
    (Type::CNAME, "CNAME"),
    (Type::SOA, "SOA"),
    (Type::PTR, "PTR"),
    (Type::MX, "MX"),
    (Type::TXT, "TXT"),
    (Type::AAAA, "AAAA"),
    (Type::SRV, "SRV"),
    (Type::DNAME, "DNAME"),
    (Type::DS, "DS"),
    (Type::RRSIG, "RRSIG"),
    (Type::NSEC, "NSEC"),
    (Type::DNSKEY, "DNSKEY"),
    (Type::ANY, "ANY"),
];

impl From<u16> for Type {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        rr_type.0
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let upper = text.to_ascii_uppercase();
        if let Some((rr_type, _)) = MNEMONICS.iter().find(|(_, m)| *m == upper) {
            return Ok(*rr_type);
        }
        match upper.strip_prefix("TYPE") {
            Some(digits) => digits
                .parse::<u16>()
                .map(Self)
                .map_err(|_| "the TYPE number is not a 16-bit integer"),
            None => Err("unknown RR type"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match MNEMONICS.iter().find(|(rr_type, _)| *rr_type == *self) {
            Some((_, mnemonic)) => f.write_str(mnemonic),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}
