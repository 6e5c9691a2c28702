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

//! Provides the [`Record`] and [`Ttl`] structures for DNS resource
//! records.

use std::fmt;

use crate::class::Class;
use crate::name::Name;
use crate::rr::{Rdata, Type};

////////////////////////////////////////////////////////////////////////
// TTLS                                                               //
////////////////////////////////////////////////////////////////////////

/// A record time to live, in seconds.
///
/// [RFC 2181 § 8] pins TTLs to the range 0..=2³¹ − 1: the field is 32
/// bits wide on the wire, but a value with the most significant bit
/// set must be taken as zero. `Ttl::from(u32)` applies that rule on
/// the way in, so a held `Ttl` is always in range.
///
/// [RFC 2181 § 8]: https://datatracker.ietf.org/doc/html/rfc2181#section-8
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ttl(u32);

impl From<u32> for Ttl {
    fn from(seconds: u32) -> Self {
        Self(if seconds >> 31 == 0 { seconds } else { 0 })
    }
}

impl From<Ttl> for u32 {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

////////////////////////////////////////////////////////////////////////
// RECORDS                                                            //
////////////////////////////////////////////////////////////////////////

/// A DNS resource record: the (owner, type, class, TTL, RDATA) tuple
/// of [RFC 1035 § 3.2.1].
///
/// The owner and any names embedded in the RDATA are [`Name`]s, so a
/// `Record` is lowercase throughout by construction. Records are
/// immutable once inserted into a zone; the only owner rewrite the
/// engine ever performs is on *clones* produced by
/// [`Record::with_owner`] during wildcard synthesis.
///
/// [RFC 1035 § 3.2.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.2.1
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub owner: Name,
    pub rr_type: Type,
    pub class: Class,
    pub ttl: Ttl,
    pub rdata: Rdata,
}

impl Record {
    /// Creates a new `Record`.
    pub fn new(owner: Name, rr_type: Type, class: Class, ttl: Ttl, rdata: Rdata) -> Self {
        Self {
            owner,
            rr_type,
            class,
            ttl,
            rdata,
        }
    }

    /// Returns a clone of this record with the owner replaced. This is
    /// how wildcard-synthesized answers get the queried name as their
    /// owner ([RFC 4592 § 2.1.2]).
    ///
    /// [RFC 4592 § 2.1.2]: https://datatracker.ietf.org/doc/html/rfc4592#section-2.1.2
    pub fn with_owner(&self, owner: Name) -> Self {
        Self {
            owner,
            ..self.clone()
        }
    }

    /// Returns the canonical wire form of the whole record per
    /// [RFC 4034 § 6.2]: owner, type, class, TTL, RDLENGTH, and RDATA,
    /// with all names lowercase and uncompressed. This is the unit the
    /// DNSSEC signer sorts and hashes.
    ///
    /// [RFC 4034 § 6.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.2
    pub fn canonical_wire(&self) -> Vec<u8> {
        let mut rdata = Vec::new();
        self.rdata.write_wire(&mut rdata);

        let mut wire = Vec::with_capacity(self.owner.wire_len() + 10 + rdata.len());
        self.owner.write_wire(&mut wire);
        wire.extend_from_slice(&u16::from(self.rr_type).to_be_bytes());
        wire.extend_from_slice(&u16::from(self.class).to_be_bytes());
        wire.extend_from_slice(&u32::from(self.ttl).to_be_bytes());
        wire.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        wire.extend_from_slice(&rdata);
        wire
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.owner, self.ttl, self.class, self.rr_type, self.rdata,
        )
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
