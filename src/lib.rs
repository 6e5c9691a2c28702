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

//! An authoritative DNS zone engine.
//!
//! This crate implements the in-memory data structure at the heart of
//! an authoritative nameserver: a [`Zone`] ingests the resource
//! records of a single zone of authority and answers (QNAME, QTYPE)
//! queries with fully formed response sections, the AA flag, and the
//! response code, according to the resolution algorithm of
//! [RFC 1034 § 4.3.2]. On top of the base algorithm it provides:
//!
//! * wildcard synthesis per [RFC 4592];
//! * CNAME and DNAME chasing with glue assembly for delegations;
//! * NSEC denial-of-existence proofs per [RFC 4034]/[RFC 4035]; and
//! * on-the-fly RRSIG generation with a zone signing key, which makes
//!   signed answers possible at wildcard-synthesized owner names for
//!   which no precomputed signature can exist.
//!
//! The crate deliberately stops at the zone boundary. Wire-format
//! encoding, transport, recursion, zone transfers, dynamic update,
//! and EDNS negotiation are all left to the embedding server. The
//! [`message::Message`] returned by [`Zone::resolve`] is a plain
//! section container for such a server to serialize.
//!
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
//! [RFC 4034]: https://datatracker.ietf.org/doc/html/rfc4034
//! [RFC 4035]: https://datatracker.ietf.org/doc/html/rfc4035
//! [RFC 4592]: https://datatracker.ietf.org/doc/html/rfc4592

pub mod class;
pub mod dnssec;
pub mod message;
pub mod name;
pub mod rr;
pub mod zone;
pub mod zone_file;

pub use class::Class;
pub use message::{Message, Rcode};
pub use name::Name;
pub use rr::{Rdata, Record, Ttl, Type};
pub use zone::{Answer, NameList, RecordMap, Zone};
