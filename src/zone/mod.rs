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

//! Implementation of DNS zone data structures, for keeping one zone
//! of authority loaded in memory and answering queries over it.
//!
//! The center of this module is the [`Zone`] structure. Unlike the
//! classic tree-of-nodes database suggested by [RFC 1035 § 6.1.2], a
//! `Zone` keeps a flat table from each exact owner name to the
//! [`RecordMap`] holding that owner's RRsets, a single `RecordMap`
//! holding every wildcard owner of the zone, and a [`NameList`] of
//! the owners that carry NSEC records. The flat layout keeps the
//! exact-name hot path to one hash lookup; the wildcard table is
//! consulted only when the exact table has no entry for the queried
//! name, which is also precisely the shadowing rule of
//! [RFC 4592 § 3.3.1].
//!
//! Queries run in two layers. [`Zone::query`] implements the
//! resolution algorithm of [RFC 1034 § 4.3.2] — local answer,
//! authoritative no-data, referral, or name error, with NSEC proofs
//! attached where denial of existence calls for them — and returns
//! the raw sections in an [`Answer`]. [`Zone::resolve`] wraps that
//! into a ready [`Message`] with the AA flag and RCODE set.
//!
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
//! [RFC 1035 § 6.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-6.1.2
//! [RFC 4592 § 3.3.1]: https://datatracker.ietf.org/doc/html/rfc4592#section-3.3.1

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use arrayvec::ArrayVec;
use log::debug;

use crate::class::Class;
use crate::dnssec::{PrivateKey, SigningKey};
use crate::message::{Message, Rcode};
use crate::name::Name;
use crate::rr::{Record, Type};
use crate::zone_file;

mod error;
mod hints;
mod name_list;
mod record_map;

pub use error::Error;
pub use name_list::NameList;
pub use record_map::RecordMap;

/// The maximum number of links in a CNAME (or DNAME) chain that will
/// be chased while assembling one answer. Chains longer than this, and
/// chains that loop, are cut off at this length.
const MAX_CNAME_CHAIN_LEN: usize = 8;

////////////////////////////////////////////////////////////////////////
// ANSWERS                                                            //
////////////////////////////////////////////////////////////////////////

/// The raw sections of an authoritative answer, as produced by
/// [`Zone::query`].
///
/// `aa` is the authoritative-answer flag of the eventual response.
/// `ok` records whether the queried name resolved: a response is a
/// name error (NXDOMAIN) exactly when both flags are clear.
#[derive(Clone, Debug, Default)]
pub struct Answer {
    pub answer: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
    pub aa: bool,
    pub ok: bool,
}

////////////////////////////////////////////////////////////////////////
// ZONES                                                              //
////////////////////////////////////////////////////////////////////////

/// A DNS zone of authority loaded into memory.
///
/// `Zone`s are constructed empty with [`Zone::new`] and populated
/// record by record through [`Zone::insert`], or in one step from
/// master-file text with [`Zone::from_text`]/[`Zone::from_file`].
/// Insertion is monotonic: there is no single-record removal, only
/// [`Zone::clear_records`] and [`Zone::clear`].
///
/// Once populated, the query path ([`Zone::resolve`], [`Zone::query`],
/// [`Zone::get`]) takes the zone by shared reference and never
/// mutates it. An embedding server is expected to finish loading
/// before serving, or to serialize loads against queries itself.
#[derive(Debug)]
pub struct Zone {
    /// The zone apex, lowercase and fully qualified.
    origin: Name,

    /// The label count of the origin.
    count: usize,

    /// The exact-owner table.
    names: HashMap<Name, RecordMap>,

    /// All wildcard owners of the zone. Consulted only when `names`
    /// has no entry for the queried name, so an exact entry shadows
    /// every wildcard, empty or not.
    wild: RecordMap,

    /// The owners carrying NSEC records, in canonical order.
    nsec: NameList,

    /// Zone signing key material, when the zone signs on the fly.
    zsk: Option<SigningKey>,
}

impl Zone {
    /// Creates a new, empty `Zone` with the given origin.
    pub fn new(origin: Name) -> Self {
        Self {
            count: origin.label_count(),
            origin,
            names: HashMap::new(),
            wild: RecordMap::new(),
            nsec: NameList::new(),
            zsk: None,
        }
    }

    /// Constructs a `Zone` by parsing master-file `text` with relative
    /// names resolved against `origin`.
    pub fn from_text(origin: &str, text: &str) -> Result<Self, Error> {
        let origin: Name = origin.parse()?;
        let mut zone = Self::new(origin);
        for record in zone_file::parse_records(text, &zone.origin)? {
            zone.insert(record)?;
        }
        Ok(zone)
    }

    /// Constructs a `Zone` from the master file at `path`.
    pub fn from_file(origin: &str, path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|error| Error::Io(error.to_string()))?;
        Self::from_text(origin, &text)
    }

    /// Returns the zone's origin.
    pub fn origin(&self) -> &Name {
        &self.origin
    }

    /// Replaces the zone's origin and recomputes its label count.
    /// Records already present are not migrated or rechecked; this is
    /// meant for configuring an empty zone.
    pub fn set_origin(&mut self, origin: Name) {
        self.count = origin.label_count();
        self.origin = origin;
    }

    /// Installs a zone signing key from its private-key text form (see
    /// [`PrivateKey`]). The zone derives and keeps the matching DNSKEY
    /// record for its origin; from here on, RRsets emitted without a
    /// stored covering RRSIG are signed on the fly.
    pub fn set_zsk_from_str(&mut self, text: &str) -> Result<(), Error> {
        let key: PrivateKey = text.parse()?;
        self.zsk = Some(SigningKey::new(self.origin.clone(), Class::IN, key));
        Ok(())
    }

    /// Returns the DNSKEY record of the installed zone signing key, if
    /// one is installed.
    pub fn dnskey(&self) -> Option<&Record> {
        self.zsk.as_ref().map(SigningKey::dnskey)
    }

    /// Returns the cached root hints: the root NS set and the address
    /// records of the named servers. The hints are parsed from an
    /// embedded snapshot of the IANA `named.root` file on first use
    /// and shared process-wide.
    pub fn hints() -> (&'static [Record], &'static [Record]) {
        let (ns, addresses) = hints::root_hints();
        (ns, addresses)
    }

    /// Adds a record to the `Zone`.
    ///
    /// The owner must be the origin or a name below it; A and AAAA
    /// records are exempt, because delegations may need glue whose
    /// owner lies outside the zone. Wildcard owners go to the zone's
    /// wildcard table, and NSEC owners are also recorded in the NSEC
    /// name list. Inserting a record equal to one already present is
    /// a no-op.
    pub fn insert(&mut self, record: Record) -> Result<(), Error> {
        if !matches!(record.rr_type, Type::A | Type::AAAA)
            && !record.owner.eq_or_subdomain_of(&self.origin)
        {
            return Err(Error::OutOfZone);
        }
        if record.rr_type == Type::NSEC {
            self.nsec.insert(record.owner.clone());
        }
        if record.owner.is_wildcard() {
            self.wild.insert(record);
        } else {
            self.names
                .entry(record.owner.clone())
                .or_default()
                .insert(record);
        }
        Ok(())
    }

    /// Removes all records, leaving the origin in place.
    pub fn clear_records(&mut self) {
        self.names.clear();
        self.wild.clear();
        self.nsec.clear();
    }

    /// Resets the zone: all records and the signing material go; the
    /// origin stays.
    pub fn clear(&mut self) {
        self.clear_records();
        self.zsk = None;
    }

    ////////////////////////////////////////////////////////////////////
    // RETRIEVAL                                                      //
    ////////////////////////////////////////////////////////////////////

    /// Appends the records answering `(name, rr_type)` to `out`.
    ///
    /// The exact-owner table is consulted first; only when it has no
    /// entry at all for `name` does the wildcard table get a chance,
    /// which is how exact names shadow wildcards.
    pub fn push(&self, name: &Name, rr_type: Type, out: &mut Vec<Record>) {
        match self.names.get(name) {
            Some(map) => map.push(name, rr_type, self.zsk.as_ref(), out),
            None => self.wild.push(name, rr_type, self.zsk.as_ref(), out),
        }
    }

    /// Returns the records answering `(name, rr_type)`.
    pub fn get(&self, name: &Name, rr_type: Type) -> Vec<Record> {
        let mut out = Vec::new();
        self.push(name, rr_type, &mut out);
        out
    }

    /// Returns whether the zone answers `(name, rr_type)` with
    /// anything.
    pub fn has(&self, name: &Name, rr_type: Type) -> bool {
        !self.get(name, rr_type).is_empty()
    }

    /// Appends glue for a referenced owner to `out`: the owner's
    /// records of `rr_type`, or its A and AAAA records when `rr_type`
    /// is `None`.
    ///
    /// When nothing is appended and `authority` is provided, the
    /// zone's SOA is appended there instead — the authoritative
    /// assertion for an unresolved in-answer target per
    /// [RFC 1034 § 4.3.2] step 3(c).
    ///
    /// [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
    pub fn glue(
        &self,
        name: &Name,
        rr_type: Option<Type>,
        out: &mut Vec<Record>,
        authority: Option<&mut Vec<Record>>,
    ) {
        let before = out.len();
        match rr_type {
            Some(rr_type) => self.push(name, rr_type, out),
            None => {
                self.push(name, Type::A, out);
                self.push(name, Type::AAAA, out);
            }
        }
        if out.len() == before {
            if let Some(authority) = authority {
                self.push(&self.origin, Type::SOA, authority);
            }
        }
    }

    /// The local answer pass: retrieves `(name, rr_type)` and chases
    /// what the retrieved records reference.
    ///
    /// CNAME and DNAME targets are chased under the original query
    /// type into the answer itself (with the SOA fallback of
    /// [`Zone::glue`] going to the returned authority list), so a
    /// chain unfolds link by link as the answer grows. The embedded
    /// names of NS, SOA, MX, and SRV records get their addresses
    /// appended to the returned additional list.
    fn find(&self, name: &Name, rr_type: Type) -> (Vec<Record>, Vec<Record>, Vec<Record>) {
        enum Chase {
            Target(Name),
            Address(Name),
        }

        let mut answer = self.get(name, rr_type);
        let mut additional = Vec::new();
        let mut authority = Vec::new();
        // The queried name is the first link of any chain, so the list
        // of chased targets holds at most MAX_CNAME_CHAIN_LEN − 1
        // further names.
        let mut chased: ArrayVec<Name, { MAX_CNAME_CHAIN_LEN - 1 }> = ArrayVec::new();

        let mut index = 0;
        while index < answer.len() {
            let rdata = &answer[index].rdata;
            let chase = if let Some(target) = rdata.target() {
                Some(Chase::Target(target.clone()))
            } else {
                rdata.additional_name().cloned().map(Chase::Address)
            };
            match chase {
                Some(Chase::Target(target)) => {
                    if target != *name
                        && !chased.contains(&target)
                        && chased.try_push(target.clone()).is_ok()
                    {
                        self.glue(&target, Some(rr_type), &mut answer, Some(&mut authority));
                    }
                }
                Some(Chase::Address(target)) => {
                    self.glue(&target, None, &mut additional, None);
                }
                None => {}
            }
            index += 1;
        }
        (answer, additional, authority)
    }

    ////////////////////////////////////////////////////////////////////
    // QUERIES                                                        //
    ////////////////////////////////////////////////////////////////////

    /// Answers `(name, rr_type)` with raw sections, per the resolution
    /// algorithm of [RFC 1034 § 4.3.2].
    ///
    /// The only possible error is [`Error::NotAnNxDomain`], which
    /// indicates inconsistent zone data (a name both provably present
    /// and absent) rather than anything about the query.
    ///
    /// [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
    pub fn query(&self, name: &Name, rr_type: Type) -> Result<Answer, Error> {
        // A root origin is authoritative for the root name alone;
        // under any other origin, a name is in the zone when its
        // rightmost labels are the origin.
        let in_zone = if self.count == 0 {
            name.is_root()
        } else {
            name.suffix(self.count) == self.origin
        };

        let (answer, additional, extra) = self.find(name, rr_type);
        if !answer.is_empty() {
            if !in_zone {
                // The name sits at or below a delegation point that
                // this zone also holds records for (DS, NSEC, glue).
                // Such data is served in the authority section without
                // the AA bit; an NS query makes it an explicit
                // referral and brings the DS set along.
                debug!("{}: non-authoritative data at {name}", self.origin);
                let mut authority = answer;
                if rr_type == Type::NS {
                    self.push(name, Type::DS, &mut authority);
                }
                return Ok(Answer {
                    authority,
                    additional,
                    ok: true,
                    ..Default::default()
                });
            }
            return Ok(Answer {
                answer,
                authority: extra,
                additional,
                aa: true,
                ok: true,
            });
        }

        if in_zone {
            // NODATA: we are authoritative for the name, and it has
            // nothing of the requested type.
            debug!("{}: no data at {name} for {rr_type}", self.origin);
            let mut authority = self.get(&self.origin, Type::SOA);
            self.prove_no_data(&mut authority);
            return Ok(Answer {
                authority,
                aa: true,
                ..Default::default()
            });
        }

        // The name may lie below a delegation we hold. The child zone
        // sits one label under the origin.
        let child = name.suffix(self.count + 1);
        let (ns, glue_records, _) = self.find(&child, Type::NS);
        if !ns.is_empty() {
            debug!("{}: referral for {name} to {child}", self.origin);
            let mut authority = ns;
            self.push(&child, Type::DS, &mut authority);
            return Ok(Answer {
                authority,
                additional: glue_records,
                ok: true,
                ..Default::default()
            });
        }

        // Name error. The root zone proves it with NSEC records;
        // other zones stay quiet to minimize leakage.
        debug!("{}: name error for {name}", self.origin);
        let mut authority = Vec::new();
        if self.origin.is_root() {
            authority = self.get(&self.origin, Type::SOA);
            self.prove_name_error(&child, &mut authority)?;
        }
        Ok(Answer {
            authority,
            ..Default::default()
        })
    }

    /// The public entry: answers `(name, rr_type)` with a ready
    /// [`Message`].
    ///
    /// The name is parsed (and thereby lowercased); `ANY` queries are
    /// answered as NS queries, the minimal-responses policy that
    /// denies ANY its amplification value. The RCODE is NXDOMAIN
    /// exactly when the answer is neither authoritative nor resolved,
    /// and NOERROR otherwise.
    pub fn resolve(&self, name: &str, rr_type: Type) -> Result<Message, Error> {
        let name: Name = name.parse()?;
        let rr_type = if rr_type == Type::ANY {
            Type::NS
        } else {
            rr_type
        };
        let sections = self.query(&name, rr_type)?;
        let rcode = if !sections.aa && !sections.ok {
            Rcode::NxDomain
        } else {
            Rcode::NoError
        };
        Ok(Message {
            rcode,
            aa: sections.aa,
            answer: sections.answer,
            authority: sections.authority,
            additional: sections.additional,
        })
    }

    ////////////////////////////////////////////////////////////////////
    // DENIAL OF EXISTENCE                                            //
    ////////////////////////////////////////////////////////////////////

    /// Appends the origin's NSEC record to `authority`, proving that
    /// the requested type is absent there.
    fn prove_no_data(&self, authority: &mut Vec<Record>) {
        self.push(&self.origin, Type::NSEC, authority);
    }

    /// Appends the NSEC records proving that `name` does not exist:
    /// the NSEC at the canonical predecessor of `name` (whose next
    /// field leaps over it), then the origin's NSEC.
    fn prove_name_error(&self, name: &Name, authority: &mut Vec<Record>) -> Result<(), Error> {
        if let Some(lower) = self.nsec.lower(name)? {
            self.push(lower, Type::NSEC, authority);
        }
        self.prove_no_data(authority);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use lazy_static::lazy_static;

    use super::*;
    use crate::rr::{Rdata, Ttl};

    /// A cut-down root zone: apex SOA/NS/NSEC, one delegated TLD with
    /// DS and glue, and the NSEC chain covering `.` and `com.`.
    const ROOT_ZONE: &str = "\
$TTL 86400
.    IN SOA a.root-servers.net. nstld.verisign-grs.com. ( 2024010101 1800 900 604800 86400 )
.    IN NS a.root-servers.net.
.    IN NSEC com. NS SOA RRSIG NSEC
com. IN NS a.gtld-servers.net.
com. IN DS 30909 8 2 E2D3C916F6DEEAC73294E8268FB5885044A833FC5459588F4A9184CFC41A5766
com. IN NSEC . NS DS RRSIG NSEC
a.root-servers.net. IN A 198.41.0.4
a.root-servers.net. IN AAAA 2001:503:ba3e::2:30
a.gtld-servers.net. IN A 192.5.6.30
";

    /// An ordinary second-level zone exercising CNAME chasing and
    /// wildcards.
    const EXAMPLE_ZONE: &str = "\
$ORIGIN example.
$TTL 300
@    IN SOA ns admin ( 1 7200 900 86400 300 )
@    IN NS ns
ns   IN A 192.0.2.53
a    IN CNAME b
b    IN A 192.0.2.2
c    IN CNAME nx.other.
loop1 IN CNAME loop2
loop2 IN CNAME loop1
mail IN MX 10 b
shadow IN TXT \"present but typeless\"
*    IN A 192.0.2.99
";

    lazy_static! {
        static ref ROOT: Zone = Zone::from_text(".", ROOT_ZONE).unwrap();
        static ref EXAMPLE: Zone = Zone::from_text("example.", EXAMPLE_ZONE).unwrap();
    }

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    fn zsk_text() -> String {
        format!(
            "Private-key-format: v1.3\n\
             Algorithm: 15 (ED25519)\n\
             PrivateKey: {}\n",
            BASE64.encode([9u8; 32]),
        )
    }

    fn types_of(records: &[Record]) -> Vec<Type> {
        records.iter().map(|rr| rr.rr_type).collect()
    }

    ////////////////////////////////////////////////////////////////////
    // INGEST                                                         //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn insert_rejects_out_of_zone_records() {
        let mut zone = Zone::new(name("example."));
        let outside = Record::new(
            name("other."),
            Type::NS,
            Class::IN,
            Ttl::from(300),
            Rdata::Ns(name("ns.other.")),
        );
        assert_eq!(zone.insert(outside), Err(Error::OutOfZone));

        // A and AAAA records may be out-of-zone glue.
        let glue = Record::new(
            name("ns.other."),
            Type::A,
            Class::IN,
            Ttl::from(300),
            Rdata::A("192.0.2.1".parse().unwrap()),
        );
        zone.insert(glue).unwrap();
        assert!(zone.has(&name("ns.other."), Type::A));
    }

    #[test]
    fn repeated_inserts_do_not_change_retrieval() {
        let mut zone = Zone::new(name("example."));
        let record = Record::new(
            name("host.example."),
            Type::A,
            Class::IN,
            Ttl::from(300),
            Rdata::A("192.0.2.1".parse().unwrap()),
        );
        zone.insert(record.clone()).unwrap();
        zone.insert(record).unwrap();
        assert_eq!(zone.get(&name("host.example."), Type::A).len(), 1);
    }

    #[test]
    fn clear_empties_the_zone_but_keeps_the_origin() {
        let mut zone = Zone::from_text("example.", EXAMPLE_ZONE).unwrap();
        zone.set_zsk_from_str(&zsk_text()).unwrap();
        zone.clear();
        assert_eq!(zone.origin(), &name("example."));
        assert!(zone.dnskey().is_none());
        assert!(!zone.has(&name("b.example."), Type::A));
    }

    ////////////////////////////////////////////////////////////////////
    // RETRIEVAL                                                      //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn retrieval_returns_the_stored_owner_for_exact_matches() {
        let records = EXAMPLE.get(&name("b.example."), Type::A);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].owner, name("b.example."));
    }

    #[test]
    fn wildcard_answers_carry_the_queried_name() {
        let records = EXAMPLE.get(&name("anything.example."), Type::A);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].owner, name("anything.example."));
        assert_eq!(records[0].rdata, Rdata::A("192.0.2.99".parse().unwrap()));
    }

    #[test]
    fn exact_entries_shadow_the_wildcard_even_when_typeless() {
        // shadow.example. exists (with TXT only), so the wildcard must
        // not answer an A query for it.
        assert!(!EXAMPLE.has(&name("shadow.example."), Type::A));
        assert!(EXAMPLE.has(&name("shadow.example."), Type::TXT));
    }

    ////////////////////////////////////////////////////////////////////
    // SCENARIOS — ROOT ZONE                                          //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn delegation_ns_query_is_a_referral_with_ds() {
        let response = ROOT.resolve("com.", Type::NS).unwrap();
        assert!(!response.aa);
        assert_eq!(response.rcode, Rcode::NoError);
        assert!(response.answer.is_empty());
        assert_eq!(types_of(&response.authority), [Type::NS, Type::DS]);
        assert_eq!(response.authority[0].owner, name("com."));
        assert_eq!(types_of(&response.additional), [Type::A]);
        assert_eq!(response.additional[0].owner, name("a.gtld-servers.net."));
    }

    #[test]
    fn any_queries_are_answered_as_ns_queries() {
        let any = ROOT.resolve("com.", Type::ANY).unwrap();
        let ns = ROOT.resolve("com.", Type::NS).unwrap();
        assert_eq!(any, ns);
    }

    #[test]
    fn nonexistent_tld_yields_nxdomain_with_nsec_proof() {
        let response = ROOT.resolve("example.invalid.", Type::A).unwrap();
        assert!(!response.aa);
        assert_eq!(response.rcode, Rcode::NxDomain);
        assert!(response.answer.is_empty());
        // SOA, then the NSEC leaping over "invalid." (owner "com."),
        // then the origin NSEC.
        assert_eq!(
            types_of(&response.authority),
            [Type::SOA, Type::NSEC, Type::NSEC],
        );
        assert_eq!(response.authority[1].owner, name("com."));
        assert_eq!(response.authority[2].owner, name("."));
    }

    #[test]
    fn apex_soa_query_is_authoritative_with_mname_glue() {
        let response = ROOT.resolve(".", Type::SOA).unwrap();
        assert!(response.aa);
        assert_eq!(response.rcode, Rcode::NoError);
        assert_eq!(types_of(&response.answer), [Type::SOA]);
        // Additional-section processing covers the SOA MNAME.
        assert_eq!(types_of(&response.additional), [Type::A, Type::AAAA]);
        assert_eq!(response.additional[0].owner, name("a.root-servers.net."));
    }

    #[test]
    fn apex_nodata_carries_soa_and_origin_nsec() {
        let response = ROOT.resolve(".", Type::MX).unwrap();
        assert!(response.aa);
        assert_eq!(response.rcode, Rcode::NoError);
        assert!(response.answer.is_empty());
        assert_eq!(types_of(&response.authority), [Type::SOA, Type::NSEC]);
        assert_eq!(response.authority[1].owner, name("."));
    }

    #[test]
    fn names_below_a_delegation_get_referred() {
        let response = ROOT.resolve("www.example.com.", Type::A).unwrap();
        assert!(!response.aa);
        assert_eq!(response.rcode, Rcode::NoError);
        assert!(response.answer.is_empty());
        assert_eq!(types_of(&response.authority), [Type::NS, Type::DS]);
        assert_eq!(types_of(&response.additional), [Type::A]);
    }

    #[test]
    fn glue_queries_land_in_the_authority_section() {
        // a.gtld-servers.net. has records in the zone, but the root is
        // not authoritative for it: the data comes back in the
        // authority section with AA clear.
        let response = ROOT.resolve("a.gtld-servers.net.", Type::A).unwrap();
        assert!(!response.aa);
        assert_eq!(response.rcode, Rcode::NoError);
        assert!(response.answer.is_empty());
        assert_eq!(types_of(&response.authority), [Type::A]);
    }

    #[test]
    fn query_names_are_lowercased_on_entry() {
        let upper = ROOT.resolve("COM.", Type::NS).unwrap();
        let lower = ROOT.resolve("com.", Type::NS).unwrap();
        assert_eq!(upper, lower);
    }

    ////////////////////////////////////////////////////////////////////
    // SCENARIOS — EXAMPLE ZONE                                       //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn cname_chains_unfold_into_the_answer() {
        let response = EXAMPLE.resolve("a.example.", Type::A).unwrap();
        assert!(response.aa);
        assert_eq!(response.rcode, Rcode::NoError);
        assert_eq!(types_of(&response.answer), [Type::CNAME, Type::A]);
        assert_eq!(response.answer[0].owner, name("a.example."));
        assert_eq!(response.answer[1].owner, name("b.example."));
        assert!(response.authority.is_empty());
    }

    #[test]
    fn unresolved_cname_targets_fall_back_to_soa() {
        let response = EXAMPLE.resolve("c.example.", Type::A).unwrap();
        assert!(response.aa);
        assert_eq!(response.rcode, Rcode::NoError);
        assert_eq!(types_of(&response.answer), [Type::CNAME]);
        assert_eq!(types_of(&response.authority), [Type::SOA]);
        assert_eq!(response.authority[0].owner, name("example."));
    }

    #[test]
    fn cname_loops_are_cut_off() {
        let response = EXAMPLE.resolve("loop1.example.", Type::A).unwrap();
        // Both links of the loop appear once; the chase then stops
        // instead of spinning.
        assert_eq!(types_of(&response.answer), [Type::CNAME, Type::CNAME]);
    }

    #[test]
    fn cname_answers_preempt_other_types() {
        // Even though the zone held no A record at a.example., an
        // AAAA query still gets the CNAME.
        let response = EXAMPLE.resolve("a.example.", Type::AAAA).unwrap();
        assert_eq!(response.answer[0].rr_type, Type::CNAME);
    }

    #[test]
    fn mx_answers_glue_the_exchanger() {
        let response = EXAMPLE.resolve("mail.example.", Type::MX).unwrap();
        assert!(response.aa);
        assert_eq!(types_of(&response.answer), [Type::MX]);
        assert_eq!(types_of(&response.additional), [Type::A]);
        assert_eq!(response.additional[0].owner, name("b.example."));
    }

    #[test]
    fn nonroot_zones_produce_bare_nxdomain_for_foreign_names() {
        let response = EXAMPLE.resolve("nx.other.", Type::A).unwrap();
        assert!(!response.aa);
        assert_eq!(response.rcode, Rcode::NxDomain);
        assert!(response.answer.is_empty());
        assert!(response.authority.is_empty());
    }

    #[test]
    fn in_zone_misses_are_nodata_not_nxdomain() {
        let response = EXAMPLE.resolve("b.example.", Type::AAAA).unwrap();
        assert!(response.aa);
        assert_eq!(response.rcode, Rcode::NoError);
        assert!(response.answer.is_empty());
        // The zone holds no NSEC records, so the proof is SOA-only.
        assert_eq!(types_of(&response.authority), [Type::SOA]);
    }

    ////////////////////////////////////////////////////////////////////
    // SCENARIOS — ON-THE-FLY SIGNING                                 //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn wildcard_answers_are_signed_on_the_fly() {
        let mut zone = Zone::from_text("example.", EXAMPLE_ZONE).unwrap();
        zone.set_zsk_from_str(&zsk_text()).unwrap();

        let response = zone.resolve("foo.example.", Type::A).unwrap();
        assert!(response.aa);
        assert_eq!(types_of(&response.answer), [Type::A, Type::RRSIG]);
        assert_eq!(response.answer[0].owner, name("foo.example."));
        assert_eq!(response.answer[1].owner, name("foo.example."));
        match &response.answer[1].rdata {
            Rdata::Rrsig {
                type_covered,
                signer_name,
                ..
            } => {
                assert_eq!(*type_covered, Type::A);
                assert_eq!(signer_name, &name("example."));
            }
            other => panic!("expected RRSIG RDATA, got {other:?}"),
        }
    }

    #[test]
    fn bad_key_material_is_rejected() {
        let mut zone = Zone::new(name("example."));
        assert!(matches!(
            zone.set_zsk_from_str("Algorithm: 15\nPrivateKey: tooshort\n"),
            Err(Error::KeyDecode(_)),
        ));
        assert!(zone.dnskey().is_none());
    }

    ////////////////////////////////////////////////////////////////////
    // HINTS                                                          //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn hints_are_cached_and_stable() {
        let (ns_first, addrs_first) = Zone::hints();
        let (ns_second, addrs_second) = Zone::hints();
        assert!(std::ptr::eq(ns_first, ns_second));
        assert!(std::ptr::eq(addrs_first, addrs_second));
        assert_eq!(ns_first.len(), 13);
        assert!(!addrs_first.is_empty());
    }
}
