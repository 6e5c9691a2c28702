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

//! Implementation of the [`RecordMap`] structure: the per-owner RRset
//! index.

use std::collections::HashMap;

use log::warn;

use crate::dnssec::SigningKey;
use crate::name::Name;
use crate::rr::{Record, Type};

/// The RRsets held at one owner name (or, for the wildcard map, at
/// all of a zone's wildcard owners), indexed by RR type.
///
/// Two indices are maintained. `rrs` groups records by their own type.
/// `sigs` groups RRSIG records by the type *covered* by the
/// signature, which is how the retrieval path finds the signatures
/// that belong to an RRset it is about to emit.
///
/// Retrieval through [`RecordMap::push`] enforces CNAME exclusivity
/// (RFC 1912 § 2.4) at read time: when any CNAME matches the queried
/// name, it answers for every type except CNAME itself, no matter
/// what else was inserted at the owner. Wildcard owners are matched
/// per [RFC 4592] and emitted with the owner rewritten to the queried
/// name. When an emitted RRset has no stored covering signature and
/// the zone holds signing material, a signature is generated on the
/// spot; this is what makes signed wildcard answers possible, since
/// no precomputed RRSIG can exist at every synthesizable owner.
///
/// [RFC 4592]: https://datatracker.ietf.org/doc/html/rfc4592
#[derive(Clone, Debug, Default)]
pub struct RecordMap {
    rrs: HashMap<Type, Vec<Record>>,
    sigs: HashMap<Type, Vec<Record>>,
}

impl RecordMap {
    /// Returns a new, empty `RecordMap`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a record. Records equal to one already present are
    /// silently discarded, following the behavior of other
    /// nameservers. RRSIG records are additionally indexed under
    /// their covered type.
    pub fn insert(&mut self, record: Record) {
        let list = self.rrs.entry(record.rr_type).or_default();
        if list.contains(&record) {
            return;
        }
        if record.rr_type == Type::RRSIG {
            if let Some(covered) = record.rdata.type_covered() {
                self.sigs.entry(covered).or_default().push(record.clone());
            }
        }
        list.push(record);
    }

    /// The central retrieval routine: appends the records answering
    /// `(qname, qtype)` to `out`, leaving `out` untouched when nothing
    /// matches.
    ///
    /// Unless CNAME itself was asked for, a matching CNAME RRset
    /// preempts the queried type. The emitted RRset is followed by its
    /// covering RRSIGs — stored ones if any, otherwise one freshly
    /// generated with `zsk` (when present).
    pub fn push(&self, qname: &Name, qtype: Type, zsk: Option<&SigningKey>, out: &mut Vec<Record>) {
        if qtype != Type::CNAME && self.emit(qname, Type::CNAME, zsk, out) {
            return;
        }
        self.emit(qname, qtype, zsk, out);
    }

    /// Convenience wrapper around [`RecordMap::push`] returning a
    /// fresh list.
    pub fn get(&self, qname: &Name, qtype: Type, zsk: Option<&SigningKey>) -> Vec<Record> {
        let mut out = Vec::new();
        self.push(qname, qtype, zsk, &mut out);
        out
    }

    /// Emits the records of type `rr_type` matching `qname`, plus
    /// covering signatures. Returns whether anything matched.
    fn emit(&self, qname: &Name, rr_type: Type, zsk: Option<&SigningKey>, out: &mut Vec<Record>) -> bool {
        let candidates = match self.rrs.get(&rr_type) {
            Some(candidates) => candidates,
            None => return false,
        };
        let matched = filter_matches(qname, candidates);
        if matched.is_empty() {
            return false;
        }
        let start = out.len();
        for rr in &matched {
            out.push(synthesize(rr, qname));
        }
        let end = out.len();

        let mut have_signature = false;
        if let Some(stored) = self.sigs.get(&rr_type) {
            for sig in filter_matches(qname, stored) {
                out.push(synthesize(sig, qname));
                have_signature = true;
            }
        }
        if !have_signature {
            if let Some(zsk) = zsk {
                match zsk.sign_rrset(&out[start..end]) {
                    Ok(rrsig) => out.push(rrsig),
                    Err(error) => {
                        warn!("cannot sign {qname} {rr_type} RRset: {error}");
                    }
                }
            }
        }
        true
    }

    /// Removes all records.
    pub fn clear(&mut self) {
        self.rrs.clear();
        self.sigs.clear();
    }

    /// Returns whether the map holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.rrs.is_empty()
    }
}

/// Keeps the candidates that answer for `qname`: non-wildcard owners
/// unconditionally (the exact-owner table only ever hands over records
/// whose owner is the queried name, and that partition is what makes
/// the shortcut sound), and wildcard owners that match per
/// [`wildcard_matches`].
fn filter_matches<'a>(qname: &Name, candidates: &'a [Record]) -> Vec<&'a Record> {
    candidates
        .iter()
        .filter(|rr| !rr.owner.is_wildcard() || wildcard_matches(&rr.owner, qname))
        .collect()
}

/// Returns whether the wildcard owner `*.T` matches `qname`: the
/// labels of `T` must equal the rightmost labels of `qname`, with at
/// least one `qname` label left over to stand in for the asterisk
/// ([RFC 4592 § 2.2.1] — the replaced labels may be several).
///
/// [RFC 4592 § 2.2.1]: https://datatracker.ietf.org/doc/html/rfc4592#section-2.2.1
fn wildcard_matches(owner: &Name, qname: &Name) -> bool {
    qname.label_count() >= owner.label_count()
        && owner
            .labels()
            .skip(1)
            .rev()
            .zip(qname.labels().rev())
            .all(|(a, b)| a == b)
}

/// Prepares a matched record for emission: wildcard matches are cloned
/// with the owner rewritten to the queried name, everything else is
/// cloned as stored.
fn synthesize(rr: &Record, qname: &Name) -> Record {
    if rr.owner.is_wildcard() {
        rr.with_owner(qname.clone())
    } else {
        rr.clone()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;
    use crate::dnssec::PrivateKey;
    use crate::rr::{Rdata, Ttl};

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    fn record(owner: &str, rr_type: Type, rdata: Rdata) -> Record {
        Record::new(name(owner), rr_type, Class::IN, Ttl::from(3600), rdata)
    }

    fn a(owner: &str, address: &str) -> Record {
        record(owner, Type::A, Rdata::A(address.parse().unwrap()))
    }

    fn zsk() -> SigningKey {
        let text = format!(
            "Algorithm: 15 (ED25519)\nPrivateKey: {}\n",
            BASE64.encode([3u8; 32]),
        );
        SigningKey::new(name("example."), Class::IN, text.parse::<PrivateKey>().unwrap())
    }

    #[test]
    fn push_retrieves_by_type() {
        let mut map = RecordMap::new();
        map.insert(a("host.example.", "192.0.2.1"));
        map.insert(record(
            "host.example.",
            Type::MX,
            Rdata::Mx {
                preference: 10,
                exchange: name("mail.example."),
            },
        ));

        let out = map.get(&name("host.example."), Type::A, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rr_type, Type::A);

        let out = map.get(&name("host.example."), Type::AAAA, None);
        assert!(out.is_empty());
    }

    #[test]
    fn duplicate_inserts_are_discarded() {
        let mut map = RecordMap::new();
        map.insert(a("host.example.", "192.0.2.1"));
        map.insert(a("host.example.", "192.0.2.1"));
        map.insert(a("host.example.", "192.0.2.2"));
        assert_eq!(map.get(&name("host.example."), Type::A, None).len(), 2);
    }

    #[test]
    fn cname_preempts_other_types_at_read_time() {
        let mut map = RecordMap::new();
        map.insert(record(
            "alias.example.",
            Type::CNAME,
            Rdata::Cname(name("host.example.")),
        ));
        // Insertion of a conflicting record is not rejected...
        map.insert(a("alias.example.", "192.0.2.1"));

        // ...but retrieval of any type except CNAME yields the CNAME.
        let out = map.get(&name("alias.example."), Type::A, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rr_type, Type::CNAME);

        // Asking for the CNAME itself skips the preemption path.
        let out = map.get(&name("alias.example."), Type::CNAME, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rr_type, Type::CNAME);
    }

    #[test]
    fn wildcards_match_and_are_rewritten() {
        let mut map = RecordMap::new();
        map.insert(a("*.example.", "192.0.2.1"));

        for qname in ["foo.example.", "a.b.example."] {
            let out = map.get(&name(qname), Type::A, None);
            assert_eq!(out.len(), 1, "no match for {qname}");
            assert_eq!(out[0].owner, name(qname));
            assert_eq!(out[0].rdata, Rdata::A("192.0.2.1".parse().unwrap()));
        }

        // A query beside the wildcard's parent domain does not match.
        assert!(map.get(&name("example."), Type::A, None).is_empty());
        assert!(map.get(&name("foo.other."), Type::A, None).is_empty());
    }

    #[test]
    fn stored_rrsigs_are_attached_by_covered_type() {
        let mut map = RecordMap::new();
        map.insert(a("host.example.", "192.0.2.1"));
        map.insert(record(
            "host.example.",
            Type::RRSIG,
            Rdata::Rrsig {
                type_covered: Type::A,
                algorithm: 15,
                labels: 2,
                original_ttl: 3600,
                expiration: 2,
                inception: 1,
                key_tag: 42,
                signer_name: name("example."),
                signature: vec![0; 64],
            },
        ));

        let out = map.get(&name("host.example."), Type::A, None);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].rr_type, Type::A);
        assert_eq!(out[1].rr_type, Type::RRSIG);
        assert_eq!(out[1].rdata.type_covered(), Some(Type::A));

        // The RRSIG does not cover AAAA, so an AAAA query finds
        // nothing at all.
        assert!(map.get(&name("host.example."), Type::AAAA, None).is_empty());
    }

    #[test]
    fn unsigned_rrsets_are_signed_on_the_fly() {
        let key = zsk();
        let mut map = RecordMap::new();
        map.insert(a("*.example.", "192.0.2.1"));

        let out = map.get(&name("foo.example."), Type::A, Some(&key));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].owner, name("foo.example."));
        assert_eq!(out[1].rr_type, Type::RRSIG);
        // The signature covers the rewritten owner.
        assert_eq!(out[1].owner, name("foo.example."));
        assert_eq!(out[1].rdata.type_covered(), Some(Type::A));
    }

    #[test]
    fn stored_rrsigs_suppress_fresh_signatures() {
        let key = zsk();
        let mut map = RecordMap::new();
        map.insert(a("host.example.", "192.0.2.1"));
        map.insert(record(
            "host.example.",
            Type::RRSIG,
            Rdata::Rrsig {
                type_covered: Type::A,
                algorithm: 15,
                labels: 2,
                original_ttl: 3600,
                expiration: 2,
                inception: 1,
                key_tag: 42,
                signer_name: name("example."),
                signature: vec![0; 64],
            },
        ));

        let out = map.get(&name("host.example."), Type::A, Some(&key));
        // One A record, one stored RRSIG, and nothing else: the key
        // tag proves the stored signature was used.
        assert_eq!(out.len(), 2);
        match &out[1].rdata {
            Rdata::Rrsig { key_tag, .. } => assert_eq!(*key_tag, 42),
            other => panic!("expected RRSIG RDATA, got {other:?}"),
        }
    }
}
