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

//! Implementation of the [`NameList`] structure backing NSEC proofs.

use crate::name::Name;

use super::Error;

/// The set of owner names in a zone that carry NSEC records, kept
/// unique and sorted in canonical DNS order.
///
/// NXDOMAIN proofs need the NSEC record whose owner immediately
/// precedes the nonexistent name in the zone's canonical ordering
/// ([RFC 4035 § 3.1.3.2]); [`NameList::lower`] finds that owner. A
/// sorted vector with binary search is sufficient because the list is
/// built once from static zone data and then only read.
///
/// [RFC 4035 § 3.1.3.2]: https://datatracker.ietf.org/doc/html/rfc4035#section-3.1.3.2
#[derive(Clone, Debug, Default)]
pub struct NameList {
    names: Vec<Name>,
}

impl NameList {
    /// Returns a new, empty `NameList`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Inserts `name`, keeping the list sorted. Inserting a name that
    /// is already present is a no-op.
    pub fn insert(&mut self, name: Name) {
        if let Err(index) = self.names.binary_search(&name) {
            self.names.insert(index, name);
        }
    }

    /// Returns the greatest stored name strictly less than `name`
    /// under canonical order, or `None` if no stored name is less.
    ///
    /// Asking for the predecessor of a name that is itself stored
    /// fails with [`Error::NotAnNxDomain`]: that name exists, so the
    /// caller should be assembling a no-data response, not a
    /// name-error proof.
    pub fn lower(&self, name: &Name) -> Result<Option<&Name>, Error> {
        match self.names.binary_search(name) {
            Ok(_) => Err(Error::NotAnNxDomain),
            Err(0) => Ok(None),
            Err(index) => Ok(Some(&self.names[index - 1])),
        }
    }

    /// Removes all names.
    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Returns the number of stored names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
