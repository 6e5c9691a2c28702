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

//! Implementation of the [`Error`] type for zone-related errors.

use std::fmt;

use crate::dnssec::KeyDecodeError;
use crate::name;
use crate::zone_file;

/// Errors that arise during operations on a [`Zone`](super::Zone).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A record whose owner is outside the zone was inserted. Only
    /// A and AAAA records (glue) may have out-of-zone owners.
    OutOfZone,

    /// [`NameList::lower`](super::NameList::lower) was asked for the
    /// predecessor of a name that exists in the list. The caller
    /// should have taken the no-data path: an existing name is not an
    /// NXDOMAIN.
    NotAnNxDomain,

    /// A name could not be parsed.
    Name(name::Error),

    /// Zone signing key material could not be decoded.
    KeyDecode(KeyDecodeError),

    /// Zone text could not be parsed.
    ZoneFile(zone_file::Error),

    /// A zone file could not be read.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OutOfZone => f.write_str("the record's owner is not within the zone"),
            Self::NotAnNxDomain => {
                f.write_str("cannot prove nonexistence of a name that exists")
            }
            Self::Name(error) => write!(f, "invalid name: {error}"),
            Self::KeyDecode(error) => write!(f, "invalid signing key: {error}"),
            Self::ZoneFile(error) => write!(f, "invalid zone text: {error}"),
            Self::Io(error) => write!(f, "cannot read zone file: {error}"),
        }
    }
}

impl From<name::Error> for Error {
    fn from(error: name::Error) -> Self {
        Self::Name(error)
    }
}

impl From<KeyDecodeError> for Error {
    fn from(error: KeyDecodeError) -> Self {
        Self::KeyDecode(error)
    }
}

impl From<zone_file::Error> for Error {
    fn from(error: zone_file::Error) -> Self {
        Self::ZoneFile(error)
    }
}

impl std::error::Error for Error {}
