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

//! Implementation of the [`Message`] and [`Rcode`] types.
//!
//! A [`Message`] is the section-level view of a DNS response: the
//! answer, authority, and additional sections, the AA flag, and the
//! RCODE. Wire-format serialization (header layout, name compression,
//! truncation) is the embedding server's concern, so none of it
//! appears here.

use std::fmt;

use crate::rr::Record;

////////////////////////////////////////////////////////////////////////
// MESSAGES                                                           //
////////////////////////////////////////////////////////////////////////

/// A fully assembled DNS response, one section short of the wire.
///
/// This is what [`Zone::resolve`](crate::Zone::resolve) produces: the
/// three record sections in emission order, the authoritative-answer
/// flag, and the response code. The question section is the caller's
/// to echo.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    pub rcode: Rcode,
    pub aa: bool,
    pub answer: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
}

////////////////////////////////////////////////////////////////////////
// RCODES                                                             //
////////////////////////////////////////////////////////////////////////

/// A DNS response code.
///
/// The zone engine itself sets only [`NoError`](Rcode::NoError) and
/// [`NxDomain`](Rcode::NxDomain) — every query it is given yields a
/// well-formed response. The other original codes of
/// [RFC 1035 § 4.1.1] are carried for the embedding server, which is
/// where malformed requests, refused clients, and server failures
/// become visible. Codes beyond the original six (and the EDNS
/// extended-RCODE mechanism) are deliberately absent: nothing at this
/// layer can produce them.
///
/// [RFC 1035 § 4.1.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Rcode {
    #[default]
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
}

impl Rcode {
    /// Returns the four-bit header value of the code.
    pub fn code(self) -> u8 {
        match self {
            Self::NoError => 0,
            Self::FormErr => 1,
            Self::ServFail => 2,
            Self::NxDomain => 3,
            Self::NotImp => 4,
            Self::Refused => 5,
        }
    }

    /// Looks up the `Rcode` carrying the given header value, if it is
    /// one of the codes this crate models.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NoError),
            1 => Some(Self::FormErr),
            2 => Some(Self::ServFail),
            3 => Some(Self::NxDomain),
            4 => Some(Self::NotImp),
            5 => Some(Self::Refused),
            _ => None,
        }
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // The IANA mnemonics.
        f.write_str(match self {
            Self::NoError => "NOERROR",
            Self::FormErr => "FORMERR",
            Self::ServFail => "SERVFAIL",
            Self::NxDomain => "NXDOMAIN",
            Self::NotImp => "NOTIMP",
            Self::Refused => "REFUSED",
        })
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
