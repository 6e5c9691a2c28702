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

//! DNS CLASS handling.

use std::fmt;
use std::str::FromStr;

/// A DNS CLASS value.
///
/// The zone engine stores and compares classes but never interprets
/// them: everything it serves is IN in practice. A class is a 16-bit
/// value on the wire, so this wraps `u16`, carries constants for the
/// classes the IANA still lists, and reads and writes the RFC 1035
/// mnemonics plus the `CLASSnnn` notation of [RFC 3597 § 5] for
/// everything else.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Class(u16);

impl Class {
    pub const IN: Self = Self(1);
    pub const CH: Self = Self(3);
    pub const HS: Self = Self(4);

    fn mnemonic(self) -> Option<&'static str> {
        match self {
            Self::IN => Some("IN"),
            Self::CH => Some("CH"),
            Self::HS => Some("HS"),
            _ => None,
        }
    }
}

impl From<u16> for Class {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Class> for u16 {
    fn from(class: Class) -> Self {
        class.0
    }
}

impl FromStr for Class {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let upper = text.to_ascii_uppercase();
        match upper.as_str() {
            "IN" => Ok(Self::IN),
            "CH" => Ok(Self::CH),
            "HS" => Ok(Self::HS),
            _ => match upper.strip_prefix("CLASS") {
                Some(digits) => digits
                    .parse::<u16>()
                    .map(Self)
                    .map_err(|_| "the CLASS number is not a 16-bit integer"),
                None => Err("unknown class"),
            },
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "CLASS{}", self.0),
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}
