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

//! Implementation of data structures related to domain names.
//!
//! The zone engine works exclusively with fully qualified, lowercase
//! domain names, and the [`Name`] type enforces both properties by
//! construction: the [`FromStr`] implementation rejects names without
//! the trailing root dot and folds ASCII uppercase on entry. This
//! makes the canonicalization required of every stored record a
//! structural fact rather than a runtime obligation.
//!
//! [`Name`]'s [`Ord`] implementation is the *canonical DNS ordering*
//! of [RFC 4034 § 6.1]: names compare label by label starting from the
//! rightmost (TLD) label, labels compare as unsigned octet strings,
//! and a name that is a proper suffix of another sorts first. NSEC
//! denial-of-existence proofs depend on this ordering.
//!
//! [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The maximum length of a label (not including the length octet).
const MAX_LABEL_LEN: usize = 63;

/// The maximum length of the uncompressed on-the-wire representation
/// of a domain name.
const MAX_WIRE_LEN: usize = 255;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A fully qualified, lowercase domain name.
///
/// A `Name` is stored as its sequence of labels, leftmost label first.
/// The terminal root label is implicit, so the root name itself has no
/// labels at all. Labels hold lowercase ASCII only; uppercase octets
/// are folded when the name is parsed.
///
/// Two orderings matter for domain names, and `Name` provides both.
/// [`PartialEq`]/[`Eq`]/[`Hash`] compare labels right down to the
/// octets (which, given the lowercase invariant, is the DNS's
/// case-insensitive name equality), while [`Ord`] is the canonical
/// DNS ordering used by NSEC chains.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Name {
    labels: Vec<Box<[u8]>>,
}

impl Name {
    /// Returns the root name `.`.
    pub fn root() -> Self {
        Self { labels: Vec::new() }
    }

    /// Returns whether this `Name` is the DNS root `.`.
    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the number of labels in the name, not counting the
    /// implicit root label. The root name has zero labels.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Returns whether the leftmost label is the asterisk label `*`,
    /// making this a wildcard owner name ([RFC 4592 § 2.1.1]).
    ///
    /// [RFC 4592 § 2.1.1]: https://datatracker.ietf.org/doc/html/rfc4592#section-2.1.1
    pub fn is_wildcard(&self) -> bool {
        self.labels.first().map_or(false, |l| l.as_ref() == b"*")
    }

    /// Returns an iterator over the labels of the name, leftmost label
    /// first. The implicit root label is not yielded.
    pub fn labels(&self) -> impl DoubleEndedIterator<Item = &[u8]> + ExactSizeIterator + '_ {
        self.labels.iter().map(|l| l.as_ref())
    }

    /// Returns the name formed by the rightmost `count` labels of this
    /// name. If the name has `count` labels or fewer, the whole name
    /// is returned.
    pub fn suffix(&self, count: usize) -> Self {
        if count >= self.labels.len() {
            self.clone()
        } else {
            Self {
                labels: self.labels[self.labels.len() - count..].to_vec(),
            }
        }
    }

    /// Returns whether this `Name` is equal to or a subdomain of
    /// `other`.
    pub fn eq_or_subdomain_of(&self, other: &Name) -> bool {
        self.labels.len() >= other.labels.len()
            && self
                .labels()
                .rev()
                .zip(other.labels().rev())
                .all(|(a, b)| a == b)
    }

    /// Returns the length of the uncompressed on-the-wire
    /// representation of the name.
    pub fn wire_len(&self) -> usize {
        1 + self.labels.iter().map(|l| 1 + l.len()).sum::<usize>()
    }

    /// Appends the uncompressed on-the-wire representation of the name
    /// ([RFC 1035 § 3.1]) to `out`. Since `Name`s are lowercase by
    /// construction, this is also the canonical form of
    /// [RFC 4034 § 6.2].
    ///
    /// [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
    /// [RFC 4034 § 6.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.2
    pub fn write_wire(&self, out: &mut Vec<u8>) {
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
    }
}

////////////////////////////////////////////////////////////////////////
// CANONICAL ORDERING                                                 //
////////////////////////////////////////////////////////////////////////

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut ours = self.labels().rev();
        let mut theirs = other.labels().rev();
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) => match a.cmp(b) {
                    Ordering::Equal => continue,
                    ordering => return ordering,
                },
            }
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

////////////////////////////////////////////////////////////////////////
// PARSING AND FORMATTING                                             //
////////////////////////////////////////////////////////////////////////

impl FromStr for Name {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            return Err(Error::Empty);
        }
        if !text.is_ascii() {
            return Err(Error::NotAscii);
        }
        if text.contains('\\') {
            return Err(Error::UnsupportedEscape);
        }
        if text == "." {
            return Ok(Self::root());
        }
        let relative = match text.strip_suffix('.') {
            Some(relative) => relative,
            None => return Err(Error::NotFullyQualified),
        };

        let mut labels = Vec::new();
        let mut wire_len = 1;
        for label in relative.split('.') {
            if label.is_empty() {
                return Err(Error::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(Error::LabelTooLong);
            }
            wire_len += 1 + label.len();
            if wire_len > MAX_WIRE_LEN {
                return Err(Error::NameTooLong);
            }
            labels.push(label.as_bytes().to_ascii_lowercase().into_boxed_slice());
        }
        Ok(Self { labels })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in &self.labels {
            for &octet in label.iter() {
                if octet.is_ascii_graphic() && octet != b'.' && octet != b'\\' {
                    write!(f, "{}", octet as char)?;
                } else {
                    write!(f, "\\{octet:03}")?; // RFC 1035 § 5.1
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error type used to report problems constructing [`Name`]s.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// When parsing a [`Name`] from a [`str`], the string was empty.
    Empty,

    /// A label was empty (two consecutive dots, or a leading dot).
    EmptyLabel,

    /// A label was longer than 63 octets.
    LabelTooLong,

    /// The name is too long (longer than 255 octets on the wire).
    NameTooLong,

    /// When parsing a [`Name`] from a [`str`], the string was not
    /// strictly ASCII.
    NotAscii,

    /// The name did not end with the root label.
    NotFullyQualified,

    /// The string contained a `\` escape sequence, which this engine
    /// does not accept in names.
    UnsupportedEscape,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Empty => f.write_str("string was empty"),
            Self::EmptyLabel => f.write_str("name contains an empty label"),
            Self::LabelTooLong => f.write_str("label is longer than 63 octets"),
            Self::NameTooLong => f.write_str("name is longer than 255 octets on the wire"),
            Self::NotAscii => f.write_str("string was not ASCII"),
            Self::NotFullyQualified => f.write_str("name does not end with the root label"),
            Self::UnsupportedEscape => f.write_str("escape sequences are not supported"),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Error, Name};

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    #[test]
    fn parsing_lowercases() {
        assert_eq!(name("WWW.Example.COM."), name("www.example.com."));
        assert_eq!(name("WWW.Example.COM.").to_string(), "www.example.com.");
    }

    #[test]
    fn parsing_rejects_bad_names() {
        assert_eq!("".parse::<Name>(), Err(Error::Empty));
        assert_eq!("example.com".parse::<Name>(), Err(Error::NotFullyQualified));
        assert_eq!("a..com.".parse::<Name>(), Err(Error::EmptyLabel));
        assert_eq!(".com.".parse::<Name>(), Err(Error::EmptyLabel));
        assert_eq!("exämple.com.".parse::<Name>(), Err(Error::NotAscii));
        assert_eq!("ex\\097mple.com.".parse::<Name>(), Err(Error::UnsupportedEscape));
        let long_label = format!("{}.com.", "a".repeat(64));
        assert_eq!(long_label.parse::<Name>(), Err(Error::LabelTooLong));
        let long_name = format!("{}a.", "a.".repeat(127));
        assert_eq!(long_name.parse::<Name>(), Err(Error::NameTooLong));
    }

    #[test]
    fn root_has_no_labels() {
        let root = name(".");
        assert!(root.is_root());
        assert_eq!(root.label_count(), 0);
        assert_eq!(root.to_string(), ".");
        assert_eq!(root.wire_len(), 1);
    }

    #[test]
    fn wildcard_detection_works() {
        assert!(name("*.example.com.").is_wildcard());
        assert!(!name("a.example.com.").is_wildcard());
        assert!(!name("a.*.example.com.").is_wildcard());
        assert!(!name(".").is_wildcard());
    }

    #[test]
    fn suffix_selects_rightmost_labels() {
        let www = name("www.example.com.");
        assert_eq!(www.suffix(0), name("."));
        assert_eq!(www.suffix(1), name("com."));
        assert_eq!(www.suffix(2), name("example.com."));
        assert_eq!(www.suffix(3), www);
        assert_eq!(www.suffix(7), www);
    }

    #[test]
    fn subdomain_checks_work() {
        let apex = name("example.com.");
        assert!(apex.eq_or_subdomain_of(&apex));
        assert!(name("www.example.com.").eq_or_subdomain_of(&apex));
        assert!(apex.eq_or_subdomain_of(&name(".")));
        assert!(!name("example.net.").eq_or_subdomain_of(&apex));
        assert!(!name("com.").eq_or_subdomain_of(&apex));
        assert!(!name("notexample.com.").eq_or_subdomain_of(&apex));
    }

    #[test]
    fn ordering_is_canonical() {
        // The sample ordering of RFC 4034 § 6.1, minus the entries
        // that need escaped octets.
        let ordered = [
            ".",
            "example.",
            "a.example.",
            "yljkjljk.a.example.",
            "z.a.example.",
            "zabc.a.example.",
            "z.example.",
            "*.z.example.",
        ];
        for window in ordered.windows(2) {
            assert!(
                name(window[0]) < name(window[1]),
                "expected {} < {}",
                window[0],
                window[1],
            );
        }
    }

    #[test]
    fn wire_form_is_rfc1035() {
        let mut wire = Vec::new();
        name("www.example.com.").write_wire(&mut wire);
        assert_eq!(wire, b"\x03www\x07example\x03com\x00");
    }
}
