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

//! Parsing of the [RFC 1035 § 5] zone file format.
//!
//! [`parse_records`] turns master-file text into a sequence of
//! [`Record`]s ready for [`Zone::insert`](crate::Zone::insert). The
//! dialect handled here covers what real zone files for this engine
//! contain: `$ORIGIN` and `$TTL` directives, comments, parentheses
//! for multi-line records, relative owner names, `@` for the origin,
//! optional TTL and class fields in either order, and per-type RDATA
//! for every RR type the engine indexes. Unknown RR types are
//! accepted in the [RFC 3597 § 5] `\#` form.
//!
//! Restrictions against the full grammar: `$INCLUDE` is not supported
//! (the engine does no file I/O on this path), `\` escapes are not
//! recognized in names, and quoted strings do not span lines.
//!
//! [RFC 1035 § 5]: https://datatracker.ietf.org/doc/html/rfc1035#section-5
//! [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::class::Class;
use crate::name::{self, Name};
use crate::rr::{Rdata, Record, Ttl, Type};

////////////////////////////////////////////////////////////////////////
// PUBLIC API                                                         //
////////////////////////////////////////////////////////////////////////

/// Parses master-file `text` into records, resolving relative names
/// against `origin` (until a `$ORIGIN` directive changes it).
pub fn parse_records(text: &str, origin: &Name) -> Result<Vec<Record>, Error> {
    let mut origin = origin.clone();
    let mut default_ttl = None;
    let mut previous_owner: Option<Name> = None;
    let mut records = Vec::new();

    for entry in tokenize(text)? {
        if let Some(directive) = entry.tokens.first() {
            if directive.starts_with('$') {
                apply_directive(&entry, &mut origin, &mut default_ttl)?;
                continue;
            }
        }
        let record = parse_record(&entry, &origin, default_ttl, &previous_owner)?;
        previous_owner = Some(record.owner.clone());
        records.push(record);
    }
    Ok(records)
}

////////////////////////////////////////////////////////////////////////
// TOKENIZATION                                                       //
////////////////////////////////////////////////////////////////////////

/// One logical entry of the file: the tokens of a record or directive,
/// possibly gathered across several raw lines through parentheses.
struct Entry {
    /// The (1-based) number of the raw line the entry started on.
    line: usize,

    /// Whether the entry began with blank space, which makes the
    /// record inherit the previous owner.
    inherits_owner: bool,

    tokens: Vec<String>,
}

/// Splits `text` into [`Entry`]s: strips comments, splits fields,
/// reads quoted strings, and joins lines between parentheses.
fn tokenize(text: &str) -> Result<Vec<Entry>, Error> {
    let mut entries = Vec::new();
    let mut current: Option<Entry> = None;
    let mut depth = 0usize;

    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        let mut chars = line.char_indices().peekable();
        let inherits_owner = line.starts_with(|c| c == ' ' || c == '\t');

        let mut tokens = Vec::new();
        while let Some((start, c)) = chars.next() {
            match c {
                ' ' | '\t' | '\r' => continue,
                ';' => break,
                '(' => {
                    depth += 1;
                }
                ')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or(Error::new(number, ErrorKind::UnbalancedParens))?;
                }
                '"' => {
                    let mut string = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        match c {
                            '"' => {
                                closed = true;
                                break;
                            }
                            _ => string.push(c),
                        }
                    }
                    if !closed {
                        return Err(Error::new(number, ErrorKind::UnterminatedString));
                    }
                    tokens.push(string);
                }
                _ => {
                    let mut end = start + c.len_utf8();
                    while let Some(&(next, c)) = chars.peek() {
                        if matches!(c, ' ' | '\t' | '\r' | ';' | '(' | ')' | '"') {
                            break;
                        }
                        end = next + c.len_utf8();
                        chars.next();
                    }
                    tokens.push(line[start..end].to_owned());
                }
            }
        }

        match current.as_mut() {
            Some(entry) => entry.tokens.extend(tokens),
            None => {
                current = Some(Entry {
                    line: number,
                    inherits_owner,
                    tokens,
                });
            }
        }
        if depth == 0 {
            if let Some(entry) = current.take() {
                if !entry.tokens.is_empty() {
                    entries.push(entry);
                }
            }
        }
    }
    if depth != 0 {
        let line = current.map_or(0, |entry| entry.line);
        return Err(Error::new(line, ErrorKind::UnbalancedParens));
    }
    Ok(entries)
}

////////////////////////////////////////////////////////////////////////
// DIRECTIVES AND RECORDS                                             //
////////////////////////////////////////////////////////////////////////

fn apply_directive(
    entry: &Entry,
    origin: &mut Name,
    default_ttl: &mut Option<Ttl>,
) -> Result<(), Error> {
    let mut fields = Fields::new(entry);
    let directive = fields.next("directive")?.to_owned();
    if directive.eq_ignore_ascii_case("$ORIGIN") {
        let name = fields.next("origin name")?;
        *origin = parse_name(name, origin).map_err(|kind| Error::new(entry.line, kind))?;
    } else if directive.eq_ignore_ascii_case("$TTL") {
        let value = fields.next("TTL value")?;
        let value: u32 = value
            .parse()
            .map_err(|_| Error::new(entry.line, ErrorKind::BadTtl))?;
        *default_ttl = Some(Ttl::from(value));
    } else {
        return Err(Error::new(entry.line, ErrorKind::UnknownDirective));
    }
    fields.finish()
}

fn parse_record(
    entry: &Entry,
    origin: &Name,
    default_ttl: Option<Ttl>,
    previous_owner: &Option<Name>,
) -> Result<Record, Error> {
    let line = entry.line;
    let mut fields = Fields::new(entry);

    let owner = if entry.inherits_owner {
        previous_owner
            .clone()
            .ok_or(Error::new(line, ErrorKind::NoPreviousOwner))?
    } else {
        let token = fields.next("owner name")?;
        parse_name(token, origin).map_err(|kind| Error::new(line, kind))?
    };

    // The TTL and class fields may each be omitted, and when both
    // appear, either order is accepted.
    let mut ttl = None;
    let mut class = None;
    let rr_type = loop {
        let token = fields.next("RR type")?;
        if ttl.is_none() && token.bytes().all(|b| b.is_ascii_digit()) {
            let value: u32 = token
                .parse()
                .map_err(|_| Error::new(line, ErrorKind::BadTtl))?;
            ttl = Some(Ttl::from(value));
        } else if class.is_none() && token.parse::<Class>().is_ok() {
            class = token.parse::<Class>().ok();
        } else {
            break token
                .parse::<Type>()
                .map_err(|_| Error::new(line, ErrorKind::UnknownType))?;
        }
    };
    let ttl = ttl
        .or(default_ttl)
        .ok_or(Error::new(line, ErrorKind::MissingTtl))?;
    let class = class.unwrap_or(Class::IN);

    let rdata = parse_rdata(rr_type, &mut fields, origin)?;
    fields.finish()?;
    Ok(Record::new(owner, rr_type, class, ttl, rdata))
}

fn parse_rdata(rr_type: Type, fields: &mut Fields, origin: &Name) -> Result<Rdata, Error> {
    let line = fields.line;
    let bad = |reason| Error::new(line, ErrorKind::BadRdata(reason));

    match rr_type {
        Type::A => {
            let address: Ipv4Addr = fields
                .next("address")?
                .parse()
                .map_err(|_| bad("invalid IPv4 address"))?;
            Ok(Rdata::A(address))
        }
        Type::AAAA => {
            let address: Ipv6Addr = fields
                .next("address")?
                .parse()
                .map_err(|_| bad("invalid IPv6 address"))?;
            Ok(Rdata::Aaaa(address))
        }
        Type::NS => Ok(Rdata::Ns(fields.next_name(origin)?)),
        Type::CNAME => Ok(Rdata::Cname(fields.next_name(origin)?)),
        Type::DNAME => Ok(Rdata::Dname(fields.next_name(origin)?)),
        Type::SOA => Ok(Rdata::Soa {
            mname: fields.next_name(origin)?,
            rname: fields.next_name(origin)?,
            serial: fields.next_int("serial")?,
            refresh: fields.next_int("refresh")?,
            retry: fields.next_int("retry")?,
            expire: fields.next_int("expire")?,
            minimum: fields.next_int("minimum")?,
        }),
        Type::MX => Ok(Rdata::Mx {
            preference: fields.next_int("preference")?,
            exchange: fields.next_name(origin)?,
        }),
        Type::SRV => Ok(Rdata::Srv {
            priority: fields.next_int("priority")?,
            weight: fields.next_int("weight")?,
            port: fields.next_int("port")?,
            target: fields.next_name(origin)?,
        }),
        Type::TXT => {
            let mut strings = Vec::new();
            while let Some(token) = fields.next_opt() {
                if token.len() > 255 {
                    return Err(bad("character-string is longer than 255 octets"));
                }
                strings.push(token.as_bytes().to_vec());
            }
            if strings.is_empty() {
                return Err(bad("TXT requires at least one character-string"));
            }
            Ok(Rdata::Txt(strings))
        }
        Type::DS => Ok(Rdata::Ds {
            key_tag: fields.next_int("key tag")?,
            algorithm: fields.next_int("algorithm")?,
            digest_type: fields.next_int("digest type")?,
            digest: fields.rest_hex("digest")?,
        }),
        Type::DNSKEY => Ok(Rdata::Dnskey {
            flags: fields.next_int("flags")?,
            protocol: fields.next_int("protocol")?,
            algorithm: fields.next_int("algorithm")?,
            public_key: fields.rest_base64("public key")?,
        }),
        Type::RRSIG => Ok(Rdata::Rrsig {
            type_covered: fields
                .next("type covered")?
                .parse()
                .map_err(|_| bad("invalid type covered"))?,
            algorithm: fields.next_int("algorithm")?,
            labels: fields.next_int("labels")?,
            original_ttl: fields.next_int("original TTL")?,
            expiration: fields.next_time("expiration")?,
            inception: fields.next_time("inception")?,
            key_tag: fields.next_int("key tag")?,
            signer_name: fields.next_name(origin)?,
            signature: fields.rest_base64("signature")?,
        }),
        Type::NSEC => {
            let next = fields.next_name(origin)?;
            let mut types = Vec::new();
            while let Some(token) = fields.next_opt() {
                types.push(
                    token
                        .parse::<Type>()
                        .map_err(|_| bad("invalid type in bitmap"))?,
                );
            }
            Ok(Rdata::Nsec { next, types })
        }
        _ => {
            // RFC 3597 § 5 generic RDATA: \# <length> <hex>.
            if fields.next("RDATA")? != "\\#" {
                return Err(bad("unhandled RR type without RFC 3597 generic RDATA"));
            }
            let length: usize = fields
                .next("length")?
                .parse()
                .map_err(|_| bad("invalid RDATA length"))?;
            let octets = fields.rest_hex("RDATA")?;
            if octets.len() != length {
                return Err(bad("RDATA length does not match contents"));
            }
            Ok(Rdata::Other(octets.into_boxed_slice()))
        }
    }
}

/// Resolves a name token against the current origin: `@` is the
/// origin itself, absolute names stand alone, and anything else has
/// the origin appended.
fn parse_name(token: &str, origin: &Name) -> Result<Name, ErrorKind> {
    let text = if token == "@" {
        return Ok(origin.clone());
    } else if token.ends_with('.') {
        token.to_owned()
    } else if origin.is_root() {
        format!("{token}.")
    } else {
        format!("{token}.{origin}")
    };
    text.parse().map_err(ErrorKind::Name)
}

////////////////////////////////////////////////////////////////////////
// FIELD CURSOR                                                       //
////////////////////////////////////////////////////////////////////////

/// A cursor over the tokens of one [`Entry`].
struct Fields<'a> {
    line: usize,
    tokens: &'a [String],
    index: usize,
}

impl<'a> Fields<'a> {
    fn new(entry: &'a Entry) -> Self {
        Self {
            line: entry.line,
            tokens: &entry.tokens,
            index: 0,
        }
    }

    fn next_opt(&mut self) -> Option<&'a String> {
        let token = self.tokens.get(self.index);
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn next(&mut self, field: &'static str) -> Result<&'a str, Error> {
        self.next_opt()
            .map(String::as_str)
            .ok_or(Error::new(self.line, ErrorKind::MissingField(field)))
    }

    fn next_name(&mut self, origin: &Name) -> Result<Name, Error> {
        let line = self.line;
        let token = self.next("name")?;
        parse_name(token, origin).map_err(|kind| Error::new(line, kind))
    }

    fn next_int<T: std::str::FromStr>(&mut self, field: &'static str) -> Result<T, Error> {
        let line = self.line;
        self.next(field)?
            .parse()
            .map_err(|_| Error::new(line, ErrorKind::BadRdata(field)))
    }

    /// Reads an RRSIG timestamp: either seconds since the epoch or the
    /// `YYYYMMDDHHmmSS` form of [RFC 4034 § 3.2].
    ///
    /// [RFC 4034 § 3.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-3.2
    fn next_time(&mut self, field: &'static str) -> Result<u32, Error> {
        let line = self.line;
        let token = self.next(field)?;
        if token.len() == 14 && token.bytes().all(|b| b.is_ascii_digit()) {
            let digits = |range: std::ops::Range<usize>| -> i64 {
                token[range].parse().unwrap_or(0)
            };
            let days = days_from_civil(digits(0..4), digits(4..6), digits(6..8));
            let seconds =
                days * 86400 + digits(8..10) * 3600 + digits(10..12) * 60 + digits(12..14);
            Ok(seconds as u32)
        } else {
            token
                .parse()
                .map_err(|_| Error::new(line, ErrorKind::BadRdata(field)))
        }
    }

    /// Consumes all remaining tokens as whitespace-separated hex.
    fn rest_hex(&mut self, field: &'static str) -> Result<Vec<u8>, Error> {
        let error = Error::new(self.line, ErrorKind::BadRdata(field));
        let mut nibbles = Vec::new();
        while let Some(token) = self.next_opt() {
            for c in token.chars() {
                let nibble = c.to_digit(16).ok_or(error.clone())?;
                nibbles.push(nibble as u8);
            }
        }
        if nibbles.is_empty() || nibbles.len() % 2 != 0 {
            return Err(error);
        }
        Ok(nibbles
            .chunks_exact(2)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect())
    }

    /// Consumes all remaining tokens as whitespace-separated base64.
    fn rest_base64(&mut self, field: &'static str) -> Result<Vec<u8>, Error> {
        let mut text = String::new();
        while let Some(token) = self.next_opt() {
            text.push_str(token);
        }
        BASE64
            .decode(&text)
            .map_err(|_| Error::new(self.line, ErrorKind::BadRdata(field)))
    }

    fn finish(&mut self) -> Result<(), Error> {
        if self.index < self.tokens.len() {
            Err(Error::new(self.line, ErrorKind::TrailingData))
        } else {
            Ok(())
        }
    }
}

/// Days between the civil date and 1970-01-01, by Howard Hinnant's
/// `days_from_civil` algorithm.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = if year >= 0 { year } else { year - 399 } / 400;
    let year_of_era = year - era * 400;
    let day_of_year = (153 * (if month > 2 { month - 3 } else { month + 9 }) + 2) / 5 + day - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146097 + day_of_era - 719468
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// A zone-file parsing error, tagged with the raw line it was detected
/// on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    pub line: usize,
    pub kind: ErrorKind,
}

impl Error {
    fn new(line: usize, kind: ErrorKind) -> Self {
        Self { line, kind }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for Error {}

/// The kinds of zone-file parsing errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// More closing than opening parentheses, or an unclosed group at
    /// the end of the file.
    UnbalancedParens,

    /// A quoted string did not end before the end of the line.
    UnterminatedString,

    /// A `$`-directive other than `$ORIGIN` or `$TTL`.
    UnknownDirective,

    /// A record inherited its owner, but no record came before it.
    NoPreviousOwner,

    /// A required field was absent.
    MissingField(&'static str),

    /// A name field could not be parsed.
    Name(name::Error),

    /// A TTL field was not a valid 32-bit integer.
    BadTtl,

    /// The record had no TTL and no `$TTL` directive was in effect.
    MissingTtl,

    /// The RR type field was not recognized.
    UnknownType,

    /// The RDATA could not be parsed; the payload names the field.
    BadRdata(&'static str),

    /// Fields remained after the RDATA was complete.
    TrailingData,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnbalancedParens => f.write_str("unbalanced parentheses"),
            Self::UnterminatedString => f.write_str("unterminated quoted string"),
            Self::UnknownDirective => f.write_str("unknown directive"),
            Self::NoPreviousOwner => {
                f.write_str("record inherits its owner, but there is no previous record")
            }
            Self::MissingField(field) => write!(f, "missing field: {field}"),
            Self::Name(error) => write!(f, "invalid name: {error}"),
            Self::BadTtl => f.write_str("invalid TTL"),
            Self::MissingTtl => f.write_str("no TTL given and no $TTL in effect"),
            Self::UnknownType => f.write_str("unrecognized RR type"),
            Self::BadRdata(field) => write!(f, "invalid RDATA: {field}"),
            Self::TrailingData => f.write_str("extra fields after the RDATA"),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
