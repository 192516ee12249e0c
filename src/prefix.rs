//! IP prefixes and the bitwise prefix algebra.
//!
//! Prefixes are fixed-width: the address always lives in a 16-byte array and
//! only the first 4 (IPv4) or 16 (IPv6) bytes are meaningful. Mask
//! construction and containment tests never allocate.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Size of the backing address array.
pub const MAX_ADDRESS_BYTES: usize = 16;

/// IP address family of a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// 32-bit addresses.
    Ipv4,
    /// 128-bit addresses.
    Ipv6,
}

impl AddressFamily {
    /// Number of address bytes.
    #[must_use]
    pub const fn byte_len(self) -> usize {
        match self {
            Self::Ipv4 => 4,
            Self::Ipv6 => 16,
        }
    }

    /// Number of address bits.
    #[must_use]
    pub const fn width(self) -> u8 {
        match self {
            Self::Ipv4 => 32,
            Self::Ipv6 => 128,
        }
    }

    /// Family for a raw address of `len` bytes, if any.
    #[must_use]
    pub const fn from_byte_len(len: usize) -> Option<Self> {
        match len {
            4 => Some(Self::Ipv4),
            16 => Some(Self::Ipv6),
            _ => None,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "IPv4"),
            Self::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// Builds a mask of `length` leading one-bits over `byte_len` bytes.
///
/// Whole bytes are `0xFF`, the boundary byte is `0xFF << (8 - remaining)`, and
/// everything after is zero. A `length` beyond `8 * byte_len` saturates to an
/// all-ones mask.
#[must_use]
pub fn length_mask(length: u8, byte_len: usize) -> [u8; MAX_ADDRESS_BYTES] {
    let byte_len = byte_len.min(MAX_ADDRESS_BYTES);
    let mut mask = [0u8; MAX_ADDRESS_BYTES];
    let full = usize::from(length / 8).min(byte_len);
    for b in &mut mask[..full] {
        *b = 0xFF;
    }
    let remaining = length % 8;
    if remaining > 0 && full < byte_len {
        mask[full] = 0xFF << (8 - remaining);
    }
    mask
}

/// Raw containment test over address bytes.
///
/// True iff the first `parent_length` bits of `child` equal `parent`. Byte
/// slices of different lengths (family mismatch) yield `false`.
#[must_use]
pub fn address_in_prefix(child: &[u8], parent: &[u8], parent_length: u8) -> bool {
    if child.len() != parent.len() || parent.len() > MAX_ADDRESS_BYTES {
        return false;
    }
    let mask = length_mask(parent_length, parent.len());
    child
        .iter()
        .zip(parent)
        .zip(&mask)
        .all(|((c, p), m)| c & m == *p)
}

/// Returns true if the first `parent.length()` bits of `child`'s address equal
/// `parent`'s address.
///
/// Only addresses are compared: a shorter `child` whose address falls in
/// `parent` also passes. Prefixes of different families are never contained
/// in one another.
#[must_use]
pub fn contained_in(child: &Prefix, parent: &Prefix) -> bool {
    child.family == parent.family
        && address_in_prefix(child.address(), parent.address(), parent.length)
}

/// Computes the highest sub-prefix of `start` reachable within `max_length`.
///
/// Bits in `[start.length, max_length)` are set to one; leading bits are kept
/// and bits past `max_length` stay zero, so the result is the last prefix of
/// length `max_length` inside `start`. When `max_length` is absent, not longer
/// than `start`, or beyond the family width, `start` is returned unchanged.
///
/// This is a range-query aid, not a routable address.
#[must_use]
pub fn end_of_range(start: &Prefix, max_length: Option<u8>) -> Prefix {
    let Some(max_length) = max_length else {
        return *start;
    };
    if max_length <= start.length || max_length > start.family.width() {
        return *start;
    }

    let byte_len = start.family.byte_len();
    let outer = length_mask(max_length, byte_len);
    let inner = length_mask(start.length, byte_len);
    let mut address = start.address;
    for ((a, o), i) in address.iter_mut().zip(&outer).zip(&inner) {
        *a |= o & !i;
    }

    Prefix {
        family: start.family,
        address,
        length: max_length,
    }
}

/// An IPv4 or IPv6 prefix: address bytes plus a prefix length.
///
/// Invariants enforced at construction: the address has 4 or 16 bytes, the
/// length does not exceed the family width, and no bit past the length is set.
/// Ordering is by family, then address, then length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix {
    family: AddressFamily,
    address: [u8; MAX_ADDRESS_BYTES],
    length: u8,
}

impl Prefix {
    /// Creates a prefix from raw address bytes and a length.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the byte count is not 4 or 16, the length
    /// exceeds the family width, or host bits are set.
    pub fn new(bytes: &[u8], length: u8) -> Result<Self, ValidationError> {
        let family = AddressFamily::from_byte_len(bytes.len())
            .ok_or(ValidationError::AddressLength { actual: bytes.len() })?;
        if length > family.width() {
            return Err(ValidationError::PrefixLengthOutOfRange {
                length,
                width: family.width(),
            });
        }

        let mut address = [0u8; MAX_ADDRESS_BYTES];
        address[..bytes.len()].copy_from_slice(bytes);
        let prefix = Self {
            family,
            address,
            length,
        };

        let mask = length_mask(length, family.byte_len());
        if address.iter().zip(&mask).any(|(a, m)| a & !m != 0) {
            return Err(ValidationError::HostBitsSet {
                address: prefix.ip_addr().to_string(),
                length,
            });
        }
        Ok(prefix)
    }

    /// Creates a prefix from an IP address and a length.
    ///
    /// # Errors
    /// Same conditions as [`Prefix::new`].
    pub fn from_ip(addr: IpAddr, length: u8) -> Result<Self, ValidationError> {
        match addr {
            IpAddr::V4(v4) => Self::new(&v4.octets(), length),
            IpAddr::V6(v6) => Self::new(&v6.octets(), length),
        }
    }

    /// Creates a host prefix (`/32` or `/128`) for a single address.
    #[must_use]
    pub fn host(addr: IpAddr) -> Self {
        let mut address = [0u8; MAX_ADDRESS_BYTES];
        let family = match addr {
            IpAddr::V4(v4) => {
                address[..4].copy_from_slice(&v4.octets());
                AddressFamily::Ipv4
            }
            IpAddr::V6(v6) => {
                address = v6.octets();
                AddressFamily::Ipv6
            }
        };
        Self {
            family,
            address,
            length: family.width(),
        }
    }

    /// Address family.
    #[must_use]
    pub const fn family(&self) -> AddressFamily {
        self.family
    }

    /// Prefix length in bits.
    #[must_use]
    pub const fn length(&self) -> u8 {
        self.length
    }

    /// Address bytes (4 or 16 of them).
    #[must_use]
    pub fn address(&self) -> &[u8] {
        &self.address[..self.family.byte_len()]
    }

    /// Address as a standard library IP address.
    #[must_use]
    pub fn ip_addr(&self) -> IpAddr {
        match self.family {
            AddressFamily::Ipv4 => IpAddr::V4(Ipv4Addr::new(
                self.address[0],
                self.address[1],
                self.address[2],
                self.address[3],
            )),
            AddressFamily::Ipv6 => IpAddr::V6(Ipv6Addr::from(self.address)),
        }
    }

    /// Mask of `length` leading one-bits for this prefix's family.
    #[must_use]
    pub fn mask(&self) -> [u8; MAX_ADDRESS_BYTES] {
        length_mask(self.length, self.family.byte_len())
    }

    /// Returns true if `other` lies inside this prefix and is at least as long.
    #[must_use]
    pub fn contains(&self, other: &Prefix) -> bool {
        other.length >= self.length && contained_in(other, self)
    }

    /// Returns true if one prefix contains the other.
    #[must_use]
    pub fn intersects(&self, other: &Prefix) -> bool {
        contained_in(self, other) || contained_in(other, self)
    }

    /// The enclosing prefix of `length` bits (host bits cleared).
    ///
    /// Returns `None` if `length` is longer than this prefix.
    #[must_use]
    pub fn truncate(&self, length: u8) -> Option<Prefix> {
        if length > self.length {
            return None;
        }
        let mask = length_mask(length, self.family.byte_len());
        let mut address = self.address;
        for (a, m) in address.iter_mut().zip(&mask) {
            *a &= m;
        }
        Some(Prefix {
            family: self.family,
            address,
            length,
        })
    }

    /// The last address covered by this prefix, as a full-width host prefix.
    #[must_use]
    pub fn last_address(&self) -> Prefix {
        end_of_range(self, Some(self.family.width()))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip_addr(), self.length)
    }
}

impl FromStr for Prefix {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidPrefix {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (addr, len) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("missing '/<length>'"))?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid("bad address"))?;
        let len: u8 = len.parse().map_err(|_| invalid("bad length"))?;
        Self::from_ip(addr, len)
    }
}

impl Serialize for Prefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Prefix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
