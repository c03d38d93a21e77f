//! Identifier space arithmetic.
//!
//! Every position on the ring is an integer in `[0, 2^m)`. All offsets
//! computed relative to a node (finger starts, `id - 2^i` origins, clockwise
//! distances) are reduced back into that range here, so the rest of the crate
//! never sees a negative or overflowing identifier.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of identifier bits (a 1024-slot ring).
pub const DEFAULT_BITS: u32 = 10;

/// Largest supported number of identifier bits.
///
/// Identifiers are stored as `u64`; intermediate arithmetic is done in `i128`.
pub const MAX_BITS: u32 = 63;

/// The circular identifier space `[0, 2^m)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct IdSpace {
    bits: u32,
}

impl IdSpace {
    /// Creates a space of `2^bits` identifiers.
    pub fn new(bits: u32) -> Result<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(Error::InvalidBits(bits));
        }
        Ok(Self { bits })
    }

    /// Number of identifier bits (`m`), which is also the finger-table size.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of slots on the ring (`2^m`).
    #[inline]
    pub fn size(&self) -> u64 {
        1u64 << self.bits
    }

    /// True if `id` is a valid position on this ring.
    #[inline]
    pub fn contains(&self, id: u64) -> bool {
        id < self.size()
    }

    /// Returns `id` unchanged if it lies on the ring.
    pub fn check(&self, id: u64) -> Result<u64> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(Error::IdOutOfRange {
                id,
                size: self.size(),
            })
        }
    }

    /// Reduces any signed value into `[0, 2^m)`.
    ///
    /// The size is added before the final remainder so negative intermediates
    /// wrap forward instead of staying negative.
    #[inline]
    pub fn wrap(&self, value: i128) -> u64 {
        let size = self.size() as i128;
        (((value % size) + size) % size) as u64
    }

    /// Start of the `index`-th finger of `id`: `(id + 2^index) mod 2^m`.
    #[inline]
    pub fn finger_start(&self, id: u64, index: usize) -> u64 {
        self.wrap(id as i128 + (1i128 << index))
    }

    /// The identifier `id - 2^index`, wrapped forward onto the ring.
    ///
    /// Nodes at or just before this point may hold `id` as their
    /// `index`-th finger.
    #[inline]
    pub fn finger_origin(&self, id: u64, index: usize) -> u64 {
        self.wrap(id as i128 - (1i128 << index))
    }

    /// Clockwise distance travelled from `from` to reach `to`.
    #[inline]
    pub fn distance(&self, from: u64, to: u64) -> u64 {
        self.wrap(to as i128 - from as i128)
    }
}

impl Default for IdSpace {
    fn default() -> Self {
        Self {
            bits: DEFAULT_BITS,
        }
    }
}

impl TryFrom<u32> for IdSpace {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        Self::new(bits)
    }
}

impl From<IdSpace> for u32 {
    fn from(space: IdSpace) -> Self {
        space.bits
    }
}

/// True iff `x` lies on the clockwise arc from `a` to `b`.
///
/// `inclusive` decides whether the endpoints themselves match. When `a >= b`
/// the arc wraps through zero, and `a == b` denotes the whole ring.
#[inline]
pub fn between(a: u64, x: u64, b: u64, inclusive: bool) -> bool {
    if a < b {
        if inclusive {
            a <= x && x <= b
        } else {
            a < x && x < b
        }
    } else if inclusive {
        x >= a || x <= b
    } else {
        x > a || x < b
    }
}

/// True iff `x` lies in the half-open arc `(a, b]`.
///
/// This is the ownership interval of an edge `a -> b`: every identifier in it
/// resolves to `b`. With `a == b` it covers everything except `a` itself.
#[inline]
pub fn in_half_open(a: u64, x: u64, b: u64) -> bool {
    x != a && between(a, x, b, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_truth_table() {
        assert!(between(5, 7, 10, false));
        assert!(!between(5, 10, 10, false));
        assert!(between(5, 10, 10, true));
        assert!(between(10, 2, 5, false), "wraparound");
        assert!(between(10, 2, 5, true));
        assert!(between(1, 1, 1, true));
        assert!(!between(1, 1, 1, false));
    }

    #[test]
    fn test_between_exclusive_endpoints() {
        assert!(!between(5, 5, 10, false));
        assert!(between(5, 5, 10, true));
        assert!(!between(10, 10, 5, false));
        assert!(!between(10, 5, 5, false));
        assert!(!between(10, 7, 5, true));
    }

    #[test]
    fn test_in_half_open() {
        assert!(in_half_open(0, 20, 20));
        assert!(!in_half_open(20, 20, 100));
        assert!(in_half_open(500, 999, 0));
        assert!(in_half_open(500, 0, 0));
        // Singleton arc covers all but its own point.
        assert!(in_half_open(7, 3, 7));
        assert!(!in_half_open(7, 7, 7));
    }

    #[test]
    fn test_space_bounds() {
        assert!(matches!(IdSpace::new(0), Err(Error::InvalidBits(0))));
        assert!(matches!(IdSpace::new(64), Err(Error::InvalidBits(64))));
        let space = IdSpace::new(MAX_BITS).unwrap();
        assert_eq!(space.size(), 1u64 << 63);

        let space = IdSpace::default();
        assert_eq!(space.size(), 1024);
        assert!(space.check(1023).is_ok());
        assert!(matches!(
            space.check(1024),
            Err(Error::IdOutOfRange { id: 1024, size: 1024 })
        ));
    }

    #[test]
    fn test_wrapping_offsets() {
        let space = IdSpace::default();
        assert_eq!(space.finger_start(0, 0), 1);
        assert_eq!(space.finger_start(1000, 5), 8);
        assert_eq!(space.finger_start(600, 9), 88);
        assert_eq!(space.finger_origin(20, 5), 1012);
        assert_eq!(space.finger_origin(0, 0), 1023);
        assert_eq!(space.wrap(-1), 1023);
        assert_eq!(space.wrap(-2048), 0);
        assert_eq!(space.distance(1000, 10), 34);
        assert_eq!(space.distance(10, 1000), 990);
    }

    #[test]
    fn test_widest_space_does_not_overflow() {
        let space = IdSpace::new(MAX_BITS).unwrap();
        let last = space.size() - 1;
        assert_eq!(space.finger_start(last, 62), (1u64 << 62) - 1);
        assert_eq!(space.finger_origin(0, 62), 1u64 << 62);
    }
}
