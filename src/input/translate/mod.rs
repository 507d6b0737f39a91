//! Translation of native key and button codes into [`KeyCode`]s.
//!
//! Each backend owns a pure translation function. All of them follow the
//! same two rules:
//!
//! 1. Native ranges which map onto a contiguous block of the vocabulary
//!    (letters, digits, numpad digits, function keys) are resolved by offset
//!    from a single anchor pair, see [`KeyRange`].
//! 2. Everything else is looked up in an explicit table of exact pairs.
//!
//! Codes which match neither rule become [`KeyCode::Unsupported`].
//! Translation never fails.

pub mod win32;
pub mod x11;

use crate::input::keyboard::KeyCode;

use ::std::{collections::HashMap, hash::Hash};

/// A contiguous range of native codes anchored onto a contiguous block of
/// [`KeyCode`]s. Both bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct KeyRange {
    first: u32,
    last: u32,
    anchor: KeyCode,
}

impl KeyRange {
    pub(crate) const fn new(first: u32, last: u32, anchor: KeyCode) -> Self {
        Self {
            first,
            last,
            anchor,
        }
    }

    /// Resolves `native` by its offset from the start of the range.
    pub(crate) fn resolve(&self, native: u32) -> Option<KeyCode> {
        if (self.first..=self.last).contains(&native) {
            self.anchor.offset(native - self.first)
        } else {
            None
        }
    }
}

/// Applies the range rule, then the table rule, then falls back to
/// [`KeyCode::Unsupported`].
pub(crate) fn resolve<K>(native: K, ranges: &[KeyRange], table: &HashMap<K, KeyCode>) -> KeyCode
where
    K: Copy + Eq + Hash + Into<u32>,
{
    ranges
        .iter()
        .find_map(|range| range.resolve(native.into()))
        .or_else(|| table.get(&native).copied())
        .unwrap_or(KeyCode::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ::maplit::hashmap;
    use ::pretty_assertions::assert_eq;

    #[test]
    fn test_range_bounds() {
        let range = KeyRange::new(10, 12, KeyCode::X);
        assert_eq!(range.resolve(9), None);
        assert_eq!(range.resolve(10), Some(KeyCode::X));
        assert_eq!(range.resolve(11), Some(KeyCode::Y));
        assert_eq!(range.resolve(12), Some(KeyCode::Z));
        assert_eq!(range.resolve(13), None);
    }

    /// Ranges take precedence over the table and misses fall through to the
    /// sentinel.
    #[test]
    fn test_resolve_order() {
        let ranges = [KeyRange::new(0x41, 0x43, KeyCode::A)];
        let table = hashmap! {
            0x41_u32 => KeyCode::Space,
            0x20_u32 => KeyCode::Space,
        };

        assert_eq!(resolve(0x41_u32, &ranges, &table), KeyCode::A);
        assert_eq!(resolve(0x20_u32, &ranges, &table), KeyCode::Space);
        assert_eq!(resolve(0x99_u32, &ranges, &table), KeyCode::Unsupported);
    }
}
