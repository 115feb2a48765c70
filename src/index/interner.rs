//! Ordered value table with reverse lookup

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use super::{Handle, HandleWidth};
use crate::error::{CovxError, Result};

/// Hands out one handle per distinct value, in first-seen order.
///
/// Values are never removed, so a handle stays valid for the life of the table.
#[derive(Debug, Clone)]
pub struct Interner<T> {
    values: Vec<T>,
    lookup: HashMap<T, Handle>,
    width: HandleWidth,
}

impl<T: Clone + Eq + Hash> Interner<T> {
    pub fn new(width: HandleWidth) -> Self {
        Self {
            values: Vec::new(),
            lookup: HashMap::new(),
            width,
        }
    }

    /// Handle of `value`, allocating the next one if it is new.
    pub fn intern(&mut self, value: T) -> Result<Handle> {
        if let Some(&handle) = self.lookup.get(&value) {
            return Ok(handle);
        }

        let next = self.values.len() as u64;
        if next > self.width.max_handle() {
            return Err(CovxError::HandleOverflow { width: self.width });
        }

        let handle = Handle(next);
        self.lookup.insert(value.clone(), handle);
        self.values.push(value);
        Ok(handle)
    }

    /// Fail with `HandleOverflow` unless `additional` new values still fit.
    pub fn ensure_room(&self, additional: usize) -> Result<()> {
        let needed = self.values.len() as u128 + additional as u128;
        if needed > u128::from(self.width.max_handle()) + 1 {
            return Err(CovxError::HandleOverflow { width: self.width });
        }
        Ok(())
    }

    /// Handle of `value` if it has been seen.
    pub fn lookup<Q>(&self, value: &Q) -> Option<Handle>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup.get(value).copied()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.values.get(handle.index())
    }

    pub fn width(&self) -> HandleWidth {
        self.width
    }

    pub fn contains(&self, handle: Handle) -> bool {
        handle.index() < self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (Handle(i as u64), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let mut table = Interner::new(HandleWidth::U32);
        let a = table.intern("a".to_string()).unwrap();
        let b = table.intern("b".to_string()).unwrap();
        let a_again = table.intern("a".to_string()).unwrap();

        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
        assert_eq!(a, a_again);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(b).map(String::as_str), Some("b"));
        assert_eq!(table.lookup("a"), Some(a));
        assert_eq!(table.lookup("c"), None);
    }

    #[test]
    fn test_iter_matches_handles() {
        let mut table = Interner::new(HandleWidth::U64);
        for v in [30u32, 10, 20, 10] {
            table.intern(v).unwrap();
        }
        let items: Vec<_> = table.iter().map(|(h, v)| (h.get(), *v)).collect();
        assert_eq!(items, vec![(0, 30), (1, 10), (2, 20)]);
    }

    #[test]
    fn test_overflow() {
        let mut table = Interner::new(HandleWidth::U16);
        for v in 0..=u16::MAX as u32 {
            table.intern(v).unwrap();
        }
        assert_eq!(table.len(), 65_536);

        // Known values still resolve once the space is full.
        assert_eq!(table.intern(5).unwrap().get(), 5);

        let err = table.intern(70_000).unwrap_err();
        assert!(matches!(
            err,
            CovxError::HandleOverflow {
                width: HandleWidth::U16
            }
        ));
        assert_eq!(table.len(), 65_536);
    }
}
