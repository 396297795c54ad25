//! Per-entity attribute storage
//!
//! An [`Attribute`] attaches one value to an entity id with O(1) access.
//! Values are tagged with the generation they were written for, so a value
//! left behind by a removed entity is never visible through a new id that
//! reuses the same slot.

use crate::ids::EntityId;
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct Attribute<I, V> {
    slots: Vec<Option<(u32, V)>>,
    _marker: PhantomData<fn() -> I>,
}

impl<I: EntityId, V> Default for Attribute<I, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: EntityId, V> Attribute<I, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn get(&self, id: I) -> Option<&V> {
        match self.slots.get(id.index() as usize) {
            Some(Some((generation, value))) if *generation == id.generation() => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut V> {
        match self.slots.get_mut(id.index() as usize) {
            Some(Some((generation, value))) if *generation == id.generation() => Some(value),
            _ => None,
        }
    }

    /// Store `value` for `id`, returning the previous value of the same entity
    pub fn insert(&mut self, id: I, value: V) -> Option<V> {
        let index = id.index() as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        match self.slots[index].replace((id.generation(), value)) {
            Some((generation, old)) if generation == id.generation() => Some(old),
            _ => None,
        }
    }

    pub fn remove(&mut self, id: I) -> Option<V> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        let live = matches!(slot, Some((generation, _)) if *generation == id.generation());
        if live {
            slot.take().map(|(_, value)| value)
        } else {
            None
        }
    }

    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &V)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|(generation, value)| (I::from_parts(index as u32, *generation), value))
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PinId;

    #[test]
    fn test_insert_and_overwrite() {
        let mut attr: Attribute<PinId, f64> = Attribute::new();
        let pin = PinId::from_parts(7, 0);

        assert_eq!(attr.insert(pin, 1.5), None);
        assert_eq!(attr.insert(pin, 2.5), Some(1.5));
        assert_eq!(attr.get(pin), Some(&2.5));
        assert_eq!(attr.len(), 1);
    }

    #[test]
    fn test_generation_mismatch_hides_value() {
        let mut attr: Attribute<PinId, u32> = Attribute::new();
        let old = PinId::from_parts(0, 0);
        let new = PinId::from_parts(0, 1);
        attr.insert(old, 10);

        assert_eq!(attr.get(new), None);
        assert_eq!(attr.remove(new), None);
        assert_eq!(attr.insert(new, 20), None);
        assert_eq!(attr.get(old), None);
        assert_eq!(attr.get(new), Some(&20));
    }
}
