use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A typed index into an [`Arena`].
///
/// Indices are plain integers tagged with the type they point to, so an agent id can never
/// be used to look up a port. They carry no reference to the arena itself, which is what lets
/// a [`Net`](super::net::Net) be cloned, merged and relocated freely.
pub struct Index<T>(u32, PhantomData<fn() -> T>);

impl<T> Index<T> {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw, PhantomData)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    fn slot(self) -> usize {
        self.0 as usize
    }
}

impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Index<T> {}

impl<T> PartialEq for Index<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T> Eq for Index<T> {}

impl<T> PartialOrd for Index<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Index<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for Index<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T> Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl<T> Display for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone)]
/// Slot storage with free-list reuse.
///
/// Allocation hands out the most recently freed slot first, and only grows the backing
/// vector when nothing is free. The allocation counter is part of the arena, so two arenas
/// never share ids and the sequence of ids is reproducible from the sequence of operations.
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn alloc(&mut self, data: T) -> Index<T> {
        self.alloc_with(|_| data)
    }

    /// Allocate a slot whose contents need to know their own index.
    pub fn alloc_with(&mut self, make: impl FnOnce(Index<T>) -> T) -> Index<T> {
        let index = match self.free.pop() {
            Some(raw) => Index::from_raw(raw),
            None => {
                self.slots.push(None);
                Index::from_raw((self.slots.len() - 1) as u32)
            }
        };
        self.slots[index.slot()] = Some(make(index));
        self.live += 1;
        index
    }

    pub fn get(&self, index: Index<T>) -> Option<&T> {
        self.slots.get(index.slot()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: Index<T>) -> Option<&mut T> {
        self.slots.get_mut(index.slot()).and_then(Option::as_mut)
    }

    pub fn contains(&self, index: Index<T>) -> bool {
        self.get(index).is_some()
    }

    pub fn remove(&mut self, index: Index<T>) -> Option<T> {
        let taken = self.slots.get_mut(index.slot())?.take()?;
        self.free.push(index.0);
        self.live -= 1;
        Some(taken)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Index<T>, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|data| (Index::from_raw(i as u32), data)))
    }
}

/// Arenas compare by their live entries only; the free list and vacant slots are
/// allocation history, not contents.
impl<T: PartialEq> PartialEq for Arena<T> {
    fn eq(&self, other: &Self) -> bool {
        self.live == other.live && self.iter().eq(other.iter())
    }
}

impl<T: Debug> Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
