//! The generic slot container.
//!
//! [`ContainerArray<T>`] stores elements in a slot vector with a LIFO free
//! list. Insertion pops a free slot or grows the vector geometrically;
//! removal pushes the slot back and bumps its generation so that older
//! handles become stale. Nothing is ever compacted, so a live element keeps
//! its slot for as long as it stays in the container.

use crate::config::ContainerConfig;
use crate::error::ContainerError;
use crate::footprint::ContainerFootprint;
use crate::handle::SlotIndex;

/// One slot: the generation stamp plus the element, if any.
#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// The exact slot layout of a container, without its elements.
///
/// Captured by checkpoints so that a restored container hands out the same
/// slots, in the same order, as the original would have.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerLayout {
    /// Generation of every slot; `generations.len()` is the capacity.
    pub generations: Vec<u32>,
    /// Free slots in stack order (the last entry is reused first).
    pub free_list: Vec<u32>,
}

/// Index-addressable collection with stable slot handles.
///
/// Instantiated separately for tracers and sources. All operations are
/// O(1) except growth (amortised O(1)) and iteration.
#[derive(Clone, Debug)]
pub struct ContainerArray<T> {
    slots: Vec<Slot<T>>,
    /// Free slot indices. Popped from the back.
    free_list: Vec<u32>,
    len: usize,
    config: ContainerConfig,
}

impl<T> ContainerArray<T> {
    /// Create an empty container. No slots are allocated until the first
    /// insertion.
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            config,
        }
    }

    /// Insert an element and return its handle.
    ///
    /// Reuses the most recently freed slot if there is one, otherwise grows
    /// the container by the configured factor and uses the lowest new slot.
    pub fn put(&mut self, value: T) -> Result<SlotIndex, ContainerError> {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                self.grow()?;
                self.free_list
                    .pop()
                    .ok_or(ContainerError::CapacityExceeded {
                        requested: self.slots.len() + 1,
                        limit: self.config.max_capacity,
                    })?
            }
        };
        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.value.is_none(), "free list handed out a used slot");
        slot.value = Some(value);
        self.len += 1;
        Ok(SlotIndex {
            index,
            generation: slot.generation,
        })
    }

    /// Grow until `additional` more elements fit without further growth.
    ///
    /// The next `additional` calls to [`put`](Self::put) then cannot fail,
    /// and hand out the same slots they would have without the
    /// reservation: already-free slots first, then new slots lowest first.
    /// On failure the container keeps whatever growth succeeded.
    pub fn reserve(&mut self, additional: usize) -> Result<(), ContainerError> {
        let free = self.free_list.len();
        if additional <= free {
            return Ok(());
        }
        let before = self.slots.len();
        let held = std::mem::take(&mut self.free_list);
        let grown = loop {
            if self.slots.len() - before >= additional - free {
                break Ok(());
            }
            if let Err(e) = self.grow() {
                break Err(e);
            }
        };
        // New slots go under the ones that were already free.
        let mut free_list: Vec<u32> = (before..self.slots.len()).rev().map(|i| i as u32).collect();
        free_list.extend(held);
        self.free_list = free_list;
        grown
    }

    /// Grow capacity by one growth step.
    fn grow(&mut self) -> Result<(), ContainerError> {
        let current = self.slots.len();
        let limit = self.config.max_capacity.min(ContainerConfig::MAX_ADDRESSABLE);
        let target = self.config.next_capacity(current).min(limit);
        if target <= current {
            return Err(ContainerError::CapacityExceeded {
                requested: current + 1,
                limit,
            });
        }
        let extra = target - current;
        let refused = ContainerError::CapacityExceeded {
            requested: target,
            limit,
        };
        self.slots
            .try_reserve_exact(extra)
            .map_err(|_| refused.clone())?;
        self.free_list.try_reserve(extra).map_err(|_| refused)?;

        self.slots.extend((0..extra).map(|_| Slot {
            generation: 0,
            value: None,
        }));
        // Highest index pushed first so the lowest new slot is popped next.
        self.free_list
            .extend((current..target).rev().map(|i| i as u32));
        Ok(())
    }

    fn stale(handle: SlotIndex) -> ContainerError {
        ContainerError::StaleIndex {
            index: handle.index,
            generation: handle.generation,
        }
    }

    fn slot_mut(&mut self, handle: SlotIndex) -> Result<&mut Slot<T>, ContainerError> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation && slot.value.is_some() => {
                Ok(slot)
            }
            _ => Err(Self::stale(handle)),
        }
    }

    /// Borrow the element behind a handle.
    pub fn get(&self, handle: SlotIndex) -> Result<&T, ContainerError> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
            .ok_or(Self::stale(handle))
    }

    /// Mutably borrow the element behind a handle.
    pub fn get_mut(&mut self, handle: SlotIndex) -> Result<&mut T, ContainerError> {
        let slot = self.slot_mut(handle)?;
        slot.value.as_mut().ok_or(Self::stale(handle))
    }

    /// Overwrite the element behind a handle in place, returning the old one.
    ///
    /// The handle stays valid.
    pub fn replace(&mut self, handle: SlotIndex, value: T) -> Result<T, ContainerError> {
        let slot = self.slot_mut(handle)?;
        slot.value.replace(value).ok_or(Self::stale(handle))
    }

    /// Remove the element behind a handle and free its slot.
    ///
    /// The slot's generation is bumped, so `handle` (and any copy of it) is
    /// stale from now on.
    pub fn remove(&mut self, handle: SlotIndex) -> Result<T, ContainerError> {
        let slot = self.slot_mut(handle)?;
        let value = slot.value.take().ok_or(Self::stale(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.len -= 1;
        Ok(value)
    }

    /// Remove every element matching `pred`, in slot order.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<(SlotIndex, T)> {
        let doomed: Vec<SlotIndex> = self
            .iter()
            .filter(|(_, value)| pred(value))
            .map(|(handle, _)| handle)
            .collect();
        doomed
            .into_iter()
            .filter_map(|handle| self.remove(handle).ok().map(|v| (handle, v)))
            .collect()
    }

    /// Whether the handle currently resolves to an element.
    pub fn contains(&self, handle: SlotIndex) -> bool {
        self.get(handle).is_ok()
    }

    /// Iterate over used slots in index order.
    ///
    /// The iterator borrows the container; calling `iter()` again restarts
    /// from the first slot.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotIndex {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }

    /// Mutably iterate over used slots in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotIndex, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|value| {
                (
                    SlotIndex {
                        index: i as u32,
                        generation,
                    },
                    value,
                )
            })
        })
    }

    /// Iterate over the elements only, in index order.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }

    /// Remove every element, keeping the allocated slots.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free_list.clear();
        self.free_list
            .extend((0..self.slots.len()).rev().map(|i| i as u32));
        self.len = 0;
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the container holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of free slots available without growing.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// The growth policy this container was built with.
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Capacity and byte usage, for memory accounting.
    pub fn footprint(&self) -> ContainerFootprint {
        let slot_bytes = std::mem::size_of::<Slot<T>>();
        ContainerFootprint {
            capacity: self.slots.len(),
            used: self.len,
            free: self.free_list.len(),
            slot_bytes,
            bytes: self.slots.capacity() * slot_bytes
                + self.free_list.capacity() * std::mem::size_of::<u32>(),
        }
    }

    /// Snapshot of the slot layout (generations and free-list order).
    pub fn layout(&self) -> ContainerLayout {
        ContainerLayout {
            generations: self.slots.iter().map(|slot| slot.generation).collect(),
            free_list: self.free_list.clone(),
        }
    }

    /// Rebuild a container from a layout and its elements.
    ///
    /// `elements` pairs raw slot indices with values. Every slot must be
    /// either used exactly once or on the free list exactly once.
    pub fn from_layout(
        config: ContainerConfig,
        layout: ContainerLayout,
        elements: impl IntoIterator<Item = (u32, T)>,
    ) -> Result<Self, ContainerError> {
        let capacity = layout.generations.len();
        if capacity > config.max_capacity {
            return Err(ContainerError::InvalidLayout {
                reason: format!(
                    "capacity {capacity} exceeds limit {}",
                    config.max_capacity
                ),
            });
        }
        let mut slots: Vec<Slot<T>> = layout
            .generations
            .iter()
            .map(|&generation| Slot {
                generation,
                value: None,
            })
            .collect();

        let mut len = 0;
        for (index, value) in elements {
            let slot = slots
                .get_mut(index as usize)
                .ok_or_else(|| ContainerError::InvalidLayout {
                    reason: format!("element slot {index} out of range (capacity {capacity})"),
                })?;
            if slot.value.is_some() {
                return Err(ContainerError::InvalidLayout {
                    reason: format!("slot {index} used twice"),
                });
            }
            slot.value = Some(value);
            len += 1;
        }

        let mut on_free_list = vec![false; capacity];
        for &index in &layout.free_list {
            let i = index as usize;
            if i >= capacity {
                return Err(ContainerError::InvalidLayout {
                    reason: format!("free slot {index} out of range (capacity {capacity})"),
                });
            }
            if on_free_list[i] || slots[i].value.is_some() {
                return Err(ContainerError::InvalidLayout {
                    reason: format!("free slot {index} is also used or listed twice"),
                });
            }
            on_free_list[i] = true;
        }
        if len + layout.free_list.len() != capacity {
            return Err(ContainerError::InvalidLayout {
                reason: format!(
                    "{len} used + {} free slots do not cover capacity {capacity}",
                    layout.free_list.len()
                ),
            });
        }

        let mut free_list = layout.free_list;
        free_list.reserve(capacity.saturating_sub(free_list.len()));
        Ok(Self {
            slots,
            free_list,
            len,
            config,
        })
    }
}

impl<T> Default for ContainerArray<T> {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}
