//! Ring-buffer storage shared by every chain of a billboard chain.
//!
//! All chains live in one flat, preallocated `Vec<Element>` of
//! `max_elements * chain_count` slots. Chain `c` owns the window
//! `[c * max_elements, (c + 1) * max_elements)` and tracks its live range
//! with a head (newest) and tail (oldest) offset relative to the window
//! start. Both ends are inclusive and wrap modulo `max_elements`.
//!
//! New elements are written one slot *before* the current head, so walking
//! forward through memory from head reaches the tail. When the head wraps
//! onto the tail the chain is full and the tail steps back too, dropping
//! the oldest element.

use super::element::Element;
use crate::error::ChainError;

/// Live range of one chain inside the shared backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSegment {
    /// Offset of this chain's window in the backing store.
    pub start: usize,
    /// `(head, tail)` relative to `start`; `None` when the chain is empty.
    ends: Option<(usize, usize)>,
}

impl ChainSegment {
    fn empty(start: usize) -> Self {
        Self { start, ends: None }
    }

    /// Newest element offset, `None` when empty.
    #[must_use]
    pub fn head(&self) -> Option<usize> {
        self.ends.map(|(head, _)| head)
    }

    /// Oldest element offset, `None` when empty.
    #[must_use]
    pub fn tail(&self) -> Option<usize> {
        self.ends.map(|(_, tail)| tail)
    }

    /// Wrapping distance between head and tail, inclusive.
    #[must_use]
    pub fn len(&self, max_elements: usize) -> usize {
        match self.ends {
            None => 0,
            Some((head, tail)) if tail < head => tail + max_elements - head + 1,
            Some((head, tail)) => tail - head + 1,
        }
    }

    /// Whether the chain holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ends.is_none()
    }
}

/// Borrowed, read-only view of one chain's live elements.
#[derive(Debug, Clone, Copy)]
pub struct ChainView<'a> {
    window: &'a [Element],
    head: usize,
    len: usize,
}

impl<'a> ChainView<'a> {
    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the chain holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element `index` counted from the head (0 = newest).
    #[must_use]
    pub fn newest(&self, index: usize) -> Option<&'a Element> {
        (index < self.len).then(|| &self.window[(self.head + index) % self.window.len()])
    }

    /// Element `index` counted from the tail (0 = oldest).
    #[must_use]
    pub fn oldest(&self, index: usize) -> Option<&'a Element> {
        (index < self.len).then(|| self.newest(self.len - 1 - index)).flatten()
    }

    /// Live elements from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'a Element> + ExactSizeIterator + 'a {
        let view = *self;
        (0..self.len).rev().map(move |i| &view.window[(view.head + i) % view.window.len()])
    }
}

/// Flat backing store plus one [`ChainSegment`] per chain.
#[derive(Debug, Clone)]
pub struct ChainStorage {
    max_elements: usize,
    elements: Vec<Element>,
    segments: Vec<ChainSegment>,
}

impl ChainStorage {
    /// Allocate storage for `chain_count` chains of `max_elements` each.
    ///
    /// Every chain starts empty.
    pub fn new(max_elements: usize, chain_count: usize) -> Result<Self, ChainError> {
        if max_elements == 0 {
            return Err(ChainError::InvalidConfiguration(
                "max elements per chain must be at least 1".to_owned(),
            ));
        }
        let segments = (0..chain_count)
            .map(|c| ChainSegment::empty(c * max_elements))
            .collect();
        Ok(Self {
            max_elements,
            elements: vec![Element::default(); max_elements * chain_count],
            segments,
        })
    }

    /// Capacity of each chain.
    #[must_use]
    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    /// Number of chains.
    #[must_use]
    pub fn chain_count(&self) -> usize {
        self.segments.len()
    }

    /// Total backing slots (`max_elements * chain_count`).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// Segment descriptor of `chain`.
    pub fn segment(&self, chain: usize) -> Result<&ChainSegment, ChainError> {
        self.segments
            .get(chain)
            .ok_or_else(|| ChainError::chain_index(chain, self.segments.len()))
    }

    fn segment_mut(&mut self, chain: usize) -> Result<&mut ChainSegment, ChainError> {
        let count = self.segments.len();
        self.segments
            .get_mut(chain)
            .ok_or_else(|| ChainError::chain_index(chain, count))
    }

    /// Insert `element` at the head of `chain`, evicting the tail when full.
    pub fn add(&mut self, chain: usize, element: Element) -> Result<(), ChainError> {
        let max = self.max_elements;
        let seg = self.segment_mut(chain)?;
        let (head, tail) = match seg.ends {
            None => (0, 0),
            Some((head, tail)) => {
                let head = (head + max - 1) % max;
                if head == tail {
                    (head, (tail + max - 1) % max)
                } else {
                    (head, tail)
                }
            }
        };
        seg.ends = Some((head, tail));
        let slot = seg.start + head;
        self.elements[slot] = element;
        Ok(())
    }

    /// Drop the oldest element of `chain`.
    pub fn remove(&mut self, chain: usize) -> Result<(), ChainError> {
        let max = self.max_elements;
        let seg = self.segment_mut(chain)?;
        seg.ends = match seg.ends {
            None => return Err(ChainError::EmptyChain(chain)),
            Some((head, tail)) if head == tail => None,
            Some((head, tail)) => Some((head, (tail + max - 1) % max)),
        };
        Ok(())
    }

    /// Overwrite element `index` (0 = newest) of `chain`.
    pub fn update(
        &mut self,
        chain: usize,
        index: usize,
        element: Element,
    ) -> Result<(), ChainError> {
        let slot = self.slot(chain, index)?;
        self.elements[slot] = element;
        Ok(())
    }

    /// Element `index` (0 = newest) of `chain`.
    pub fn get(&self, chain: usize, index: usize) -> Result<&Element, ChainError> {
        let slot = self.slot(chain, index)?;
        Ok(&self.elements[slot])
    }

    /// Number of live elements in `chain`.
    pub fn len(&self, chain: usize) -> Result<usize, ChainError> {
        Ok(self.segment(chain)?.len(self.max_elements))
    }

    /// Sum of live elements over every chain.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.segments.iter().map(|s| s.len(self.max_elements)).sum()
    }

    /// Empty `chain` without touching the backing store.
    pub fn clear(&mut self, chain: usize) -> Result<(), ChainError> {
        self.segment_mut(chain)?.ends = None;
        Ok(())
    }

    /// Empty every chain.
    pub fn clear_all(&mut self) {
        for seg in &mut self.segments {
            seg.ends = None;
        }
    }

    /// Read-only view of `chain`.
    pub fn view(&self, chain: usize) -> Result<ChainView<'_>, ChainError> {
        let seg = self.segment(chain)?;
        Ok(self.view_of(seg))
    }

    /// Views of all chains in chain-index order.
    pub fn views(&self) -> impl ExactSizeIterator<Item = ChainView<'_>> + '_ {
        self.segments.iter().map(|seg| self.view_of(seg))
    }

    fn view_of(&self, seg: &ChainSegment) -> ChainView<'_> {
        ChainView {
            window: &self.elements[seg.start..seg.start + self.max_elements],
            head: seg.head().unwrap_or(0),
            len: seg.len(self.max_elements),
        }
    }

    fn slot(&self, chain: usize, index: usize) -> Result<usize, ChainError> {
        let seg = self.segment(chain)?;
        let len = seg.len(self.max_elements);
        match seg.head() {
            Some(head) if index < len => Ok(seg.start + (head + index) % self.max_elements),
            _ => Err(ChainError::element_index(index, len)),
        }
    }
}
