//! Sparse, two-sided cell storage.
//!
//! Cells at non-negative addresses live in `right`, cells at negative
//! addresses in `left` (address `-1` is `left[0]`). Both halves grow on demand,
//! so the tape has no fixed bound in either direction.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tape {
    right: Vec<i64>,
    left: Vec<i64>,
}

impl Tape {
    /// A fresh tape holding only address 0 at value 0.
    pub fn new() -> Self {
        Self { right: vec![0], left: Vec::new() }
    }

    fn slot(addr: i64) -> (bool, usize) {
        if addr >= 0 {
            (false, addr as usize)
        } else {
            (true, (-(addr + 1)) as usize)
        }
    }

    /// Make sure `addr` is allocated, zero-filling anything in between.
    pub fn touch(&mut self, addr: i64) {
        let (negative, index) = Self::slot(addr);
        let half = if negative { &mut self.left } else { &mut self.right };
        if index >= half.len() {
            half.resize(index + 1, 0);
        }
    }

    /// Value at `addr`; untouched cells read as 0.
    pub fn get(&self, addr: i64) -> i64 {
        let (negative, index) = Self::slot(addr);
        let half = if negative { &self.left } else { &self.right };
        half.get(index).copied().unwrap_or(0)
    }

    pub fn set(&mut self, addr: i64, value: i64) {
        self.touch(addr);
        let (negative, index) = Self::slot(addr);
        let half = if negative { &mut self.left } else { &mut self.right };
        half[index] = value;
    }

    pub fn is_allocated(&self, addr: i64) -> bool {
        let (negative, index) = Self::slot(addr);
        let half = if negative { &self.left } else { &self.right };
        index < half.len()
    }

    /// Lowest and highest allocated addresses.
    pub fn bounds(&self) -> (i64, i64) {
        (-(self.left.len() as i64), self.right.len() as i64 - 1)
    }

    /// `(address, value)` for every non-zero cell, in address order.
    ///
    /// Two tapes that differ only in how far they were allocated compare equal
    /// through this view.
    pub fn nonzero_cells(&self) -> Vec<(i64, i64)> {
        let (lo, hi) = self.bounds();
        (lo..=hi)
            .map(|addr| (addr, self.get(addr)))
            .filter(|&(_, value)| value != 0)
            .collect()
    }

    /// Values of `len` consecutive cells starting at `start`.
    pub fn window(&self, start: i64, len: usize) -> Vec<i64> {
        (start..start + len as i64).map(|addr| self.get(addr)).collect()
    }
}
