//! Lazy index combinatorics.
//!
//! Both search stages work on integer indices into arenas (the outcome
//! pool, the per-size parlay pools), so candidates are produced one at a
//! time without materialising the full search space.

/// Lexicographic `k`-combinations of `0..n`.
///
/// `k == 0` and `k > n` produce nothing.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k == 0 || k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();

        let k = self.indices.len();
        // Rightmost index that can still move forward.
        match (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }

        Some(current)
    }
}

/// Every tuple of the cross-product `0..r0 × 0..r1 × …`, odometer order.
///
/// An empty radix list, or any zero radix, produces nothing.
#[derive(Debug, Clone)]
pub struct CrossProduct {
    radices: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl CrossProduct {
    pub fn new(radices: Vec<usize>) -> Self {
        let done = radices.is_empty() || radices.iter().any(|&r| r == 0);
        Self {
            current: vec![0; radices.len()],
            radices,
            done,
        }
    }

    /// Total number of tuples, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        if self.radices.is_empty() {
            return 0;
        }
        self.radices
            .iter()
            .fold(1u64, |acc, &r| acc.saturating_mul(r as u64))
    }
}

impl Iterator for CrossProduct {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.current.clone();

        let mut position = self.radices.len();
        loop {
            if position == 0 {
                self.done = true;
                break;
            }
            position -= 1;
            self.current[position] += 1;
            if self.current[position] < self.radices[position] {
                break;
            }
            self.current[position] = 0;
        }

        Some(current)
    }
}

/// Binomial coefficient `n choose k`, saturating at `u64::MAX`.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
        if result > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    result as u64
}
