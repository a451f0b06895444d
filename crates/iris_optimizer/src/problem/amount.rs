use std::ops::{AddAssign, Index, SubAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

type Vector = SmallVec<[f64; 2]>;

/// Multi-dimensional quantity used both for vehicle capacities and job demands.
/// Missing dimensions read as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Amount(Vector);

impl Amount {
    pub const EMPTY: Amount = Amount(Vector::new_const());

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        let mut vec = SmallVec::with_capacity(dimensions);
        vec.resize(dimensions, 0.0);
        Amount(vec)
    }

    pub fn from_vec(vec: Vec<f64>) -> Self {
        Amount(SmallVec::from_vec(vec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty() || self.iter().all(|v| v == 0.0)
    }

    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        self.0.get(index).cloned().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().cloned()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    pub fn reset(&mut self) {
        self.0.iter_mut().for_each(|v| *v = 0.0);
    }

    pub fn update(&mut self, other: &Amount) {
        self.0.clone_from(&other.0);
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn has_negative(&self) -> bool {
        self.0.iter().any(|&v| v < 0.0)
    }

    /// True when every dimension of `self` is at most the same dimension of `capacity`.
    #[inline]
    pub fn fits_in(&self, capacity: &Amount) -> bool {
        let len = self.len().max(capacity.len());
        (0..len).all(|i| self.get(i) <= capacity.get(i))
    }

    /// True when `self + extra` fits in `capacity`, without allocating the sum.
    #[inline]
    pub fn fits_with(&self, extra: &Amount, capacity: &Amount) -> bool {
        let len = self.len().max(extra.len()).max(capacity.len());
        (0..len).all(|i| self.get(i) + extra.get(i) <= capacity.get(i))
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Index<usize> for Amount {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.len() {
            self.0.resize(rhs.len(), 0.0);
        }

        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a += b;
        }
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.len() {
            self.0.resize(rhs.len(), 0.0);
        }

        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a -= b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_add_assign() {
        let mut a = Amount::from_vec(vec![10.0, 20.0]);
        let b = Amount::from_vec(vec![5.0, 15.0, 25.0]);

        a += &b;

        assert_eq!(a.get(0), 15.0);
        assert_eq!(a.get(1), 35.0);
        assert_eq!(a.get(2), 25.0);
    }

    #[test]
    fn test_amount_sub_assign() {
        let mut a = Amount::from_vec(vec![10.0, 20.0, 30.0]);
        let b = Amount::from_vec(vec![5.0, 15.0]);

        a -= &b;

        assert_eq!(a.get(0), 5.0);
        assert_eq!(a.get(1), 5.0);
        assert_eq!(a.get(2), 30.0);
    }

    #[test]
    fn test_fits_in() {
        let capacity = Amount::from_vec(vec![10.0, 5.0]);

        assert!(Amount::from_vec(vec![10.0, 5.0]).fits_in(&capacity));
        assert!(!Amount::from_vec(vec![10.0, 5.5]).fits_in(&capacity));
        assert!(Amount::empty().fits_in(&capacity));
        assert!(!Amount::from_vec(vec![1.0]).fits_in(&Amount::empty()));
    }

    #[test]
    fn test_fits_with() {
        let capacity = Amount::from_vec(vec![10.0]);
        let load = Amount::from_vec(vec![7.0]);

        assert!(load.fits_with(&Amount::from_vec(vec![3.0]), &capacity));
        assert!(!load.fits_with(&Amount::from_vec(vec![4.0]), &capacity));
    }

    #[test]
    fn test_is_empty() {
        assert!(Amount::empty().is_empty());
        assert!(Amount::from_vec(vec![0.0, 0.0]).is_empty());
        assert!(!Amount::from_vec(vec![0.0, 1.0]).is_empty());
    }
}
