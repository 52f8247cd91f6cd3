//! Local part of a distributed array with one ghost layer
use std::ops::{Index, IndexMut, Range};

/// Values at the local points of one point layout plus one ghost layer on every side
///
/// Points are addressed by local `(i, j, k)` indices. Owned points have indices
/// `0..shape[d]`, the ghost layer sits at -1 and `shape[d]`. Storage is `i` fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalArray<T> {
    shape: [usize; 3],
    data: Vec<T>,
}

/// Box of local indices
pub type Region = [Range<isize>; 3];

/// Region of the owned points of an array with the given shape
pub fn owned_region(shape: [usize; 3]) -> Region {
    [
        0..shape[0] as isize,
        0..shape[1] as isize,
        0..shape[2] as isize,
    ]
}

/// Points of a region, `i` fastest
pub fn region_indices(region: Region) -> impl Iterator<Item = (isize, isize, isize)> {
    let [ri, rj, rk] = region;
    rk.flat_map(move |k| {
        let ri = ri.clone();
        rj.clone()
            .flat_map(move |j| ri.clone().map(move |i| (i, j, k)))
    })
}

impl<T: Copy> LocalArray<T> {
    /// Create an array of the given owned shape filled with `value`
    pub fn new(shape: [usize; 3], value: T) -> Self {
        Self {
            shape,
            data: vec![value; shape.iter().map(|n| n + 2).product()],
        }
    }

    /// Number of owned points along each axis
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Number of owned points
    pub fn owned_len(&self) -> usize {
        self.shape.iter().product()
    }

    fn offset(&self, i: isize, j: isize, k: isize) -> usize {
        debug_assert!(
            (-1..=self.shape[0] as isize).contains(&i)
                && (-1..=self.shape[1] as isize).contains(&j)
                && (-1..=self.shape[2] as isize).contains(&k),
            "index ({i}, {j}, {k}) outside of array with shape {:?}",
            self.shape
        );
        let nx = self.shape[0] + 2;
        let ny = self.shape[1] + 2;
        ((k + 1) as usize * ny + (j + 1) as usize) * nx + (i + 1) as usize
    }

    /// Set every value, including ghosts
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Owned points, `i` fastest
    pub fn owned_indices(&self) -> impl Iterator<Item = (isize, isize, isize)> {
        region_indices(owned_region(self.shape))
    }

    /// Owned values, `i` fastest
    pub fn owned_values(&self) -> impl Iterator<Item = T> + '_ {
        self.owned_indices().map(|(i, j, k)| self[(i, j, k)])
    }

    /// Copy the owned values into a flat slice
    pub fn copy_owned_to(&self, out: &mut [T]) {
        for (o, v) in out.iter_mut().zip(self.owned_values()) {
            *o = v;
        }
    }

    /// Copy a flat slice into the owned values
    pub fn copy_owned_from(&mut self, values: &[T]) {
        for ((i, j, k), v) in region_indices(owned_region(self.shape)).zip(values) {
            self[(i, j, k)] = *v;
        }
    }

    /// Values in a region, `i` fastest
    pub fn pack(&self, region: Region) -> Vec<T> {
        region_indices(region)
            .map(|(i, j, k)| self[(i, j, k)])
            .collect()
    }

    /// Overwrite a region with packed values
    pub fn unpack(&mut self, region: Region, values: &[T]) {
        for ((i, j, k), v) in region_indices(region).zip(values) {
            self[(i, j, k)] = *v;
        }
    }

    /// Add packed values to a region
    pub fn unpack_add(&mut self, region: Region, values: &[T])
    where
        T: std::ops::AddAssign,
    {
        for ((i, j, k), v) in region_indices(region).zip(values) {
            self[(i, j, k)] += *v;
        }
    }

    /// Map every value, including ghosts
    pub fn map<S: Copy>(&self, f: impl Fn(T) -> S) -> LocalArray<S> {
        LocalArray {
            shape: self.shape,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

impl<T: Copy + num::Zero> LocalArray<T> {
    /// Array of zeros
    pub fn zeros(shape: [usize; 3]) -> Self {
        Self::new(shape, T::zero())
    }

    /// Set every value to zero, including ghosts
    pub fn set_zero(&mut self) {
        self.fill(T::zero());
    }
}

impl<T: Copy> Index<(isize, isize, isize)> for LocalArray<T> {
    type Output = T;
    fn index(&self, (i, j, k): (isize, isize, isize)) -> &T {
        &self.data[self.offset(i, j, k)]
    }
}

impl<T: Copy> IndexMut<(isize, isize, isize)> for LocalArray<T> {
    fn index_mut(&mut self, (i, j, k): (isize, isize, isize)) -> &mut T {
        let offset = self.offset(i, j, k);
        &mut self.data[offset]
    }
}
