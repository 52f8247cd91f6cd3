//! Coordinate segments along one axis
use crate::config::AxisConfig;
use crate::error::{FdstagError, Result};
use crate::types::Axis;

/// Piecewise (optionally biased) spacing of one axis
///
/// Segment `s` covers the global nodes `first[s]..=first[s + 1]` and the coordinates
/// `bounds[s]..=bounds[s + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSegments {
    first: Vec<usize>,
    bounds: Vec<f64>,
    biases: Vec<f64>,
}

impl MeshSegments {
    /// Create the segments of an axis
    pub fn new(axis: Axis, config: &AxisConfig) -> Result<Self> {
        let name = axis.name();
        if config.cells == 0 {
            return Err(FdstagError::axis(name, "number of cells must be positive"));
        }
        if config.end <= config.begin {
            return Err(FdstagError::axis(
                name,
                "domain end must be larger than domain begin",
            ));
        }

        let Some(input) = &config.segments else {
            return Ok(Self {
                first: vec![0, config.cells],
                bounds: vec![config.begin, config.end],
                biases: vec![1.0],
            });
        };

        let nsegs = input.cells.len();
        if nsegs == 0 {
            return Err(FdstagError::axis(name, "segment list is empty"));
        }
        if input.delimiters.len() + 1 != nsegs {
            return Err(FdstagError::axis(
                name,
                format!(
                    "{} segments need {} delimiters, found {}",
                    nsegs,
                    nsegs - 1,
                    input.delimiters.len()
                ),
            ));
        }
        if input.cells.iter().any(|&c| c == 0) {
            return Err(FdstagError::axis(name, "every segment needs at least one cell"));
        }
        if input.cells.iter().sum::<usize>() != config.cells {
            return Err(FdstagError::axis(
                name,
                "segment cell counts do not add up to the total number of cells",
            ));
        }

        let mut bounds = Vec::with_capacity(nsegs + 1);
        bounds.push(config.begin);
        bounds.extend_from_slice(&input.delimiters);
        bounds.push(config.end);
        if bounds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(FdstagError::axis(
                name,
                "segment delimiters must increase strictly inside the domain",
            ));
        }

        let biases = if input.biases.is_empty() {
            vec![1.0; nsegs]
        } else {
            input.biases.clone()
        };
        if biases.len() != nsegs {
            return Err(FdstagError::axis(
                name,
                format!("{} segments need {} biases", nsegs, nsegs),
            ));
        }
        if biases.iter().any(|&b| b <= 0.0) {
            return Err(FdstagError::axis(name, "segment biases must be positive"));
        }

        let mut first = Vec::with_capacity(nsegs + 1);
        first.push(0);
        for c in &input.cells {
            first.push(first[first.len() - 1] + c);
        }

        Ok(Self {
            first,
            bounds,
            biases,
        })
    }

    /// Number of segments
    pub fn count(&self) -> usize {
        self.biases.len()
    }

    /// Total number of cells
    pub fn cells(&self) -> usize {
        self.first[self.count()]
    }

    /// First global node of each segment, followed by the last node of the axis
    pub fn first_nodes(&self) -> &[usize] {
        &self.first
    }

    /// Start coordinate of each segment, followed by the end of the axis
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Coordinates of `out.len()` consecutive nodes of `segment`, starting at its local node `first`
    ///
    /// A biased segment grows its cell size linearly from the first to the last cell. The
    /// closing node of the segment is set to the segment bound exactly.
    pub fn generate(&self, segment: usize, first: usize, out: &mut [f64]) {
        let cells = self.first[segment + 1] - self.first[segment];
        let start = self.bounds[segment];
        let close = self.bounds[segment + 1];
        let bias = self.biases[segment];
        let average = (close - start) / cells as f64;

        if bias == 1.0 || cells == 1 {
            for (i, x) in out.iter_mut().enumerate() {
                *x = start + (first + i) as f64 * average;
            }
        } else {
            let begin_size = 2.0 * average / (1.0 + bias);
            let end_size = bias * begin_size;
            // negative for shrinking cells
            let increment = (end_size - begin_size) / (cells - 1) as f64;
            for (i, x) in out.iter_mut().enumerate() {
                let node = first + i;
                let growth = (node * node.saturating_sub(1) / 2) as f64;
                *x = start + node as f64 * begin_size + growth * increment;
            }
        }

        if first + out.len() == cells + 1 {
            if let Some(last) = out.last_mut() {
                *last = close;
            }
        }
    }

    /// Node coordinates of the global nodes `first..first + out.len()`
    ///
    /// Returns the number of generated nodes, which is less than `out.len()` when the
    /// range runs past the last node.
    pub fn generate_range(&self, first: usize, out: &mut [f64]) -> usize {
        let mut node = first;
        let mut done = 0;
        for segment in 0..self.count() {
            if done == out.len() {
                break;
            }
            let close = self.first[segment + 1];
            if close < node {
                continue;
            }
            let n = (close - node + 1).min(out.len() - done);
            self.generate(
                segment,
                node - self.first[segment],
                &mut out[done..done + n],
            );
            node += n;
            done += n;
        }
        done
    }

    /// Stretch about the coordinate origin: `x <- x (1 - eps)`
    pub fn stretch(&mut self, eps: f64) {
        for x in self.bounds.iter_mut() {
            *x *= 1.0 - eps;
        }
    }

    /// Cell size of a uniform grid with the same extent and number of cells
    pub fn uniform_step(&self) -> f64 {
        (self.bounds[self.count()] - self.bounds[0]) / self.cells() as f64
    }
}
