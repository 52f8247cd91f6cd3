//! Shared test tooling: a thread-backed communicator and a Newtonian material law
#![allow(dead_code)]
use fdstag::traits::{
    BulkResponse, ConstitutiveLaw, DeviatoricInput, DeviatoricResponse, GridComm, HaloValue,
    VolumetricInput,
};
use fdstag::grid::PointLayout;
use fdstag::types::Axis;
use fdstag::ResidualEngine;
use std::any::Any;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

type Mailbox = Vec<(usize, Box<dyn Any + Send>)>;

struct Shared {
    barrier: Barrier,
    values: Mutex<Vec<f64>>,
    counts: Mutex<Vec<usize>>,
    mailboxes: Mutex<Vec<Mailbox>>,
}

/// Communicator connecting threads that play the role of processes
pub struct ThreadComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl ThreadComm {
    fn reduce(&self, value: f64, op: fn(f64, f64) -> f64) -> f64 {
        self.shared.values.lock().unwrap()[self.rank] = value;
        self.shared.barrier.wait();
        let result = self
            .shared
            .values
            .lock()
            .unwrap()
            .iter()
            .copied()
            .reduce(op)
            .unwrap();
        self.shared.barrier.wait();
        result
    }
}

impl GridComm for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
    fn all_reduce_sum(&self, value: f64) -> f64 {
        self.reduce(value, |a, b| a + b)
    }
    fn all_reduce_min(&self, value: f64) -> f64 {
        self.reduce(value, f64::min)
    }
    fn all_reduce_max(&self, value: f64) -> f64 {
        self.reduce(value, f64::max)
    }
    fn exclusive_scan_sum(&self, value: usize) -> usize {
        self.shared.counts.lock().unwrap()[self.rank] = value;
        self.shared.barrier.wait();
        let result = self.shared.counts.lock().unwrap()[..self.rank].iter().sum();
        self.shared.barrier.wait();
        result
    }
    fn exchange<T: HaloValue>(&self, sends: &[(usize, Vec<T>)]) -> Vec<(usize, Vec<T>)> {
        {
            let mut mailboxes = self.shared.mailboxes.lock().unwrap();
            for (rank, data) in sends {
                if !data.is_empty() {
                    let boxed: Box<dyn Any + Send> = Box::new(data.clone());
                    mailboxes[*rank].push((self.rank, boxed));
                }
            }
        }
        self.shared.barrier.wait();
        let mut received = std::mem::take(&mut self.shared.mailboxes.lock().unwrap()[self.rank]);
        self.shared.barrier.wait();
        received.sort_by_key(|(rank, _)| *rank);
        received
            .into_iter()
            .map(|(rank, data)| (rank, *data.downcast::<Vec<T>>().unwrap()))
            .collect()
    }
}

/// Run `f` on `size` threads, each with its own rank, and collect the results by rank
pub fn run_parallel<R: Send>(size: usize, f: impl Fn(&ThreadComm) -> R + Sync) -> Vec<R> {
    let shared = Arc::new(Shared {
        barrier: Barrier::new(size),
        values: Mutex::new(vec![0.0; size]),
        counts: Mutex::new(vec![0; size]),
        mailboxes: Mutex::new((0..size).map(|_| vec![]).collect()),
    });
    thread::scope(|s| {
        let handles = (0..size)
            .map(|rank| {
                let comm = ThreadComm {
                    rank,
                    size,
                    shared: Arc::clone(&shared),
                };
                let f = &f;
                s.spawn(move || f(&comm))
            })
            .collect::<Vec<_>>();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Newtonian fluid with a viscosity and density per phase
///
/// The viscosity can grow with the squares of pressure and temperature. The fluid is
/// incompressible unless bulk terms are set.
pub struct Newtonian {
    pub viscosity: Vec<f64>,
    pub density: Vec<f64>,
    pub pressure_factor: f64,
    pub temperature_factor: f64,
    pub ikdt: f64,
    pub alpha: f64,
}

impl Newtonian {
    pub fn new(viscosity: Vec<f64>, density: Vec<f64>) -> Self {
        Self {
            viscosity,
            density,
            pressure_factor: 0.0,
            temperature_factor: 0.0,
            ikdt: 0.0,
            alpha: 0.0,
        }
    }

    pub fn single(viscosity: f64, density: f64) -> Self {
        Self::new(vec![viscosity], vec![density])
    }

    pub fn with_dependence(self, pressure_factor: f64, temperature_factor: f64) -> Self {
        Self {
            pressure_factor,
            temperature_factor,
            ..self
        }
    }

    pub fn with_bulk(self, ikdt: f64, alpha: f64) -> Self {
        Self {
            ikdt,
            alpha,
            ..self
        }
    }

    fn average(values: &[f64], phase_ratio: &[f64]) -> f64 {
        values.iter().zip(phase_ratio).map(|(v, r)| v * r).sum()
    }
}

impl ConstitutiveLaw for Newtonian {
    fn phase_count(&self) -> usize {
        self.viscosity.len()
    }
    fn inverse_elastic_viscosity(&self, _phase_ratio: &[f64], _dt: f64) -> f64 {
        0.0
    }
    fn deviatoric(&self, input: &DeviatoricInput<'_>) -> DeviatoricResponse {
        let scale = 1.0
            + self.pressure_factor * input.pressure.powi(2)
            + self.temperature_factor * input.temperature.powi(2);
        let eta = (scale * Self::average(&self.viscosity, input.phase_ratio))
            .clamp(input.limits.eta_min, input.limits.eta_max);
        DeviatoricResponse {
            eta,
            eta_creep: eta,
            dii_plastic: 0.0,
        }
    }
    fn volumetric(&self, input: &VolumetricInput<'_>) -> BulkResponse {
        BulkResponse {
            rho: Self::average(&self.density, input.phase_ratio),
            ikdt: self.ikdt,
            alpha: self.alpha,
        }
    }
}

/// Solution vector sampling a velocity field at the faces and a pressure field at the cells
pub fn solution<C: GridComm>(
    engine: &ResidualEngine<'_, C>,
    velocity: impl Fn(Axis, [f64; 3]) -> f64,
    pressure: impl Fn([f64; 3]) -> f64,
) -> Vec<f64> {
    let grid = engine.grid();
    let mut x = Vec::with_capacity(engine.dof().ln());
    for axis in Axis::ALL {
        let layout = PointLayout::face(axis);
        for index in engine.velocity(axis).owned_indices() {
            x.push(velocity(axis, grid.point_coordinates(layout, index)));
        }
    }
    for index in engine.pressure().owned_indices() {
        x.push(pressure(grid.point_coordinates(PointLayout::Cells, index)));
    }
    x
}
