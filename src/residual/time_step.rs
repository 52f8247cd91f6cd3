//! Time step control
use crate::config::TimeStepConfig;
use crate::error::Result;

/// Current time step and its limits
#[derive(Debug, Clone, PartialEq)]
pub struct TimeStep {
    dt: f64,
    prev_dt: f64,
    dt_max: f64,
    courant: f64,
    step: usize,
    time: f64,
}

impl TimeStep {
    /// Create from a validated configuration
    pub fn new(config: &TimeStepConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dt: config.dt.min(config.dt_max),
            prev_dt: config.dt.min(config.dt_max),
            dt_max: config.dt_max,
            courant: config.courant,
            step: 0,
            time: 0.0,
        })
    }

    /// Current time step
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Previous time step
    pub fn prev_dt(&self) -> f64 {
        self.prev_dt
    }

    /// Maximum time step
    pub fn dt_max(&self) -> f64 {
        self.dt_max
    }

    /// Courant number
    pub fn courant(&self) -> f64 {
        self.courant
    }

    /// Number of completed steps
    pub fn step(&self) -> usize {
        self.step
    }

    /// Model time
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Overwrite the current time step
    pub fn set_dt(&mut self, dt: f64) {
        self.dt = dt.min(self.dt_max);
    }

    /// Select the next time step from the global maximum inverse step `|v| / h`
    ///
    /// The step grows by at most 10 % and is bounded by the Courant limit and `dt_max`.
    pub fn limit(&mut self, max_inverse_step: f64) -> f64 {
        let courant_dt = self.courant / max_inverse_step;
        self.prev_dt = self.dt;
        self.dt = (1.1 * self.dt).min(courant_dt).min(self.dt_max);
        self.dt
    }

    /// Complete a step
    pub fn advance(&mut self) {
        self.time += self.dt;
        self.step += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn time_step(dt: f64, dt_max: f64, courant: f64) -> TimeStep {
        TimeStep::new(&TimeStepConfig {
            dt,
            dt_max,
            courant,
        })
        .unwrap()
    }

    #[test]
    fn test_courant_limit() {
        let mut ts = time_step(1.0, 10.0, 0.5);
        assert_relative_eq!(ts.limit(2.0), 0.25);
        assert_relative_eq!(ts.prev_dt(), 1.0);
    }

    #[test]
    fn test_growth_limit() {
        let mut ts = time_step(1.0, 10.0, 0.5);
        assert_relative_eq!(ts.limit(0.001), 1.1);
        assert_relative_eq!(ts.limit(0.0), 1.21);
    }

    #[test]
    fn test_max_limit() {
        let mut ts = time_step(1.0, 1.05, 0.5);
        assert_relative_eq!(ts.limit(0.0), 1.05);
    }

    #[test]
    fn test_advance() {
        let mut ts = time_step(0.5, 10.0, 0.5);
        ts.advance();
        ts.advance();
        assert_eq!(ts.step(), 2);
        assert_relative_eq!(ts.time(), 1.0);
    }

    #[test]
    fn test_invalid() {
        assert!(TimeStep::new(&TimeStepConfig {
            dt: -1.0,
            ..Default::default()
        })
        .is_err());
    }
}
