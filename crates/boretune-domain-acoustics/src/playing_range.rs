use crate::calculator::InstrumentCalculator;
use crate::solver::{brent_minimize, brent_root};
use boretune_domain_instrument::{Fingering, GeometryError};
use log::debug;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlayingRangeError {
    #[error("no playing range near {frequency} Hz")]
    NoPlayingRange { frequency: f64 },
    #[error("fingering has no target frequency")]
    NoTarget,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Search constants for [`PlayingRange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayingRangeConfig {
    /// Bracket step as a fraction of the starting frequency.
    pub granularity: f64,
    /// Brackets within this ratio of the start are accepted immediately.
    pub preferred_solution_ratio: f64,
    /// Outer search limit as a frequency ratio.
    pub search_ratio: f64,
    pub minimum_gain: f64,
    /// Absolute frequency tolerance of the root and minimum solvers, Hz.
    pub solver_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for PlayingRangeConfig {
    fn default() -> Self {
        Self {
            granularity: 0.012,
            preferred_solution_ratio: 2f64.powf(200.0 / 1200.0),
            search_ratio: 2.0,
            minimum_gain: 1.0,
            solver_tolerance: 1e-7,
            max_iterations: 100,
        }
    }
}

impl PlayingRangeConfig {
    pub fn with_preferred_solution_cents(mut self, cents: f64) -> Self {
        self.preferred_solution_ratio = 2f64.powf(cents / 1200.0);
        self
    }
}

/// Locates playing frequencies of one fingering.
pub struct PlayingRange<'a> {
    calculator: &'a InstrumentCalculator,
    fingering: &'a Fingering,
    config: PlayingRangeConfig,
}

impl<'a> PlayingRange<'a> {
    pub fn new(
        calculator: &'a InstrumentCalculator,
        fingering: &'a Fingering,
    ) -> Result<Self, GeometryError> {
        fingering.check_hole_count(calculator.hole_count())?;
        Ok(Self {
            calculator,
            fingering,
            config: PlayingRangeConfig::default(),
        })
    }

    pub fn with_config(mut self, config: PlayingRangeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlayingRangeConfig {
        &self.config
    }

    pub fn reactance(&self, frequency: f64) -> f64 {
        self.calculator.z_unchecked(frequency, self.fingering).im
    }

    /// X/R of the playing impedance.
    pub fn z_ratio(&self, frequency: f64) -> f64 {
        let z = self.calculator.z_unchecked(frequency, self.fingering);
        z.im / z.re
    }

    pub fn gain(&self, frequency: f64) -> f64 {
        let z = self.calculator.z_unchecked(frequency, self.fingering);
        self.calculator.calc_gain(frequency, z)
    }

    /// First `[lo, hi]` above `near` with `g(lo) < 0 <= g(hi)`, stepping no
    /// further than `limit`.
    pub fn find_bracket_above<G>(&self, near: f64, limit: f64, g: &G) -> Option<(f64, f64)>
    where
        G: Fn(f64) -> f64,
    {
        let step = near * self.config.granularity;
        let mut lo = near;
        let mut g_lo = g(lo);
        loop {
            let hi = lo + step;
            if hi > limit {
                return None;
            }
            let g_hi = g(hi);
            if g_lo < 0.0 && g_hi >= 0.0 {
                return Some((lo, hi));
            }
            lo = hi;
            g_lo = g_hi;
        }
    }

    pub fn find_bracket_below<G>(&self, near: f64, limit: f64, g: &G) -> Option<(f64, f64)>
    where
        G: Fn(f64) -> f64,
    {
        let step = near * self.config.granularity;
        let mut hi = near;
        let mut g_hi = g(hi);
        loop {
            let lo = hi - step;
            if lo < limit || lo <= 0.0 {
                return None;
            }
            let g_lo = g(lo);
            if g_lo < 0.0 && g_hi >= 0.0 {
                return Some((lo, hi));
            }
            hi = lo;
            g_hi = g_lo;
        }
    }

    /// Nearest upward crossing of `g` around `near`: a bracket within the
    /// preferred ratio wins outright, otherwise the closer of the nearest
    /// brackets above and below within the search ratio.
    pub fn find_bracket<G>(&self, near: f64, g: &G) -> Result<(f64, f64), PlayingRangeError>
    where
        G: Fn(f64) -> f64,
    {
        let preferred = self.config.preferred_solution_ratio;
        if let Some(bracket) = self.find_bracket_above(near, near * preferred, g) {
            return Ok(bracket);
        }
        if let Some(bracket) = self.find_bracket_below(near, near / preferred, g) {
            return Ok(bracket);
        }

        let outer = self.config.search_ratio;
        let above = self.find_bracket_above(near, near * outer, g);
        let below = self.find_bracket_below(near, near / outer, g);
        let distance = |(lo, hi): (f64, f64)| (0.5 * (lo + hi) / near).ln().abs();
        match (above, below) {
            (Some(a), Some(b)) => Ok(if distance(a) <= distance(b) { a } else { b }),
            (Some(a), None) => Ok(a),
            (None, Some(b)) => Ok(b),
            (None, None) => Err(PlayingRangeError::NoPlayingRange { frequency: near }),
        }
    }

    pub fn find_crossing<G>(&self, near: f64, g: G) -> Result<f64, PlayingRangeError>
    where
        G: Fn(f64) -> f64,
    {
        let (lo, hi) = self.find_bracket(near, &g)?;
        brent_root(&g, lo, hi, self.config.solver_tolerance, self.config.max_iterations).map_err(
            |err| {
                debug!("root search near {near} Hz failed: {err}");
                PlayingRangeError::NoPlayingRange { frequency: near }
            },
        )
    }

    /// Nominal playing frequency: the nearest upward zero of reactance.
    pub fn find_x_zero(&self, near: f64) -> Result<f64, PlayingRangeError> {
        self.find_crossing(near, |f| self.reactance(f))
    }

    pub fn find_x(&self, near: f64, target_x: f64) -> Result<f64, PlayingRangeError> {
        self.find_crossing(near, |f| self.reactance(f) - target_x)
    }

    pub fn find_z_ratio(&self, near: f64, ratio: f64) -> Result<f64, PlayingRangeError> {
        self.find_crossing(near, |f| self.z_ratio(f) - ratio)
    }

    /// Lowest frequency the fingering still sounds at, below `fmax`.
    ///
    /// The range ends where the loop gain falls below the minimum or where
    /// X/R stops falling, whichever comes first on the way down.
    pub fn find_fmin(&self, fmax: f64) -> Result<f64, PlayingRangeError> {
        let cfg = &self.config;
        let no_range = PlayingRangeError::NoPlayingRange { frequency: fmax };
        if self.gain(fmax) < cfg.minimum_gain {
            return Err(no_range);
        }

        let step = fmax * cfg.granularity;
        let floor = fmax / cfg.search_ratio;
        let mut upper = fmax;
        let mut before_upper = fmax;
        let mut ratio_upper = self.z_ratio(fmax);
        loop {
            let lower = upper - step;
            if lower < floor || lower <= 0.0 {
                debug!("no lower playing limit below {fmax} Hz");
                return Err(no_range);
            }
            let ratio_lower = self.z_ratio(lower);
            let mut fmin: Option<f64> = None;

            if self.gain(lower) < cfg.minimum_gain {
                let limit = brent_root(
                    |f| self.gain(f) - cfg.minimum_gain,
                    lower,
                    upper,
                    cfg.solver_tolerance,
                    cfg.max_iterations,
                )
                .map_err(|_| no_range.clone())?;
                fmin = Some(limit);
            }
            if ratio_lower > ratio_upper {
                let turn = brent_minimize(
                    |f| self.z_ratio(f),
                    lower,
                    before_upper,
                    cfg.solver_tolerance,
                    cfg.max_iterations,
                )
                .map_err(|_| no_range.clone())?;
                fmin = Some(fmin.map_or(turn, |f| f.max(turn)));
            }
            if let Some(f) = fmin {
                return Ok(f.min(fmax));
            }

            before_upper = upper;
            upper = lower;
            ratio_upper = ratio_lower;
        }
    }
}
