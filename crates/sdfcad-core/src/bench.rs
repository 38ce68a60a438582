//! Field evaluation throughput
//!
//! Samples a field at pseudo-random points spread over its bounding box
//! enlarged by 20%, and reports evaluations per second. The point sequence is
//! deterministic so runs are comparable.

use crate::error::{Error, Result, ensure};
use crate::sdf2::Sdf2;
use crate::sdf3::Sdf3;
use glam::{DVec2, DVec3};
use std::fmt;
use std::hint::black_box;
use std::time::{Duration, Instant};

/// Evaluations used when the caller has no preference
pub const DEFAULT_EVALUATIONS: usize = 10_000_000;

const SAMPLE_SCALE: f64 = 1.2;

/// Result of one benchmark run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchReport {
    pub evaluations: usize,
    pub elapsed: Duration,
}

impl BenchReport {
    pub fn evals_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.evaluations as f64 / secs
        } else {
            f64::INFINITY
        }
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eps = self.evals_per_sec();
        if eps > 1e9 {
            write!(f, "{:.2} G evals/sec", eps / 1e9)
        } else if eps > 1e6 {
            write!(f, "{:.2} M evals/sec", eps / 1e6)
        } else if eps > 1e3 {
            write!(f, "{:.2} K evals/sec", eps / 1e3)
        } else {
            write!(f, "{eps:.2} evals/sec")
        }
    }
}

/// SplitMix64 stream of unit floats
struct Sampler(u64);

impl Sampler {
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        // top 53 bits
        (z >> 11) as f64 / (1_u64 << 53) as f64
    }
}

/// Time `evaluations` calls of a 2D field
pub fn benchmark2<S: Sdf2 + ?Sized>(field: &S, evaluations: usize) -> Result<BenchReport> {
    ensure(evaluations > 0, "evaluation count must be > 0")?;
    let bounds = field.bounds();
    if !bounds.is_finite() {
        return Err(Error::parameter("cannot benchmark an unbounded field"));
    }
    let center = bounds.center();
    let size = bounds.size() * SAMPLE_SCALE;
    let mut rng = Sampler(0x5eed);
    let points: Vec<DVec2> = (0..evaluations)
        .map(|_| center + size * (DVec2::new(rng.next_f64(), rng.next_f64()) - 0.5))
        .collect();

    let start = Instant::now();
    for &p in &points {
        black_box(field.distance(black_box(p)));
    }
    let report = BenchReport {
        evaluations,
        elapsed: start.elapsed(),
    };
    tracing::debug!(%report, "2d benchmark");
    Ok(report)
}

/// Time `evaluations` calls of a 3D field
pub fn benchmark3<S: Sdf3 + ?Sized>(field: &S, evaluations: usize) -> Result<BenchReport> {
    ensure(evaluations > 0, "evaluation count must be > 0")?;
    let bounds = field.bounds();
    if !bounds.is_finite() {
        return Err(Error::parameter("cannot benchmark an unbounded field"));
    }
    let center = bounds.center();
    let size = bounds.size() * SAMPLE_SCALE;
    let mut rng = Sampler(0x5eed);
    let points: Vec<DVec3> = (0..evaluations)
        .map(|_| {
            center + size * (DVec3::new(rng.next_f64(), rng.next_f64(), rng.next_f64()) - 0.5)
        })
        .collect();

    let start = Instant::now();
    for &p in &points {
        black_box(field.distance(black_box(p)));
    }
    let report = BenchReport {
        evaluations,
        elapsed: start.elapsed(),
    };
    tracing::debug!(%report, "3d benchmark");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf2::{circle, half_plane};
    use crate::sdf3::sphere;

    fn report(evaluations: usize, millis: u64) -> BenchReport {
        BenchReport {
            evaluations,
            elapsed: Duration::from_millis(millis),
        }
    }

    #[test]
    fn display_picks_a_unit() {
        assert_eq!(report(3_000_000_000, 1000).to_string(), "3.00 G evals/sec");
        assert_eq!(report(12_500_000, 1000).to_string(), "12.50 M evals/sec");
        assert_eq!(report(4_200, 1000).to_string(), "4.20 K evals/sec");
        assert_eq!(report(50, 1000).to_string(), "50.00 evals/sec");
    }

    #[test]
    fn sampler_stays_in_unit_interval() {
        let mut s = Sampler(1);
        let values: Vec<f64> = (0..10_000).map(|_| s.next_f64()).collect();
        assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!((mean - 0.5).abs() < 0.02);
    }

    #[test]
    fn runs_on_bounded_fields() {
        let r = benchmark3(&sphere(1.0).unwrap(), 1000).unwrap();
        assert_eq!(r.evaluations, 1000);
        assert!(r.evals_per_sec() > 0.0);
        assert!(benchmark2(&circle(1.0).unwrap(), 1000).is_ok());
    }

    #[test]
    fn rejects_unbounded_fields_and_empty_runs() {
        let h = half_plane(DVec2::ZERO, DVec2::X).unwrap();
        assert!(matches!(benchmark2(&h, 10), Err(Error::Parameter(_))));
        assert!(benchmark3(&sphere(1.0).unwrap(), 0).is_err());
    }
}
