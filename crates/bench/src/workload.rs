//! Synthetic workloads for benchmark trials.

/// Per-item transform every runner applies. Kept deliberately cheap so
/// trials measure iteration overhead, not arithmetic.
pub fn heat(x: f32) -> f32 {
    (x * 0.5 + 0.25).sin()
}

/// Seeded input data plus the checksum an honest runner must reproduce:
/// the sum of `heat(x)` over items where `heat(x)` is positive, reduced
/// sequentially in input order.
#[derive(Debug, Clone)]
pub struct Workload {
    pub data: Vec<f32>,
    pub reference_checksum: f64,
    pub seed: u64,
}

impl Workload {
    pub fn synthetic(size: usize, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let data: Vec<f32> = (0..size).map(|_| rng.f32() * 2.0 - 1.0).collect();

        let mut reference_checksum = 0.0f64;
        for &x in &data {
            let heated = heat(x);
            if heated > 0.0 {
                reference_checksum += f64::from(heated);
            }
        }

        Self {
            data,
            reference_checksum,
            seed,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn same_seed_reproduces_the_workload() {
        let a = Workload::synthetic(4_096, 42);
        let b = Workload::synthetic(4_096, 42);
        assert_eq!(a.data, b.data);
        assert_abs_diff_eq!(a.reference_checksum, b.reference_checksum, epsilon = 0.0);
    }

    #[test]
    fn different_seeds_differ() {
        let a = Workload::synthetic(4_096, 1);
        let b = Workload::synthetic(4_096, 2);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn checksum_counts_only_positive_heat() {
        let workload = Workload::synthetic(10_000, 7);
        let expected: f64 = workload
            .data
            .iter()
            .map(|&x| heat(x))
            .filter(|&h| h > 0.0)
            .map(f64::from)
            .sum();
        assert_abs_diff_eq!(workload.reference_checksum, expected, epsilon = 0.0);
        assert!(workload.reference_checksum > 0.0);
    }

    #[test]
    fn empty_workload_has_zero_checksum() {
        let workload = Workload::synthetic(0, 9);
        assert!(workload.is_empty());
        assert_abs_diff_eq!(workload.reference_checksum, 0.0, epsilon = 0.0);
    }
}
