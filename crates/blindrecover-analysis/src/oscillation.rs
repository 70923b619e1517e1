/// Per-dimension oscillation signature: amplitude, phase, and a stability
/// flag. The core never populates these beyond the zeroed shell described
/// in spec.md §4.5/§4.6 — "the shell exists so downstream consumers can
/// fill it; the core does not populate it" (SPEC_FULL.md Open Question 2).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DimensionSignature {
    pub amplitude: f64,
    pub phase: f64,
    pub is_stable: bool,
}

/// An opaque, unpopulated-by-this-crate diagnostic by-product attached to
/// every scale level and scalar analysis (spec.md §3 "Oscillation map").
/// The recovery engine treats this as a tree leaf it owns but never reads.
#[derive(Debug, Clone, PartialEq)]
pub struct OscillationMap {
    num_dimensions: usize,
    signatures: Vec<DimensionSignature>,
    /// `num_dimensions x num_dimensions` row-major cross-correlation block.
    cross_correlation: Vec<f64>,
    pub is_converging: bool,
    pub iterations_to_convergence: u32,
}

impl OscillationMap {
    /// Builds an empty shell with `num_dimensions` zeroed signatures, a
    /// zeroed cross-correlation block, `is_converging = false`, and
    /// `iterations_to_convergence = 0`.
    pub fn empty_shell(num_dimensions: usize) -> Self {
        OscillationMap {
            num_dimensions,
            signatures: vec![DimensionSignature::default(); num_dimensions],
            cross_correlation: vec![0.0; num_dimensions * num_dimensions],
            is_converging: false,
            iterations_to_convergence: 0,
        }
    }

    pub fn num_dimensions(&self) -> usize {
        self.num_dimensions
    }

    pub fn signatures(&self) -> &[DimensionSignature] {
        &self.signatures
    }

    pub fn cross_correlation(&self, i: usize, j: usize) -> f64 {
        self.cross_correlation[i * self.num_dimensions + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_shell_scale_level_dims() {
        // spec.md §4.5: scale levels attach a 3-dimensional shell.
        let shell = OscillationMap::empty_shell(3);
        assert_eq!(shell.num_dimensions(), 3);
        assert_eq!(shell.signatures().len(), 3);
        assert!(shell.signatures().iter().all(|s| *s == DimensionSignature::default()));
        assert!(!shell.is_converging);
        assert_eq!(shell.iterations_to_convergence, 0);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(shell.cross_correlation(i, j), 0.0);
            }
        }
    }

    #[test]
    fn test_empty_shell_zero_dims() {
        let shell = OscillationMap::empty_shell(0);
        assert_eq!(shell.num_dimensions(), 0);
        assert!(shell.signatures().is_empty());
    }
}
