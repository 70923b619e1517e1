use crate::oscillation::OscillationMap;

/// Half-width of the scalar-stability band around `1.0` (spec.md §4.6):
/// a scalar is stable iff `|sigma - 1| < 0.5`.
const SCALAR_STABILITY_BAND: f64 = 0.5;

/// A descriptor for the dimension-size space a scalar dilation is
/// analyzed against (spec.md §3 "Hyperdimensional structure").
#[derive(Debug, Clone, PartialEq)]
pub struct HyperdimensionalStructure {
    pub num_dimensions: usize,
    pub sizes: Vec<u64>,
    pub total_elements: u64,
}

impl HyperdimensionalStructure {
    /// Builds a structure from `sizes`. `total_elements` defaults to the
    /// product of `sizes` when `None`; an explicit value overrides it
    /// (spec.md §3: "total_elements = product of sizes or explicitly
    /// supplied").
    pub fn new(sizes: Vec<u64>, total_elements: Option<u64>) -> Self {
        let num_dimensions = sizes.len();
        let total_elements = total_elements.unwrap_or_else(|| sizes.iter().product());
        HyperdimensionalStructure {
            num_dimensions,
            sizes,
            total_elements,
        }
    }
}

/// Per-scalar diagnostic record (spec.md §3 "Scalar analysis").
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarAnalysis {
    pub scalar: f64,
    pub oscillation: OscillationMap,
    pub variance_per_axis: Vec<f64>,
    pub variance_per_element: Vec<f64>,
    pub is_stable: bool,
}

fn stability_score(sigma: f64) -> f64 {
    1.0 / (1.0 + (sigma - 1.0).abs())
}

impl ScalarAnalysis {
    fn build(sigma: f64, structure: &HyperdimensionalStructure) -> Self {
        ScalarAnalysis {
            scalar: sigma,
            oscillation: OscillationMap::empty_shell(structure.num_dimensions),
            variance_per_axis: vec![0.0; structure.num_dimensions],
            variance_per_element: vec![0.0; structure.total_elements as usize],
            is_stable: (sigma - 1.0).abs() < SCALAR_STABILITY_BAND,
        }
    }
}

/// Holds per-scalar results for a set of scalar dilations plus their
/// cross-scalar correlation matrix (spec.md §3 "Multi-scalar analysis",
/// §4.6).
#[derive(Debug, Clone, PartialEq)]
pub struct MultiScalarAnalysis {
    pub analyses: Vec<ScalarAnalysis>,
    correlation: Vec<f64>,
}

impl MultiScalarAnalysis {
    fn k(&self) -> usize {
        self.analyses.len()
    }

    /// `C[i][j] = 1 / (1 + |sigma_i - sigma_j|)`.
    pub fn correlation(&self, i: usize, j: usize) -> f64 {
        self.correlation[i * self.k() + j]
    }

    /// Conjunction of per-scalar stability flags.
    pub fn all_stable(&self) -> bool {
        self.analyses.iter().all(|a| a.is_stable)
    }

    /// Index of the scalar closest to `1.0` (equivalently, maximal
    /// `1 / (1 + |sigma_k - 1|)`). Ties resolve to the first occurrence.
    pub fn most_stable_scalar(&self) -> Option<usize> {
        self.analyses
            .iter()
            .map(|a| stability_score(a.scalar))
            .enumerate()
            .fold(None, |best, (i, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((i, score)),
            })
            .map(|(i, _)| i)
    }

    /// Mean of `C[i][i+1]` over consecutive scalar pairs; `0.0` when
    /// `K < 2`.
    pub fn multi_scalar_consistency(&self) -> f64 {
        let k = self.k();
        if k < 2 {
            return 0.0;
        }
        let sum: f64 = (0..k - 1).map(|i| self.correlation(i, i + 1)).sum();
        sum / (k - 1) as f64
    }
}

/// Builds a [`MultiScalarAnalysis`] for `scalars` against `structure`
/// (spec.md §6 "analyze multi-scalar").
pub fn analyze_multi_scalar(
    structure: &HyperdimensionalStructure,
    scalars: &[f64],
) -> MultiScalarAnalysis {
    let analyses: Vec<ScalarAnalysis> = scalars
        .iter()
        .map(|&sigma| ScalarAnalysis::build(sigma, structure))
        .collect();

    let k = scalars.len();
    let mut correlation = vec![0.0; k * k];
    for i in 0..k {
        for j in 0..k {
            correlation[i * k + j] = 1.0 / (1.0 + (scalars[i] - scalars[j]).abs());
        }
    }

    tracing::debug!(k, "multi-scalar analysis complete");

    MultiScalarAnalysis {
        analyses,
        correlation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_s5_multi_scalar_scenario() {
        // spec.md S5: scalars {0.5, 1.0, 1.5, 2.0}.
        let structure = HyperdimensionalStructure::new(vec![4, 4, 4], None);
        let scalars = [0.5, 1.0, 1.5, 2.0];
        let analysis = analyze_multi_scalar(&structure, &scalars);

        assert_relative_eq!(analysis.correlation(0, 1), 1.0 / 1.5, epsilon = 1e-12);
        assert_relative_eq!(analysis.correlation(1, 2), 1.0 / 1.5, epsilon = 1e-12);
        assert_relative_eq!(analysis.correlation(2, 3), 1.0 / 1.5, epsilon = 1e-12);
        assert_relative_eq!(
            analysis.multi_scalar_consistency(),
            1.0 / 1.5,
            epsilon = 1e-12
        );
        assert_eq!(analysis.most_stable_scalar(), Some(1));
        assert!(!analysis.all_stable());
    }

    #[test]
    fn test_correlation_symmetric_unit_diagonal() {
        let structure = HyperdimensionalStructure::new(vec![3], None);
        let scalars = [0.7, 1.2, 2.5];
        let analysis = analyze_multi_scalar(&structure, &scalars);
        for i in 0..3 {
            assert_relative_eq!(analysis.correlation(i, i), 1.0);
            for j in 0..3 {
                assert_relative_eq!(analysis.correlation(i, j), analysis.correlation(j, i));
                assert!(analysis.correlation(i, j) > 0.0 && analysis.correlation(i, j) <= 1.0);
            }
        }
    }

    #[test]
    fn test_consistency_zero_below_two_scalars() {
        let structure = HyperdimensionalStructure::new(vec![2], None);
        let analysis = analyze_multi_scalar(&structure, &[1.0]);
        assert_eq!(analysis.multi_scalar_consistency(), 0.0);
        let analysis0 = analyze_multi_scalar(&structure, &[]);
        assert_eq!(analysis0.multi_scalar_consistency(), 0.0);
    }

    #[test]
    fn test_hyperdimensional_structure_product_default() {
        let h = HyperdimensionalStructure::new(vec![2, 3, 4], None);
        assert_eq!(h.total_elements, 24);
        assert_eq!(h.num_dimensions, 3);
    }

    #[test]
    fn test_hyperdimensional_structure_explicit_total() {
        let h = HyperdimensionalStructure::new(vec![2, 3, 4], Some(100));
        assert_eq!(h.total_elements, 100);
    }

    #[test]
    fn test_variance_arrays_sized_and_zeroed() {
        let structure = HyperdimensionalStructure::new(vec![2, 2], None);
        let analysis = analyze_multi_scalar(&structure, &[1.0]);
        let a = &analysis.analyses[0];
        assert_eq!(a.variance_per_axis, vec![0.0, 0.0]);
        assert_eq!(a.variance_per_element.len(), 4);
        assert!(a.variance_per_element.iter().all(|&v| v == 0.0));
    }
}
