use crate::oscillation::OscillationMap;
use blindrecover_core::StructuralMap;

/// Stability threshold for a downsampled scale level: strictly below this
/// corruption percentage, the level is stable (spec.md §4.5).
const SCALE_STABILITY_THRESHOLD: f64 = 0.10;

/// A single level of the multi-scale pyramid, finest at `scale = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleLevel {
    pub scale: u32,
    pub resolution: u32,
    pub n: u32,
    pub e: u32,
    pub f: u32,
    pub corruption_percentage: f64,
    pub oscillation: OscillationMap,
    pub is_stable: bool,
}

fn downsample_count(count: u32, resolution: u32) -> u32 {
    (count / resolution).max(1)
}

impl ScaleLevel {
    fn build(scale: u32, structural_map: &StructuralMap) -> Self {
        let resolution = 1u32 << scale;
        let n = downsample_count(structural_map.n, resolution);
        let e = downsample_count(structural_map.e, resolution);
        let f = downsample_count(structural_map.f, resolution);
        let corruption_percentage = structural_map.corruption_percentage();
        let is_stable = corruption_percentage < SCALE_STABILITY_THRESHOLD;

        ScaleLevel {
            scale,
            resolution,
            n,
            e,
            f,
            corruption_percentage,
            oscillation: OscillationMap::empty_shell(3),
            is_stable,
        }
    }
}

/// A pyramid of downsampled structural summaries, finest (index 0) to
/// coarsest (index `K - 1`), plus the aggregate stability flag
/// (spec.md §3 "Multi-scale analysis", §4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct MultiScaleAnalysis {
    pub levels: Vec<ScaleLevel>,
    pub current_scale: usize,
    pub all_scales_stable: bool,
}

impl MultiScaleAnalysis {
    /// Coarsest stable scale: the highest index with `is_stable == true`,
    /// or `0` if none are stable.
    pub fn coarsest_stable_scale(&self) -> usize {
        self.levels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_stable)
            .map(|(i, _)| i)
            .max()
            .unwrap_or(0)
    }

    /// Finest unstable scale: the lowest index with `is_stable == false`,
    /// or `K - 1` (the coarsest level) if every level is stable.
    pub fn finest_unstable_scale(&self) -> usize {
        self.levels
            .iter()
            .enumerate()
            .find(|(_, l)| !l.is_stable)
            .map(|(i, _)| i)
            .unwrap_or_else(|| self.levels.len().saturating_sub(1))
    }
}

/// Builds a `K`-level multi-scale pyramid from `structural_map`
/// (spec.md §6 "analyze multi-scale"). `K = 0` yields an empty, vacuously
/// stable analysis.
pub fn analyze_multi_scale(structural_map: &StructuralMap, k: u32) -> MultiScaleAnalysis {
    let levels: Vec<ScaleLevel> = (0..k)
        .map(|scale| ScaleLevel::build(scale, structural_map))
        .collect();
    let all_scales_stable = levels.iter().all(|l| l.is_stable);

    tracing::debug!(
        k,
        all_scales_stable,
        "multi-scale analysis complete"
    );

    MultiScaleAnalysis {
        levels,
        current_scale: 0,
        all_scales_stable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_map(corruption_mask: Vec<bool>) -> StructuralMap {
        StructuralMap::new(8, 12, 6, corruption_mask).unwrap()
    }

    #[test]
    fn test_k_zero_is_vacuously_stable() {
        let map = cube_map(vec![false; 8]);
        let analysis = analyze_multi_scale(&map, 0);
        assert!(analysis.levels.is_empty());
        assert!(analysis.all_scales_stable);
    }

    #[test]
    fn test_resolution_and_downsample() {
        let map = cube_map(vec![false; 8]);
        let analysis = analyze_multi_scale(&map, 4);
        assert_eq!(analysis.levels.len(), 4);
        assert_eq!(analysis.levels[0].resolution, 1);
        assert_eq!(analysis.levels[1].resolution, 2);
        assert_eq!(analysis.levels[2].resolution, 4);
        assert_eq!(analysis.levels[3].resolution, 8);

        // n=8, e=12, f=6: divide toward zero, clamp to >= 1.
        assert_eq!(analysis.levels[0].n, 8);
        assert_eq!(analysis.levels[1].n, 4); // 8 / 2
        assert_eq!(analysis.levels[2].n, 2); // 8 / 4
        assert_eq!(analysis.levels[3].n, 1); // 8 / 8
        assert_eq!(analysis.levels[3].e, 1); // 12 / 8 = 1 (toward zero)
        assert_eq!(analysis.levels[3].f, 1); // 6 / 8 = 0, clamped to 1
    }

    #[test]
    fn test_all_scales_stable_when_uncorrupted() {
        let map = cube_map(vec![false; 8]);
        let analysis = analyze_multi_scale(&map, 3);
        assert!(analysis.all_scales_stable);
        assert!(analysis.levels.iter().all(|l| l.is_stable));
        assert_eq!(analysis.coarsest_stable_scale(), 2);
        assert_eq!(analysis.finest_unstable_scale(), 2);
    }

    #[test]
    fn test_heavily_corrupted_map_is_unstable_at_every_scale() {
        // 5 of 8 vertices corrupted => 62.5% >= 10% threshold at every scale
        // (corruption percentage is carried over unchanged per spec.md §4.5).
        let mask = vec![true, true, true, true, true, false, false, false];
        let map = cube_map(mask);
        let analysis = analyze_multi_scale(&map, 3);
        assert!(!analysis.all_scales_stable);
        assert_eq!(analysis.coarsest_stable_scale(), 0);
        assert_eq!(analysis.finest_unstable_scale(), 0);
    }

    #[test]
    fn test_oscillation_shell_attached() {
        let map = cube_map(vec![false; 8]);
        let analysis = analyze_multi_scale(&map, 1);
        assert_eq!(analysis.levels[0].oscillation.num_dimensions(), 3);
    }
}
