use blindrecover_core::Point3;

/// A 3D point, C-ABI layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrecPoint3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<BrecPoint3> for Point3 {
    fn from(p: BrecPoint3) -> Point3 {
        [p.x, p.y, p.z]
    }
}

impl From<Point3> for BrecPoint3 {
    fn from(p: Point3) -> BrecPoint3 {
        BrecPoint3 {
            x: p[0],
            y: p[1],
            z: p[2],
        }
    }
}

/// An anchor record passed in to `brec_anchor_system_create`: a
/// vertex_id/position/confidence triple. `is_corrupted` always starts
/// `false`; corruption is a runtime-detected property, not an input.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrecAnchorRecord {
    pub vertex_id: u32,
    pub position: BrecPoint3,
    pub confidence: f64,
}

/// Flat, C-ABI mirror of [`blindrecover_core::RecoveryMetrics`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BrecRecoveryMetrics {
    pub total_vertices: u32,
    pub corrupted_count: u32,
    pub recovered_count: u32,
    pub average_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub average_confidence_corrupted: f64,
    pub recovery_rate: f64,
    pub corruption_percentage: f64,
}

impl From<blindrecover_core::RecoveryMetrics> for BrecRecoveryMetrics {
    fn from(m: blindrecover_core::RecoveryMetrics) -> Self {
        BrecRecoveryMetrics {
            total_vertices: m.total_vertices,
            corrupted_count: m.corrupted_count,
            recovered_count: m.recovered_count,
            average_confidence: m.average_confidence,
            min_confidence: m.min_confidence,
            max_confidence: m.max_confidence,
            average_confidence_corrupted: m.average_confidence_corrupted,
            recovery_rate: m.recovery_rate,
            corruption_percentage: m.corruption_percentage,
        }
    }
}
