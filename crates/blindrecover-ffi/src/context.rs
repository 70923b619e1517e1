use blindrecover_core::{AnchorManager, AnchorSystem};

/// Opaque handle owning an anchor system plus the manager that operates
/// on it. The manager carries only policy constants (spec.md §4.4's
/// "implementations must expose them at construction time"); callers
/// needing non-default policy should file for a dedicated constructor
/// rather than mutate this handle's manager directly.
pub struct BrecAnchorSystem {
    pub system: AnchorSystem,
    pub manager: AnchorManager,
}

impl BrecAnchorSystem {
    pub fn new(system: AnchorSystem) -> Self {
        BrecAnchorSystem {
            system,
            manager: AnchorManager::new(),
        }
    }
}

/// Opaque handle owning a coprime/GCD table (spec.md §6 "compute coprime
/// matrix").
pub type BrecCoprimeMatrix = blindrecover_geometry::CoprimeMatrix;

/// Opaque handle owning a multi-scale analysis (spec.md §6 "analyze
/// multi-scale").
pub type BrecMultiScaleAnalysis = blindrecover_analysis::MultiScaleAnalysis;

/// Opaque handle owning a multi-scalar analysis (spec.md §6 "analyze
/// multi-scalar").
pub type BrecMultiScalarAnalysis = blindrecover_analysis::MultiScalarAnalysis;
