//! C FFI boundary for the blindrecover engine (spec.md §6, SPEC_FULL.md
//! §6). Owns no domain logic: only opaque handles, status codes, and
//! marshaling between flat C arrays and the Rust domain types in
//! `blindrecover-core` / `blindrecover-analysis` / `blindrecover-geometry`.
//!
//! Every function here returns a [`BrecStatus`] and never unwinds across
//! the FFI boundary ([`error::catch_panic`], mirroring the teacher's
//! `ir-ffi::catch_panic`).

mod context;
mod error;
mod types;

pub use context::{BrecAnchorSystem, BrecCoprimeMatrix, BrecMultiScalarAnalysis, BrecMultiScaleAnalysis};
pub use error::BrecStatus;
pub use types::{BrecAnchorRecord, BrecPoint3, BrecRecoveryMetrics};

use error::{catch_panic, set_last_error};
use std::ffi::CString;
use std::os::raw::c_char;
use std::slice;

use blindrecover_analysis::{analyze_multi_scale, analyze_multi_scalar, HyperdimensionalStructure};
use blindrecover_core::{
    adjust_anchors_iterative, compute_all_confidence_scores as core_compute_all_confidence_scores,
    compute_recovery_metrics, validate_recovery_quality, AnchorPoint, AnchorSystem, Point3,
    StructuralMap,
};
use blindrecover_geometry::CoprimeMatrix;

unsafe fn slice_from_raw<'a, T>(ptr: *const T, len: usize) -> &'a [T] {
    if len == 0 {
        &[]
    } else {
        slice::from_raw_parts(ptr, len)
    }
}

unsafe fn slice_from_raw_mut<'a, T>(ptr: *mut T, len: usize) -> &'a mut [T] {
    if len == 0 {
        &mut []
    } else {
        slice::from_raw_parts_mut(ptr, len)
    }
}

/// Builds an anchor system from `num_anchors` [`BrecAnchorRecord`]s and a
/// dense `num_anchors x num_anchors` expected-distance matrix (spec.md §6
/// "build anchor system").
///
/// # Safety
/// `anchors` must point to `num_anchors` valid records; `expected_distances`
/// must point to `num_anchors * num_anchors` valid `f64`s; `out` must be a
/// valid, non-null `*mut *mut BrecAnchorSystem`.
#[no_mangle]
pub unsafe extern "C" fn brec_anchor_system_create(
    anchors: *const BrecAnchorRecord,
    num_anchors: usize,
    expected_distances: *const f64,
    out: *mut *mut BrecAnchorSystem,
) -> BrecStatus {
    catch_panic(|| {
        if anchors.is_null() || expected_distances.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        let records = slice_from_raw(anchors, num_anchors);
        let distances = slice_from_raw(expected_distances, num_anchors * num_anchors).to_vec();

        let anchor_points: Vec<AnchorPoint> = records
            .iter()
            .map(|r| AnchorPoint::new(r.vertex_id, r.position.into(), r.confidence))
            .collect();

        match AnchorSystem::build(anchor_points, distances) {
            Some(system) => {
                let handle = Box::new(BrecAnchorSystem::new(system));
                *out = Box::into_raw(handle);
                BrecStatus::Ok
            }
            None => {
                set_last_error("empty anchor set or malformed distance matrix".to_string());
                BrecStatus::ErrorInvalidArgument
            }
        }
    })
}

/// Destroys a handle previously returned by `brec_anchor_system_create`.
/// Passing null is a no-op.
///
/// # Safety
/// `handle` must be a pointer previously returned by
/// `brec_anchor_system_create` and not yet destroyed, or null.
#[no_mangle]
pub unsafe extern "C" fn brec_anchor_system_destroy(handle: *mut BrecAnchorSystem) -> BrecStatus {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
    BrecStatus::Ok
}

/// Runs the outer recovery iteration (spec.md §4.7, §6 "adjust anchors
/// iteratively"). `vertices`, `confidences`, and `mask` must each have
/// `num_vertices` elements; `confidences` is mutated in place.
///
/// # Safety
/// All pointer arguments must be valid for `num_vertices` elements as
/// described above; `out_count` must be a valid, non-null `*mut u64`.
#[no_mangle]
pub unsafe extern "C" fn brec_adjust_anchors_iterative(
    handle: *mut BrecAnchorSystem,
    vertices: *const BrecPoint3,
    num_vertices: usize,
    confidences: *mut f64,
    mask: *const bool,
    max_iterations: u32,
    out_count: *mut u64,
) -> BrecStatus {
    catch_panic(|| {
        if handle.is_null() || vertices.is_null() || confidences.is_null() || mask.is_null() || out_count.is_null()
        {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        let ctx = &mut *handle;
        let points: Vec<Point3> = slice_from_raw(vertices, num_vertices)
            .iter()
            .map(|&p| p.into())
            .collect();
        let confidences_slice = slice_from_raw_mut(confidences, num_vertices);
        let mask_slice = slice_from_raw(mask, num_vertices);

        match adjust_anchors_iterative(
            &mut ctx.system,
            &ctx.manager,
            &points,
            confidences_slice,
            mask_slice,
            max_iterations,
        ) {
            Ok(count) => {
                *out_count = count;
                BrecStatus::Ok
            }
            Err(e) => {
                set_last_error(e.to_string());
                BrecStatus::ErrorInvalidArgument
            }
        }
    })
}

/// Overwrites `confidences_out` with per-vertex confidence scores
/// (spec.md §6 "compute all confidence scores").
///
/// # Safety
/// `vertices`, `mask`, and `confidences_out` must each be valid for
/// `num_vertices` elements; `handle` must be a valid, non-null anchor
/// system handle.
#[no_mangle]
pub unsafe extern "C" fn brec_compute_all_confidence_scores(
    vertices: *const BrecPoint3,
    mask: *const bool,
    num_vertices: usize,
    handle: *const BrecAnchorSystem,
    confidences_out: *mut f64,
) -> BrecStatus {
    catch_panic(|| {
        if vertices.is_null() || mask.is_null() || handle.is_null() || confidences_out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        let ctx = &*handle;
        let points: Vec<Point3> = slice_from_raw(vertices, num_vertices)
            .iter()
            .map(|&p| p.into())
            .collect();
        let mask_slice = slice_from_raw(mask, num_vertices);
        let out_slice = slice_from_raw_mut(confidences_out, num_vertices);

        let structural_map = match StructuralMap::new(
            num_vertices as u32,
            0,
            0,
            mask_slice.to_vec(),
        ) {
            Ok(m) => m,
            Err(e) => {
                set_last_error(e.to_string());
                return BrecStatus::ErrorInvalidArgument;
            }
        };

        match core_compute_all_confidence_scores(&points, &ctx.system, &structural_map, out_slice)
        {
            Ok(()) => BrecStatus::Ok,
            Err(e) => {
                set_last_error(e.to_string());
                BrecStatus::ErrorInvalidArgument
            }
        }
    })
}

/// Computes [`BrecRecoveryMetrics`] from a final confidence vector and
/// corruption mask (spec.md §6 "compute recovery metrics").
///
/// # Safety
/// `confidences` and `mask` must each be valid for `num_vertices`
/// elements; `out` must be a valid, non-null `*mut BrecRecoveryMetrics`.
#[no_mangle]
pub unsafe extern "C" fn brec_compute_recovery_metrics(
    confidences: *const f64,
    mask: *const bool,
    num_vertices: usize,
    out: *mut BrecRecoveryMetrics,
) -> BrecStatus {
    catch_panic(|| {
        if confidences.is_null() || mask.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        let confidences_slice = slice_from_raw(confidences, num_vertices);
        let mask_slice = slice_from_raw(mask, num_vertices);

        match compute_recovery_metrics(confidences_slice, mask_slice) {
            Ok(metrics) => {
                *out = metrics.into();
                BrecStatus::Ok
            }
            Err(e) => {
                set_last_error(e.to_string());
                BrecStatus::ErrorInvalidArgument
            }
        }
    })
}

/// Validates recovery quality against caller-supplied thresholds
/// (spec.md §6 "validate recovery quality").
///
/// # Safety
/// `metrics` and `out` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn brec_validate_recovery_quality(
    metrics: *const BrecRecoveryMetrics,
    min_recovery_rate: f64,
    min_average_confidence: f64,
    out: *mut bool,
) -> BrecStatus {
    catch_panic(|| {
        if metrics.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        let m = &*metrics;
        let core_metrics = blindrecover_core::RecoveryMetrics {
            total_vertices: m.total_vertices,
            corrupted_count: m.corrupted_count,
            recovered_count: m.recovered_count,
            average_confidence: m.average_confidence,
            min_confidence: m.min_confidence,
            max_confidence: m.max_confidence,
            average_confidence_corrupted: m.average_confidence_corrupted,
            recovery_rate: m.recovery_rate,
            corruption_percentage: m.corruption_percentage,
        };
        *out = validate_recovery_quality(&core_metrics, min_recovery_rate, min_average_confidence);
        BrecStatus::Ok
    })
}

/// Builds a coprime/GCD table over `sizes` (spec.md §6 "compute coprime
/// matrix"). `len == 0` is reported as `ErrorInvalidArgument`, matching
/// spec.md §4.2's "D = 0 ... returns a null result".
///
/// # Safety
/// `sizes` must be valid for `len` elements; `out` must be a valid,
/// non-null `*mut *mut BrecCoprimeMatrix`.
#[no_mangle]
pub unsafe extern "C" fn brec_compute_coprime_matrix(
    sizes: *const u64,
    len: usize,
    out: *mut *mut BrecCoprimeMatrix,
) -> BrecStatus {
    catch_panic(|| {
        if sizes.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        let sizes_slice = slice_from_raw(sizes, len);
        match CoprimeMatrix::build(sizes_slice) {
            Some(matrix) => {
                *out = Box::into_raw(Box::new(matrix));
                BrecStatus::Ok
            }
            None => {
                set_last_error("empty size vector".to_string());
                BrecStatus::ErrorInvalidArgument
            }
        }
    })
}

/// Reads `M[i][j]` from a coprime matrix handle.
///
/// # Safety
/// `matrix` must be a valid, non-null handle; `i`, `j` must be in range;
/// `out` must be a valid, non-null `*mut u64`.
#[no_mangle]
pub unsafe extern "C" fn brec_coprime_matrix_get(
    matrix: *const BrecCoprimeMatrix,
    i: usize,
    j: usize,
    out: *mut u64,
) -> BrecStatus {
    catch_panic(|| {
        if matrix.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        let m = &*matrix;
        if i >= m.dim() || j >= m.dim() {
            set_last_error("index out of range".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        *out = m.get(i, j);
        BrecStatus::Ok
    })
}

/// Destroys a coprime matrix handle. Passing null is a no-op.
///
/// # Safety
/// `matrix` must be a pointer previously returned by
/// `brec_compute_coprime_matrix` and not yet destroyed, or null.
#[no_mangle]
pub unsafe extern "C" fn brec_coprime_matrix_destroy(matrix: *mut BrecCoprimeMatrix) -> BrecStatus {
    if !matrix.is_null() {
        drop(Box::from_raw(matrix));
    }
    BrecStatus::Ok
}

/// Builds a `k`-level multi-scale analysis from a structural map's
/// `(n, e, f)` counts and per-vertex corruption mask (spec.md §6
/// "analyze multi-scale").
///
/// # Safety
/// `mask` must be valid for `num_vertices` elements; `out` must be a
/// valid, non-null `*mut *mut BrecMultiScaleAnalysis`.
#[no_mangle]
pub unsafe extern "C" fn brec_analyze_multi_scale(
    n: u32,
    e: u32,
    f: u32,
    mask: *const bool,
    num_vertices: usize,
    k: u32,
    out: *mut *mut BrecMultiScaleAnalysis,
) -> BrecStatus {
    catch_panic(|| {
        if mask.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        let mask_slice = slice_from_raw(mask, num_vertices).to_vec();
        let structural_map = match StructuralMap::new(n, e, f, mask_slice) {
            Ok(m) => m,
            Err(err) => {
                set_last_error(err.to_string());
                return BrecStatus::ErrorInvalidArgument;
            }
        };
        let analysis = analyze_multi_scale(&structural_map, k);
        *out = Box::into_raw(Box::new(analysis));
        BrecStatus::Ok
    })
}

/// Reads the aggregate `all_scales_stable` flag from a multi-scale
/// analysis handle.
///
/// # Safety
/// `analysis` and `out` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn brec_multi_scale_all_stable(
    analysis: *const BrecMultiScaleAnalysis,
    out: *mut bool,
) -> BrecStatus {
    catch_panic(|| {
        if analysis.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        *out = (*analysis).all_scales_stable;
        BrecStatus::Ok
    })
}

/// Reads the number of levels in a multi-scale analysis handle.
///
/// # Safety
/// `analysis` and `out` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn brec_multi_scale_num_levels(
    analysis: *const BrecMultiScaleAnalysis,
    out: *mut usize,
) -> BrecStatus {
    catch_panic(|| {
        if analysis.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        *out = (*analysis).levels.len();
        BrecStatus::Ok
    })
}

/// Destroys a multi-scale analysis handle. Passing null is a no-op.
///
/// # Safety
/// `analysis` must be a pointer previously returned by
/// `brec_analyze_multi_scale` and not yet destroyed, or null.
#[no_mangle]
pub unsafe extern "C" fn brec_multi_scale_destroy(
    analysis: *mut BrecMultiScaleAnalysis,
) -> BrecStatus {
    if !analysis.is_null() {
        drop(Box::from_raw(analysis));
    }
    BrecStatus::Ok
}

/// Builds a multi-scalar analysis over `num_sizes` dimension sizes and
/// `num_scalars` scalar dilations (spec.md §6 "analyze multi-scalar").
/// `total_elements == 0` requests the default (product of `sizes`).
///
/// # Safety
/// `sizes` must be valid for `num_sizes` elements; `scalars` must be
/// valid for `num_scalars` elements; `out` must be a valid, non-null
/// `*mut *mut BrecMultiScalarAnalysis`.
#[no_mangle]
pub unsafe extern "C" fn brec_analyze_multi_scalar(
    sizes: *const u64,
    num_sizes: usize,
    total_elements: u64,
    scalars: *const f64,
    num_scalars: usize,
    out: *mut *mut BrecMultiScalarAnalysis,
) -> BrecStatus {
    catch_panic(|| {
        if sizes.is_null() || scalars.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        let sizes_vec = slice_from_raw(sizes, num_sizes).to_vec();
        let scalars_slice = slice_from_raw(scalars, num_scalars);
        let total = if total_elements == 0 {
            None
        } else {
            Some(total_elements)
        };
        let structure = HyperdimensionalStructure::new(sizes_vec, total);
        let analysis = analyze_multi_scalar(&structure, scalars_slice);
        *out = Box::into_raw(Box::new(analysis));
        BrecStatus::Ok
    })
}

/// Reads the conjunction of per-scalar stability flags.
///
/// # Safety
/// `analysis` and `out` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn brec_multi_scalar_all_stable(
    analysis: *const BrecMultiScalarAnalysis,
    out: *mut bool,
) -> BrecStatus {
    catch_panic(|| {
        if analysis.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        *out = (*analysis).all_stable();
        BrecStatus::Ok
    })
}

/// Reads the multi-scalar consistency score (mean of consecutive
/// cross-scalar correlations).
///
/// # Safety
/// `analysis` and `out` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn brec_multi_scalar_consistency(
    analysis: *const BrecMultiScalarAnalysis,
    out: *mut f64,
) -> BrecStatus {
    catch_panic(|| {
        if analysis.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return BrecStatus::ErrorInvalidArgument;
        }
        *out = (*analysis).multi_scalar_consistency();
        BrecStatus::Ok
    })
}

/// Destroys a multi-scalar analysis handle. Passing null is a no-op.
///
/// # Safety
/// `analysis` must be a pointer previously returned by
/// `brec_analyze_multi_scalar` and not yet destroyed, or null.
#[no_mangle]
pub unsafe extern "C" fn brec_multi_scalar_destroy(
    analysis: *mut BrecMultiScalarAnalysis,
) -> BrecStatus {
    if !analysis.is_null() {
        drop(Box::from_raw(analysis));
    }
    BrecStatus::Ok
}

/// Retrieves the last error message set by this thread, or null if none
/// has occurred. The caller must free the returned string with
/// `brec_free_string`.
#[no_mangle]
pub extern "C" fn brec_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Frees a string previously returned by `brec_last_error`.
///
/// # Safety
/// `s` must be a pointer previously returned by `brec_last_error`, or
/// null.
#[no_mangle]
pub unsafe extern "C" fn brec_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
