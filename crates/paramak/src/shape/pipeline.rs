//! Evaluation: fingerprint, cache lookup, construction, placement and
//! boolean post-processing.

use std::cell::RefCell;
use std::rc::Rc;

use paramak_kernel::paramak_kernel_math::{Point2, Point3, Vec3};
use paramak_kernel::paramak_kernel_sketch::curve::catmull_rom;
use paramak_kernel::paramak_kernel_sketch::{SketchSegment, SweepMode};
use paramak_kernel::{current_kernel, Frame, Kernel, Solid};
use serde_json::json;

use super::{Construction, ParametricShape, ShapeCore, ShapeRef};
use crate::error::{ParamakError, Result};
use crate::hash::fingerprint;
use crate::workplane::{Axis, RotationAxis, Workplane};

/// Sub-segments per span when sampling a sweep path spline.
const PATH_SUBDIVISIONS: u32 = 8;

thread_local! {
    static ACTIVE: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a shape as being evaluated on this thread; re-entering the same
/// shape means it depends on itself.
struct ActiveGuard(usize);

impl ActiveGuard {
    fn enter(core: &ShapeCore) -> Result<Self> {
        let key = core as *const ShapeCore as usize;
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                return Err(ParamakError::CyclicDependency(core.name.clone()));
            }
            stack.push(key);
            Ok(ActiveGuard(key))
        })
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|&k| k == self.0) {
                stack.remove(pos);
            }
        });
    }
}

// =============================================================================
// Fingerprint and cache
// =============================================================================

/// Fingerprint of every parameter that affects the solid, children and
/// kernel included.
pub fn hash_value<S: ParametricShape + ?Sized>(shape: &S) -> Result<String> {
    let _guard = ActiveGuard::enter(shape.core())?;
    let kernel = current_kernel();
    hash_unguarded(shape, &*kernel)
}

fn hash_unguarded<S: ParametricShape + ?Sized>(shape: &S, kernel: &dyn Kernel) -> Result<String> {
    let core = shape.core();
    let children = |refs: &[ShapeRef]| -> Result<Vec<String>> {
        refs.iter().map(ShapeRef::hash_value).collect()
    };
    let tree = json!({
        "kind": shape.kind(),
        "core": core.hash_tree(),
        "parameters": shape.parameters(),
        "profile": shape.profile()?,
        "construction": shape.construction()?,
        "cut": children(&core.cut)?,
        "intersect": children(&core.intersect)?,
        "union": children(&core.union)?,
        "kernel": kernel.fingerprint(),
    });
    fingerprint(&tree)
}

/// Return the cached solid if the fingerprint is unchanged, otherwise
/// rebuild it. Failed builds leave the previous cache entry untouched.
pub fn evaluate<S: ParametricShape + ?Sized>(shape: &S) -> Result<Rc<Solid>> {
    let core = shape.core();
    let _guard = ActiveGuard::enter(core)?;
    let kernel = current_kernel();
    let hash = hash_unguarded(shape, &*kernel)?;

    if let Some((cached, solid)) = core.cache.borrow().as_ref() {
        if *cached == hash {
            tracing::debug!(shape = %core.name, "solid cache hit");
            return Ok(Rc::clone(solid));
        }
    }

    tracing::debug!(shape = %core.name, kind = shape.kind(), "building solid");
    let solid = Rc::new(build(shape, &*kernel)?);
    *core.cache.borrow_mut() = Some((hash, Rc::clone(&solid)));
    Ok(solid)
}

fn build<S: ParametricShape + ?Sized>(shape: &S, kernel: &dyn Kernel) -> Result<Solid> {
    let core = shape.core();
    let construction = shape.construction()?;
    let base = shape.construct(kernel)?;
    let axis = effective_rotation_axis(core, &construction);
    let mut solid = place(&core.name, base, &core.azimuth_placement_angle, &axis, kernel)?;
    if let Some([dx, dy, dz]) = core.translate {
        solid = solid.translate(dx, dy, dz);
    }
    perform_boolean_operations(shape, solid, &construction, &axis, kernel)
}

// =============================================================================
// Construction
// =============================================================================

/// The axis placement copies turn about.
pub(crate) fn effective_rotation_axis(core: &ShapeCore, construction: &Construction) -> RotationAxis {
    if let Some(axis) = core.rotation_axis {
        return axis;
    }
    match construction {
        Construction::Sweep { path_workplane, .. } => path_workplane.default_rotation_axis(),
        _ => core.workplane.default_rotation_axis(),
    }
}

/// Fail unless a sweep's path workplane shares its first axis with, and
/// differs from, the profile workplane.
pub(crate) fn check_path_workplane(workplane: Workplane, path_workplane: Workplane) -> Result<()> {
    if workplane == path_workplane || workplane.axes().0 != path_workplane.axes().0 {
        return Err(ParamakError::IncompatiblePathWorkplane {
            workplane: workplane.to_string(),
            path_workplane: path_workplane.to_string(),
        });
    }
    Ok(())
}

fn construction_frame(workplane: Workplane, construction: &Construction) -> Result<Frame> {
    let frame = workplane.frame();
    match construction {
        Construction::Rotate { .. } => Ok(frame),
        Construction::Extrude {
            extrusion_start_offset,
            ..
        } => Ok(frame.with_origin(Point3::from(-workplane.normal() * *extrusion_start_offset))),
        Construction::Sweep {
            path_points,
            path_workplane,
            ..
        } => {
            check_path_workplane(workplane, *path_workplane)?;
            let start = path_points.first().ok_or_else(|| {
                ParamakError::invalid("path_points", "a sweep path needs at least two points")
            })?;
            Ok(frame.with_origin(path_workplane.to_3d(*start)))
        }
    }
}

/// The default construction: build every leaf outline of the profile and
/// union the pieces.
pub(crate) fn construct_profile<S: ParametricShape + ?Sized>(
    shape: &S,
    kernel: &dyn Kernel,
) -> Result<Solid> {
    let name = shape.core().name.as_str();
    let mut pieces = construct_leaves(shape, kernel)?.into_iter();
    let first = pieces
        .next()
        .ok_or_else(|| ParamakError::invalid("points", format!("{name} has an empty profile")))?;
    pieces.try_fold(first, |acc, piece| {
        kernel
            .boolean_union(&acc, &piece)
            .map_err(|e| ParamakError::construction(name, e))
    })
}

/// One solid per leaf outline of the profile, in profile order.
pub(crate) fn construct_leaves<S: ParametricShape + ?Sized>(
    shape: &S,
    kernel: &dyn Kernel,
) -> Result<Vec<Solid>> {
    let core = shape.core();
    let name = core.name.as_str();
    let profile = shape.profile()?;
    let construction = shape.construction()?;
    let frame = construction_frame(core.workplane, &construction)?;

    profile
        .leaves()
        .into_iter()
        .map(|leaf| {
            let wire = kernel
                .build_wire(leaf.segments(), &frame)
                .map_err(|e| ParamakError::construction(name, e))?;
            match &construction {
                Construction::Rotate { rotation_angle } => {
                    kernel.revolve(&wire, frame.origin, frame.y_dir, *rotation_angle)
                }
                Construction::Extrude {
                    distance,
                    extrude_both,
                    ..
                } => {
                    if *extrude_both {
                        kernel.extrude(&wire, *distance, true)
                    } else {
                        kernel.extrude(&wire, -*distance, false)
                    }
                }
                Construction::Sweep {
                    path_points,
                    path_workplane,
                    force_cross_section,
                } => {
                    let path = sample_path(path_points, *path_workplane);
                    let mode = if *force_cross_section {
                        SweepMode::Perpendicular
                    } else {
                        SweepMode::Parallel
                    };
                    kernel.sweep(&wire, &path, mode)
                }
            }
            .map_err(|e| ParamakError::construction(name, e))
        })
        .collect()
}

fn sample_path(points: &[(f64, f64)], workplane: Workplane) -> Vec<Point3> {
    let pts: Vec<Point2> = points.iter().map(|&(x, y)| Point2::new(x, y)).collect();
    catmull_rom(&pts, PATH_SUBDIVISIONS)
        .into_iter()
        .map(|p| workplane.to_3d((p.x, p.y)))
        .collect()
}

/// Discretised profile outlines in 3D, as placed by the construction.
pub(crate) fn profile_wires<S: ParametricShape + ?Sized>(
    shape: &S,
    kernel: &dyn Kernel,
) -> Result<Vec<Vec<Point3>>> {
    let core = shape.core();
    let profile = shape.profile()?;
    let frame = construction_frame(core.workplane, &shape.construction()?)?;
    profile
        .leaves()
        .into_iter()
        .map(|leaf| {
            let wire = kernel
                .build_wire(leaf.segments(), &frame)
                .map_err(|e| ParamakError::construction(&core.name, e))?;
            kernel
                .wire_points(&wire)
                .map_err(|e| ParamakError::construction(&core.name, e))
        })
        .collect()
}

/// Revolve an outline drawn on `frame` about the frame's local y axis.
pub(crate) fn wire_solid_revolve(
    name: &str,
    segments: Vec<SketchSegment>,
    frame: &Frame,
    angle: f64,
    kernel: &dyn Kernel,
) -> Result<Solid> {
    let wire = kernel
        .build_wire(segments, frame)
        .map_err(|e| ParamakError::construction(name, e))?;
    kernel
        .revolve(&wire, frame.origin, frame.y_dir, angle)
        .map_err(|e| ParamakError::construction(name, e))
}

// =============================================================================
// Placement and booleans
// =============================================================================

/// One copy of `solid` per placement angle, unioned.
pub(crate) fn place(
    name: &str,
    solid: Solid,
    angles: &[f64],
    axis: &RotationAxis,
    kernel: &dyn Kernel,
) -> Result<Solid> {
    let (origin, dir) = axis.line();
    let mut copies = angles.iter().map(|&angle| {
        if angle == 0.0 {
            solid.clone()
        } else {
            kernel.rotate(&solid, origin, dir, angle)
        }
    });
    let Some(mut placed) = copies.next() else {
        return Ok(solid);
    };
    for copy in copies {
        placed = kernel
            .boolean_union(&placed, &copy)
            .map_err(|source| ParamakError::BooleanFailure {
                shape: name.to_string(),
                operation: "union",
                source,
            })?;
    }
    Ok(placed)
}

fn perform_boolean_operations<S: ParametricShape + ?Sized>(
    shape: &S,
    mut solid: Solid,
    construction: &Construction,
    axis: &RotationAxis,
    kernel: &dyn Kernel,
) -> Result<Solid> {
    let core = shape.core();
    let failure = |operation: &'static str| {
        let shape = core.name.clone();
        move |source| ParamakError::BooleanFailure {
            shape,
            operation,
            source,
        }
    };

    for child in &core.cut {
        let tool = child.solid()?;
        solid = kernel.boolean_cut(&solid, &tool).map_err(failure("cut"))?;
    }

    if let Construction::Extrude { rotation_angle, .. } = construction {
        if *rotation_angle < 360.0 {
            let wedge = sector_wedge(
                &core.name,
                &solid,
                *rotation_angle,
                &core.azimuth_placement_angle,
                axis,
                kernel,
            )?;
            solid = kernel.boolean_cut(&solid, &wedge).map_err(failure("cut"))?;
        }
    }

    for child in &core.intersect {
        let tool = child.solid()?;
        solid = kernel
            .boolean_intersect(&solid, &tool)
            .map_err(failure("intersect"))?;
    }

    for child in &core.union {
        let tool = child.solid()?;
        solid = kernel.boolean_union(&solid, &tool).map_err(failure("union"))?;
    }

    Ok(solid)
}

/// A wedge covering the angles `[keep, 360)` about `axis`, sized to
/// enclose `solid`, placed once per placement angle.
pub(crate) fn sector_wedge(
    name: &str,
    solid: &Solid,
    keep: f64,
    placements: &[f64],
    axis: &RotationAxis,
    kernel: &dyn Kernel,
) -> Result<Solid> {
    let (origin, dir) = axis.line();
    let extent = kernel.bounding_box(solid).largest_abs_coordinate().max(1.0)
        + origin.coords.norm();
    let frame = axis_frame(origin, dir);
    let segments = wedge_outline(3.0 * extent, 6.0 * extent);
    let wedge = wire_solid_revolve(name, segments, &frame, 360.0 - keep, kernel)?;
    let angles: Vec<f64> = if placements.is_empty() {
        vec![keep]
    } else {
        placements.iter().map(|a| a + keep).collect()
    };
    place(name, wedge, &angles, axis, kernel)
}

/// Rectangle from the axis out to `radius`, centred on the axis along
/// its length.
pub(crate) fn wedge_outline(radius: f64, height: f64) -> Vec<SketchSegment> {
    let pts = [
        Point2::new(0.0, height / 2.0),
        Point2::new(radius, height / 2.0),
        Point2::new(radius, -height / 2.0),
        Point2::new(0.0, -height / 2.0),
    ];
    (0..4)
        .map(|i| SketchSegment::Line {
            start: pts[i],
            end: pts[(i + 1) % 4],
        })
        .collect()
}

/// A frame whose local y runs along `dir` through `origin`. Local x is the
/// first global axis, taken in X, Z, Y order, not parallel to `dir`.
pub(crate) fn axis_frame(origin: Point3, dir: Vec3) -> Frame {
    let y_dir = dir.normalize();
    let seed = [Axis::X, Axis::Z, Axis::Y]
        .into_iter()
        .map(Axis::unit)
        .find(|u| u.cross(&y_dir).norm() > 1e-6)
        .unwrap_or_else(Vec3::x);
    let x_dir = (seed - y_dir * seed.dot(&y_dir)).normalize();
    Frame {
        origin,
        x_dir,
        y_dir,
    }
}
