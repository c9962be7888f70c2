//! STEP file writer.
//!
//! Every body becomes its own PRODUCT with a shape representation. Solids
//! use `FACETED_BREP_SHAPE_REPRESENTATION`, wires use
//! `GEOMETRICALLY_BOUNDED_WIREFRAME_SHAPE_REPRESENTATION`. Coordinates are
//! shared through a per-body point table so that adjacent faces reference
//! the same `CARTESIAN_POINT`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use paramak_kernel_math::Point3;
use paramak_kernel_mesh::TriangleMesh;

use crate::StepError;

/// Length unit declared in the file's representation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    /// Millimetres; coordinates are written as given.
    #[default]
    Millimetre,
    /// Centimetres; coordinates are scaled by 0.1 before writing.
    Centimetre,
}

impl LengthUnit {
    fn prefix(self) -> &'static str {
        match self {
            LengthUnit::Millimetre => ".MILLI.",
            LengthUnit::Centimetre => ".CENTI.",
        }
    }

    fn scale(self) -> f64 {
        match self {
            LengthUnit::Millimetre => 1.0,
            LengthUnit::Centimetre => 0.1,
        }
    }
}

enum BodyGeometry {
    Solid(TriangleMesh),
    Wire(Vec<Point3>),
}

struct Body {
    name: String,
    geometry: BodyGeometry,
}

/// Accumulates named bodies and serialises them to ISO 10303-21.
pub struct StepWriter {
    unit: LengthUnit,
    bodies: Vec<Body>,
}

/// Running entity table for one file.
struct Entities {
    out: String,
    next: usize,
}

impl Entities {
    fn new() -> Self {
        Self {
            out: String::new(),
            next: 1,
        }
    }

    fn push(&mut self, body: impl AsRef<str>) -> usize {
        let id = self.next;
        self.next += 1;
        let _ = writeln!(self.out, "#{id}={};", body.as_ref());
        id
    }
}

fn refs(ids: &[usize]) -> String {
    let parts: Vec<String> = ids.iter().map(|id| format!("#{id}")).collect();
    format!("({})", parts.join(","))
}

fn real(v: f64) -> String {
    // STEP reals always carry a decimal point; normalise negative zero.
    let v = if v == 0.0 { 0.0 } else { v };
    let s = format!("{v:.9}");
    let s = s.trim_end_matches('0');
    if s.ends_with('.') {
        format!("{s}0")
    } else {
        s.to_string()
    }
}

fn escape(name: &str) -> String {
    name.replace('\'', "''")
}

impl StepWriter {
    /// Create an empty writer using the given length unit.
    pub fn new(unit: LengthUnit) -> Self {
        Self {
            unit,
            bodies: Vec::new(),
        }
    }

    /// Number of bodies added so far.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether no bodies have been added.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Add a closed triangle mesh as a faceted solid.
    pub fn add_solid(&mut self, name: &str, mesh: &TriangleMesh) -> &mut Self {
        self.bodies.push(Body {
            name: name.to_string(),
            geometry: BodyGeometry::Solid(mesh.clone()),
        });
        self
    }

    /// Add an open or closed polyline as a wireframe body.
    pub fn add_wire(&mut self, name: &str, points: &[Point3]) -> &mut Self {
        self.bodies.push(Body {
            name: name.to_string(),
            geometry: BodyGeometry::Wire(points.to_vec()),
        });
        self
    }

    /// Serialise all bodies to a STEP string.
    pub fn write_to_buffer(&self) -> Result<String, StepError> {
        if self.bodies.is_empty() {
            return Err(StepError::Empty);
        }

        let mut e = Entities::new();
        let app_context = e.push("APPLICATION_CONTEXT('automotive design')");
        e.push(format!(
            "APPLICATION_PROTOCOL_DEFINITION('international standard','automotive_design',2000,#{app_context})"
        ));
        let product_context =
            e.push(format!("PRODUCT_CONTEXT('',#{app_context},'mechanical')"));
        let definition_context = e.push(format!(
            "PRODUCT_DEFINITION_CONTEXT('part definition',#{app_context},'design')"
        ));
        let geometric_context = self.push_units(&mut e);

        for body in &self.bodies {
            self.push_body(&mut e, body, product_context, definition_context, geometric_context)?;
        }

        let mut out = String::new();
        out.push_str("ISO-10303-21;\nHEADER;\n");
        out.push_str("FILE_DESCRIPTION(('paramak geometry'),'2;1');\n");
        out.push_str(
            "FILE_NAME('paramak.stp','1970-01-01T00:00:00',(''),(''),'paramak','paramak','');\n",
        );
        out.push_str("FILE_SCHEMA(('AUTOMOTIVE_DESIGN { 1 0 10303 214 1 1 1 1 }'));\n");
        out.push_str("ENDSEC;\nDATA;\n");
        out.push_str(&e.out);
        out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
        Ok(out)
    }

    /// Serialise all bodies and write them to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), StepError> {
        let text = self.write_to_buffer()?;
        std::fs::write(path, text)?;
        Ok(())
    }

    // =========================================================================
    // Entity emission
    // =========================================================================

    fn push_units(&self, e: &mut Entities) -> usize {
        let length = e.push(format!(
            "(LENGTH_UNIT()NAMED_UNIT(*)SI_UNIT({},.METRE.))",
            self.unit.prefix()
        ));
        let angle = e.push("(NAMED_UNIT(*)PLANE_ANGLE_UNIT()SI_UNIT($,.RADIAN.))");
        let solid_angle = e.push("(NAMED_UNIT(*)SI_UNIT($,.STERADIAN.)SOLID_ANGLE_UNIT())");
        let uncertainty = e.push(format!(
            "UNCERTAINTY_MEASURE_WITH_UNIT(LENGTH_MEASURE(1.E-07),#{length},'distance_accuracy_value','confusion accuracy')"
        ));
        e.push(format!(
            "(GEOMETRIC_REPRESENTATION_CONTEXT(3)GLOBAL_UNCERTAINTY_ASSIGNED_CONTEXT((#{uncertainty}))GLOBAL_UNIT_ASSIGNED_CONTEXT((#{length},#{angle},#{solid_angle}))REPRESENTATION_CONTEXT('Context #1','3D Context with UNIT and UNCERTAINTY'))"
        ))
    }

    fn push_point(&self, e: &mut Entities, p: &Point3) -> Result<usize, StepError> {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(StepError::InvalidGeometry(format!(
                "non-finite coordinate ({}, {}, {})",
                p.x, p.y, p.z
            )));
        }
        let s = self.unit.scale();
        Ok(e.push(format!(
            "CARTESIAN_POINT('',({},{},{}))",
            real(p.x * s),
            real(p.y * s),
            real(p.z * s)
        )))
    }

    fn push_body(
        &self,
        e: &mut Entities,
        body: &Body,
        product_context: usize,
        definition_context: usize,
        geometric_context: usize,
    ) -> Result<(), StepError> {
        let name = escape(&body.name);
        let product = e.push(format!(
            "PRODUCT('{name}','{name}','',(#{product_context}))"
        ));
        let formation = e.push(format!(
            "PRODUCT_DEFINITION_FORMATION('','',#{product})"
        ));
        let definition = e.push(format!(
            "PRODUCT_DEFINITION('design','',#{formation},#{definition_context})"
        ));
        let shape = e.push(format!(
            "PRODUCT_DEFINITION_SHAPE('','',#{definition})"
        ));

        let representation = match &body.geometry {
            BodyGeometry::Solid(mesh) => {
                let brep = self.push_brep(e, &body.name, mesh)?;
                e.push(format!(
                    "FACETED_BREP_SHAPE_REPRESENTATION('{name}',(#{brep}),#{geometric_context})"
                ))
            }
            BodyGeometry::Wire(points) => {
                let set = self.push_wire(e, &body.name, points)?;
                e.push(format!(
                    "GEOMETRICALLY_BOUNDED_WIREFRAME_SHAPE_REPRESENTATION('{name}',(#{set}),#{geometric_context})"
                ))
            }
        };
        e.push(format!(
            "SHAPE_DEFINITION_REPRESENTATION(#{shape},#{representation})"
        ));
        Ok(())
    }

    fn push_brep(
        &self,
        e: &mut Entities,
        name: &str,
        mesh: &TriangleMesh,
    ) -> Result<usize, StepError> {
        if mesh.is_empty() {
            return Err(StepError::invalid_topology(name, "solid has no triangles"));
        }

        // Only emit points that are actually referenced, in first-use order.
        let mut point_ids: HashMap<u32, usize> = HashMap::new();
        let mut faces = Vec::with_capacity(mesh.num_triangles());
        for tri in &mesh.triangles {
            let mut loop_ids = [0usize; 3];
            for (slot, &vi) in loop_ids.iter_mut().zip(tri.iter()) {
                *slot = match point_ids.get(&vi) {
                    Some(&id) => id,
                    None => {
                        let id = self.push_point(e, &mesh.positions[vi as usize])?;
                        point_ids.insert(vi, id);
                        id
                    }
                };
            }
            let poly_loop = e.push(format!("POLY_LOOP('',{})", refs(&loop_ids)));
            let bound = e.push(format!("FACE_OUTER_BOUND('',#{poly_loop},.T.)"));
            faces.push(e.push(format!("FACE('',(#{bound}))")));
        }
        let shell = e.push(format!("CLOSED_SHELL('',{})", refs(&faces)));
        Ok(e.push(format!("FACETED_BREP('{}',#{shell})", escape(name))))
    }

    fn push_wire(
        &self,
        e: &mut Entities,
        name: &str,
        points: &[Point3],
    ) -> Result<usize, StepError> {
        if points.len() < 2 {
            return Err(StepError::invalid_topology(
                name,
                "wire needs at least two points",
            ));
        }
        let ids = points
            .iter()
            .map(|p| self.push_point(e, p))
            .collect::<Result<Vec<_>, _>>()?;
        let polyline = e.push(format!("POLYLINE('{}',{})", escape(name), refs(&ids)));
        Ok(e.push(format!("GEOMETRIC_CURVE_SET('',(#{polyline}))")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramak_kernel_mesh::box_mesh;

    fn cube() -> TriangleMesh {
        box_mesh(Point3::origin(), Point3::new(10.0, 20.0, 30.0))
    }

    #[test]
    fn test_empty_writer_errors() {
        let w = StepWriter::new(LengthUnit::Millimetre);
        assert!(matches!(w.write_to_buffer(), Err(StepError::Empty)));
    }

    #[test]
    fn test_solid_structure() {
        let mut w = StepWriter::new(LengthUnit::Millimetre);
        w.add_solid("cube", &cube());
        let text = w.write_to_buffer().unwrap();

        assert!(text.starts_with("ISO-10303-21;"));
        assert!(text.trim_end().ends_with("END-ISO-10303-21;"));
        assert!(text.contains("AUTOMOTIVE_DESIGN"));
        assert!(text.contains("SI_UNIT(.MILLI.,.METRE.)"));
        assert_eq!(text.matches("CLOSED_SHELL(").count(), 1);
        assert_eq!(text.matches("FACE(").count(), 12);
        assert_eq!(text.matches("PRODUCT('cube'").count(), 1);
        // 8 shared corners, no duplicates
        assert_eq!(text.matches("CARTESIAN_POINT(").count(), 8);
    }

    #[test]
    fn test_centimetre_scaling() {
        let mut w = StepWriter::new(LengthUnit::Centimetre);
        w.add_solid("cube", &cube());
        let text = w.write_to_buffer().unwrap();
        assert!(text.contains("SI_UNIT(.CENTI.,.METRE.)"));
        assert!(text.contains("(1.0,2.0,3.0)"));
        assert!(!text.contains("30.0"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let mut w = StepWriter::new(LengthUnit::Millimetre);
        w.add_solid("a", &cube());
        w.add_wire("b", &[Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        assert_eq!(w.write_to_buffer().unwrap(), w.write_to_buffer().unwrap());
    }

    #[test]
    fn test_wire_is_smaller_than_solid() {
        let mesh = cube();
        let outline = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 30.0),
            Point3::new(0.0, 0.0, 30.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let mut solid = StepWriter::new(LengthUnit::Millimetre);
        solid.add_solid("part", &mesh);
        let mut wire = StepWriter::new(LengthUnit::Millimetre);
        wire.add_wire("part", &outline);

        let solid_text = solid.write_to_buffer().unwrap();
        let wire_text = wire.write_to_buffer().unwrap();
        assert!(wire_text.len() < solid_text.len());
        assert!(wire_text.contains("POLYLINE("));
        assert!(!wire_text.contains("CLOSED_SHELL"));
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut w = StepWriter::new(LengthUnit::Millimetre);
        w.add_wire("bad", &[Point3::origin(), Point3::new(f64::NAN, 0.0, 0.0)]);
        assert!(matches!(
            w.write_to_buffer(),
            Err(StepError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_name_quotes_escaped() {
        let mut w = StepWriter::new(LengthUnit::Millimetre);
        w.add_solid("it's", &cube());
        let text = w.write_to_buffer().unwrap();
        assert!(text.contains("PRODUCT('it''s'"));
    }

    #[test]
    fn test_real_formatting() {
        assert_eq!(real(1.0), "1.0");
        assert_eq!(real(-0.0), "0.0");
        assert_eq!(real(2.5), "2.5");
        assert_eq!(real(-3.125), "-3.125");
    }
}
