//! End-to-end checks on whole shapes and reactors.

use std::f64::consts::PI;
use std::path::PathBuf;

use approx::assert_relative_eq;
use paramak::{
    BallReactor, BallReactorBuild, BuildReactor, CenterColumnShield, ExtrudeShape, JsonDagmcBackend, Layer,
    ParametricReactor, ParametricShape, Plasma, PlasmaParameters, RotateShape, SingleNullBallReactor,
    StpExportOptions,
};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("paramak-it-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn square() -> Vec<(f64, f64)> {
    vec![(0.0, 0.0), (0.0, 20.0), (20.0, 20.0), (20.0, 0.0)]
}

#[test]
fn rotated_and_extruded_primitives() {
    let rotated = RotateShape::straight(&square()).unwrap();
    assert_relative_eq!(rotated.volume().unwrap(), PI * 400.0 * 20.0, max_relative = 0.01);

    let extruded = ExtrudeShape::straight(&square(), 30.0).unwrap();
    assert_relative_eq!(extruded.volume().unwrap(), 12000.0, epsilon = 1e-6);

    let disc = ExtrudeShape::circle((30.0, 0.0), 10.0, 20.0).unwrap();
    assert_relative_eq!(disc.volume().unwrap(), PI * 100.0 * 20.0, max_relative = 0.01);
}

#[test]
fn center_column_cylinder_halves_with_rotation() {
    let full = CenterColumnShield::cylinder(15.0, 5.0, 10.0).unwrap();
    let v = full.volume().unwrap();
    assert_relative_eq!(v, PI * (100.0 - 25.0) * 15.0, max_relative = 0.01);

    let half = CenterColumnShield::cylinder(15.0, 5.0, 10.0)
        .unwrap()
        .with_rotation_angle(180.0)
        .unwrap();
    assert_relative_eq!(half.volume().unwrap(), v / 2.0, max_relative = 0.01);
}

#[test]
fn plasma_landmarks() {
    let plasma = Plasma::from_parameters(PlasmaParameters {
        major_radius: 620.0,
        minor_radius: 210.0,
        triangularity: 0.33,
        elongation: 1.85,
        ..PlasmaParameters::default()
    })
    .unwrap();
    assert_relative_eq!(plasma.inner_equatorial_point().0, 410.0, epsilon = 1e-9);
    assert_relative_eq!(plasma.outer_equatorial_point().0, 830.0, epsilon = 1e-9);
    assert_relative_eq!(plasma.high_point().1, 388.5, epsilon = 1e-9);
}

fn minimal_ball_build() -> Vec<Layer> {
    vec![
        Layer::gap(50.0),
        Layer::solid(200.0),
        Layer::solid(50.0),
        Layer::gap(50.0),
        Layer::plasma(100.0),
        Layer::gap(50.0),
        Layer::solid(50.0),
        Layer::solid(100.0),
        Layer::solid(50.0),
    ]
}

#[test]
fn minimal_ball_reactor() {
    let build = BallReactorBuild {
        rotation_angle: 180.0,
        ..BallReactorBuild::default()
    }
    .with_radial_build(&minimal_ball_build())
    .unwrap();
    let reactor = BallReactor::new(build).unwrap();

    // Cumulative thickness up to the plasma centre.
    assert_relative_eq!(reactor.major_radius(), 400.0);
    assert_relative_eq!(reactor.minor_radius(), 50.0);

    let names = reactor.names().unwrap();
    assert_eq!(
        names,
        [
            "plasma",
            "inboard_tf_coils",
            "center_column_shield",
            "divertor",
            "firstwall",
            "blanket",
            "blanket_rear_wall"
        ]
    );
    for shape in reactor.shapes_and_components().unwrap().iter() {
        assert!(shape.solid().unwrap().volume() > 0.0, "{} is empty", shape.name());
    }
    assert!(reactor.make_sector_wedge().unwrap().is_some());
}

#[test]
fn ball_reactor_exports() {
    let dir = scratch("ball");
    let reactor = BallReactor::new(BallReactorBuild {
        rotation_angle: 90.0,
        ..BallReactorBuild::default()
    })
    .unwrap();

    let files = reactor
        .export_stp(
            &dir,
            &StpExportOptions {
                include_graveyard: true,
                ..StpExportOptions::default()
            },
        )
        .unwrap();
    assert_eq!(files.len(), 8);
    assert!(files.iter().all(|f| f.exists()));

    let manifest = dir.join("manifest.json");
    reactor.export_neutronics_description(&manifest, false, true).unwrap();
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&manifest).unwrap()).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 7);
    assert_eq!(entries.last().unwrap()["material"], "graveyard");

    let h5m = reactor
        .export_dagmc_h5m(&dir.join("dagmc.h5m"), &JsonDagmcBackend, &Default::default())
        .unwrap();
    assert!(h5m.exists());
}

#[test]
fn single_null_reactor_builds() {
    let reactor = SingleNullBallReactor::new(BallReactorBuild {
        rotation_angle: 180.0,
        ..BallReactorBuild::default()
    })
    .unwrap();
    for shape in reactor.shapes_and_components().unwrap().iter() {
        assert!(shape.solid().unwrap().volume() > 0.0, "{} is empty", shape.name());
    }
}

#[test]
fn generic_build_reactor() {
    let reactor = BuildReactor::new(vec![
        Layer::gap(100.0),
        Layer::solid(50.0).named("column"),
        Layer::gap(20.0),
        Layer::plasma(300.0),
        Layer::gap(20.0),
        Layer::solid(40.0).named("firstwall"),
    ])
    .unwrap()
    .with_rotation_angle(180.0)
    .unwrap();
    assert_eq!(reactor.names().unwrap(), ["column", "plasma", "firstwall"]);
    assert!(reactor.solid().unwrap().volume() > 0.0);
}
