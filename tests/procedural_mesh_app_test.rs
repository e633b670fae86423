use bevy::prelude::*;
use space_core::{Backdrop, ProceduralMeshPlugin, Prominence, QuadBatchSpec, RingBatchSpec};

fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.init_resource::<Assets<Mesh>>();
    app.add_plugins(ProceduralMeshPlugin);
    app
}

fn vertex_count(app: &App, entity: Entity) -> usize {
    let handle = &app.world().get::<Mesh3d>(entity).unwrap().0;
    let meshes = app.world().resource::<Assets<Mesh>>();
    meshes.get(handle).unwrap().count_vertices()
}

#[test]
fn test_backdrop_mesh_is_built_and_rebuilt() {
    let mut app = test_app();
    let spec = QuadBatchSpec {
        count: 25,
        ..QuadBatchSpec::starfield(9)
    };
    let entity = app.world_mut().spawn(Backdrop::new(spec)).id();
    app.update();
    assert_eq!(vertex_count(&app, entity), 100);

    app.world_mut()
        .get_mut::<Backdrop>(entity)
        .unwrap()
        .spec
        .count = 10;
    app.update();
    assert_eq!(vertex_count(&app, entity), 40);
}

#[test]
fn test_invalid_backdrop_gets_no_mesh() {
    let mut app = test_app();
    let spec = QuadBatchSpec {
        size_min: 2.0,
        size_max: 1.0,
        ..default()
    };
    let entity = app.world_mut().spawn(Backdrop::new(spec)).id();
    app.update();
    assert!(app.world().get::<Mesh3d>(entity).is_none());
}

#[test]
fn test_prominence_mesh() {
    let mut app = test_app();
    let spec = RingBatchSpec {
        plane_count: 3,
        plane_detail: 8,
        ..default()
    };
    let entity = app.world_mut().spawn(Prominence::new(spec)).id();
    app.update();
    assert_eq!(vertex_count(&app, entity), 3 * 9 * 2);
}
