use bevy::prelude::*;
use space_core::{
    load_scene_config, Backdrop, FloatingOriginCamera, PingPongTween, Prominence,
    QuadBatchSpec, RingBatchSpec, SpaceCorePlugin, SpaceSceneConfig, Well, WellDistribution,
    WellId, WellRegistry,
};

/// Well whose strength pulses back and forth.
#[derive(Resource)]
struct PulsingWell {
    id: WellId,
    tween: PingPongTween,
}

fn main() {
    let scene = match std::env::args().nth(1) {
        Some(path) => match load_scene_config(&path) {
            Ok(scene) => scene,
            Err(e) => {
                eprintln!("Failed to load scene {}: {}, using the default scene", path, e);
                default_scene()
            }
        },
        None => default_scene(),
    };

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(bevy::log::LogPlugin {
        filter: "wgpu=error,bevy_render=warn,space_core=debug".into(),
        level: bevy::log::Level::INFO,
        ..default()
    }))
    .add_plugins(SpaceCorePlugin)
    .insert_resource(ClearColor(Color::srgb(0.0, 0.0, 0.02)))
    .add_systems(Startup, setup)
    .add_systems(Update, (attach_additive_material, pulse_well));

    let ids = scene.apply(app.world_mut());
    if let Some(&id) = ids.first() {
        app.insert_resource(PulsingWell {
            id,
            tween: PingPongTween::new(2.0),
        });
    }

    app.run();
}

fn default_scene() -> SpaceSceneConfig {
    let mut scene = SpaceSceneConfig {
        backdrop: Some(QuadBatchSpec::galactic_band(42)),
        prominences: vec![RingBatchSpec {
            seed: 7,
            radius_min: 4.0,
            radius_max: 6.0,
            ..default()
        }],
        ..default()
    };
    scene.wells = vec![
        Well::new("Sun", WellDistribution::Gaussian)
            .with_radius(8.0)
            .into(),
        Well::new(
            "Wake",
            WellDistribution::Ripple {
                frequency: 4.0,
                offset: 0.0,
            },
        )
        .at(Vec3::new(15.0, 0.0, 0.0))
        .with_radius(5.0)
        .into(),
        Well::new(
            "Vortex",
            WellDistribution::Twist {
                frequency: 1.5,
                hole_size: 0.2,
                hole_power: 2.0,
                offset: 0.0,
            },
        )
        .at(Vec3::new(-15.0, 0.0, 5.0))
        .with_radius(6.0)
        .into(),
    ];
    scene
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        FloatingOriginCamera,
        Transform::from_xyz(0.0, 12.0, 40.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    info!("Space graphics demo started");
}

/// Backdrops and prominences are unlit and blend additively.
fn attach_additive_material(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    query: Query<
        Entity,
        (
            Or<(Added<Backdrop>, Added<Prominence>)>,
            Without<MeshMaterial3d<StandardMaterial>>,
        ),
    >,
) {
    for entity in &query {
        let material = materials.add(StandardMaterial {
            base_color: Color::WHITE,
            unlit: true,
            alpha_mode: AlphaMode::Add,
            cull_mode: None,
            ..default()
        });
        commands.entity(entity).insert(MeshMaterial3d(material));
    }
}

fn pulse_well(
    time: Res<Time>,
    pulsing: Option<ResMut<PulsingWell>>,
    mut registry: ResMut<WellRegistry>,
) {
    let Some(mut pulsing) = pulsing else {
        return;
    };
    let id = pulsing.id;
    pulsing.tween.advance(time.delta_secs());
    let strength = pulsing.tween.lerp(0.5, 2.0);
    if let Some(well) = registry.get_mut(id) {
        well.strength = strength;
    }
}
