use bevy::{
    pbr::DirectionalLightShadowMap,
    prelude::*,
    render::view::Msaa,
};
use bevy_adaptive_quality::{
    AdaptiveQualityPlugin, AntialiasingMode, PerfEvent, PerformanceMonitor, QualityCommand,
    QualityPreset, QualityTier,
};

/// A small 3D scene that follows the adaptive quality ladder.
///
/// Keys: 1-5 force a tier, A re-enables automatic adjustment, M turns it off
/// and returns to the starting tier, Space spawns a batch of extra cubes to
/// push the frame rate down.
fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(AdaptiveQualityPlugin::default())
        .add_systems(Startup, (setup_scene, apply_initial_quality).chain())
        .add_systems(Update, (handle_input, spawn_load, spin, apply_quality_changes))
        .run();
}

#[derive(Component)]
struct Spinner;

#[derive(Component)]
struct SceneCamera;

#[derive(Component)]
struct SceneLight;

#[derive(Resource)]
struct CubeAssets {
    mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let assets = CubeAssets {
        mesh: meshes.add(Cuboid::new(0.5, 0.5, 0.5)),
        material: materials.add(Color::srgb(0.8, 0.55, 0.3)),
    };

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(30.0, 30.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.35, 0.3))),
    ));

    for x in -3..=3 {
        for z in -3..=3 {
            spawn_cube(&mut commands, &assets, Vec3::new(x as f32, 0.5, z as f32));
        }
    }
    commands.insert_resource(assets);

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
        SceneLight,
    ));

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-6.0, 6.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
        SceneCamera,
    ));
}

fn spawn_cube(commands: &mut Commands, assets: &CubeAssets, position: Vec3) {
    commands.spawn((
        Mesh3d(assets.mesh.clone()),
        MeshMaterial3d(assets.material.clone()),
        Transform::from_translation(position),
        Spinner,
    ));
}

fn apply_initial_quality(
    monitor: Res<PerformanceMonitor>,
    mut commands: Commands,
    cameras: Query<Entity, With<SceneCamera>>,
    mut lights: Query<&mut DirectionalLight, With<SceneLight>>,
) {
    apply_preset(&monitor.settings(), &mut commands, &cameras, &mut lights);
}

fn apply_quality_changes(
    mut events: EventReader<PerfEvent>,
    mut commands: Commands,
    cameras: Query<Entity, With<SceneCamera>>,
    mut lights: Query<&mut DirectionalLight, With<SceneLight>>,
) {
    for event in events.read() {
        match event {
            PerfEvent::QualityChanged(change) => {
                info!("{} -> {} ({:?})", change.from.label(), change.to.label(), change.reason);
                apply_preset(&change.settings, &mut commands, &cameras, &mut lights);
            }
            PerfEvent::PerformanceCritical { average_fps } => {
                warn!("frame rate critical: {average_fps:.1} fps");
            }
            _ => {}
        }
    }
}

fn apply_preset(
    preset: &QualityPreset,
    commands: &mut Commands,
    cameras: &Query<Entity, With<SceneCamera>>,
    lights: &mut Query<&mut DirectionalLight, With<SceneLight>>,
) {
    let msaa = match preset.antialiasing {
        AntialiasingMode::Msaa => Msaa::Sample4,
        AntialiasingMode::Fxaa | AntialiasingMode::None => Msaa::Off,
    };
    for camera in cameras.iter() {
        commands.entity(camera).insert(msaa);
    }
    for mut light in lights.iter_mut() {
        light.shadows_enabled = preset.shadows;
    }
    commands.insert_resource(DirectionalLightShadowMap {
        size: preset.shadow_map_size as usize,
    });
}

fn handle_input(keys: Res<ButtonInput<KeyCode>>, mut commands: EventWriter<QualityCommand>) {
    let tiers = [
        (KeyCode::Digit1, QualityTier::Ultra),
        (KeyCode::Digit2, QualityTier::High),
        (KeyCode::Digit3, QualityTier::Medium),
        (KeyCode::Digit4, QualityTier::Low),
        (KeyCode::Digit5, QualityTier::Minimal),
    ];
    for (key, tier) in tiers {
        if keys.just_pressed(key) {
            commands.write(QualityCommand::Force(tier));
        }
    }
    if keys.just_pressed(KeyCode::KeyA) {
        commands.write(QualityCommand::SetAdaptive(true));
    }
    if keys.just_pressed(KeyCode::KeyM) {
        commands.write(QualityCommand::SetAdaptive(false));
    }
}

fn spawn_load(keys: Res<ButtonInput<KeyCode>>, assets: Res<CubeAssets>, mut commands: Commands) {
    if !keys.just_pressed(KeyCode::Space) {
        return;
    }
    for i in 0..2_000 {
        let angle = i as f32 * 0.37;
        let radius = 2.0 + (i % 50) as f32 * 0.2;
        let height = 1.0 + (i / 50) as f32 * 0.3;
        let position = Vec3::new(angle.cos() * radius, height, angle.sin() * radius);
        spawn_cube(&mut commands, &assets, position);
    }
}

fn spin(time: Res<Time>, mut spinners: Query<&mut Transform, With<Spinner>>) {
    for mut transform in spinners.iter_mut() {
        transform.rotate_y(time.delta_secs());
    }
}
