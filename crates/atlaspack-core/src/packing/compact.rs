//! Compact strategy: binpack first, then settle the shaped sprites of each
//! slice in a small rigid-body simulation so their hulls interlock tighter
//! than their bounding rectangles allow.

use rapier2d::prelude::*;

use crate::error::Result;
use crate::model::{Sheet, Slice, Sprite};

use super::binpack;

const SIMULATION_STEPS: i32 = 1000;
const GRAVITY_FLIP_INTERVAL: i32 = 100;

pub(crate) fn pack_compact(
    sheet: &Sheet,
    base: usize,
    sprites: &mut [Sprite],
    slices: &mut Vec<Slice>,
) -> Result<()> {
    let first_slice = slices.len();
    binpack::pack_binpack(sheet, base, sprites, true, slices)?;

    for slice in &mut slices[first_slice..] {
        let local = slice.sprites.start - base..slice.sprites.end - base;
        compact_sprites(sheet, slice, &mut sprites[local.clone()]);

        let mut max_y = 0;
        for sprite in &sprites[local] {
            max_y = max_y.max(sprite.trimmed_rect.y + sprite.trimmed_rect.h);
        }
        slice.height = max_y + sheet.border_padding;
    }
    Ok(())
}

/// Builds a physics world walled in by the slice bounds, drops every shaped
/// sprite in as a rotation-locked rigid body with its hull as collider, and
/// lets alternating sideways gravity settle them before snapping positions
/// back to integers.
fn compact_sprites(sheet: &Sheet, slice: &Slice, sprites: &mut [Sprite]) {
    let padding = sheet.shape_padding as f32 / 2.0;
    let border = sheet.border_padding as f32 - padding;
    let x0 = border;
    let y0 = border;
    let x1 = slice.width as f32 - border - 0.5;
    let y1 = slice.height as f32 - border - 0.5;

    let mut bodies = RigidBodySet::new();
    let mut colliders = ColliderSet::new();
    for (a, b) in [
        ((x0, y0), (x1, y0)),
        ((x0, y1), (x1, y1)),
        ((x0, y0), (x0, y1)),
        ((x1, y0), (x1, y1)),
    ] {
        colliders.insert(ColliderBuilder::segment(point![a.0, a.1], point![b.0, b.1]).build());
    }

    let mut handles = Vec::new();
    for (i, sprite) in sprites.iter().enumerate() {
        if sprite.vertices.is_empty() {
            continue;
        }
        let points: Vec<rapier2d::math::Point<Real>> = sprite
            .vertices
            .iter()
            .map(|v| point![v.x, v.y])
            .collect();
        let Some(collider) = ColliderBuilder::round_convex_hull(&points, padding) else {
            continue;
        };
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![
                sprite.trimmed_rect.x as f32,
                sprite.trimmed_rect.y as f32
            ])
            .lock_rotations()
            .additional_mass(1.0)
            .build();
        let handle = bodies.insert(body);
        colliders.insert_with_parent(collider.density(0.0).build(), handle, &mut bodies);
        handles.push((i, handle));
    }
    if handles.is_empty() {
        return;
    }

    let integration_parameters = IntegrationParameters {
        dt: 1.0 / 60.0,
        ..Default::default()
    };
    let mut pipeline = PhysicsPipeline::new();
    let mut islands = IslandManager::new();
    let mut broad_phase = DefaultBroadPhase::new();
    let mut narrow_phase = NarrowPhase::new();
    let mut impulse_joints = ImpulseJointSet::new();
    let mut multibody_joints = MultibodyJointSet::new();
    let mut ccd_solver = CCDSolver::new();

    for step in 0..SIMULATION_STEPS {
        // sway gravity sideways periodically so sprites intermix against
        // alternating walls instead of piling in one corner
        let sway = if (step / GRAVITY_FLIP_INTERVAL) % 2 == 1 {
            20.0
        } else {
            -20.0
        };
        let gravity = vector![sway, -100.0];
        pipeline.step(
            &gravity,
            &integration_parameters,
            &mut islands,
            &mut broad_phase,
            &mut narrow_phase,
            &mut bodies,
            &mut colliders,
            &mut impulse_joints,
            &mut multibody_joints,
            &mut ccd_solver,
            None,
            &(),
            &(),
        );
    }

    for (i, handle) in handles {
        let sprite = &mut sprites[i];
        let position = bodies[handle].translation();
        let dx = (position.x + 0.5) as i32 - sprite.trimmed_rect.x;
        let dy = (position.y + 0.5) as i32 - sprite.trimmed_rect.y;
        sprite.trimmed_rect.x += dx;
        sprite.trimmed_rect.y += dy;
    }
}
