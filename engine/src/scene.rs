use {
    hecs::{Entity, World},
    nalgebra as na,
    std::collections::{HashMap, HashSet},
};

/// Transform relative to parent entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Local3 {
    pub parent: Entity,
    pub iso: na::Isometry3<f32>,
    pub scale: na::Vector3<f32>,
}

impl Local3 {
    pub fn identity(parent: Entity) -> Self {
        Local3::from_iso(parent, na::Isometry3::identity())
    }

    pub fn from_iso(parent: Entity, iso: na::Isometry3<f32>) -> Self {
        Local3 {
            parent,
            iso,
            scale: na::Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// World transform.
///
/// Entities with `Global3` and no `Local3` are hierarchy roots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Global3 {
    pub iso: na::Isometry3<f32>,
    pub skew: na::Matrix3<f32>,
}

impl Global3 {
    pub fn identity() -> Self {
        Global3::from_iso(na::Isometry3::identity())
    }

    pub fn from_iso(iso: na::Isometry3<f32>) -> Self {
        Global3 {
            iso,
            skew: na::Matrix3::identity(),
        }
    }

    pub fn append_iso_scale(
        &self,
        iso: &na::Isometry3<f32>,
        scale: &na::Vector3<f32>,
    ) -> Self {
        let total = self.to_homogeneous()
            * iso.to_homogeneous()
            * na::Matrix4::new_nonuniform_scaling(scale);
        let rotation = self.iso.rotation * iso.rotation;
        let inv_rotation = rotation.inverse().to_rotation_matrix();
        let translation = total.column(3).xyz();
        let rotskew = total.remove_column(3).remove_row(3);
        let skew = inv_rotation * rotskew;

        Global3 {
            iso: na::Isometry3 {
                translation: na::Translation3 {
                    vector: translation,
                },
                rotation,
            },
            skew,
        }
    }

    pub fn append_local(&self, local: &Local3) -> Self {
        self.append_iso_scale(&local.iso, &local.scale)
    }

    pub fn to_homogeneous(&self) -> na::Matrix4<f32> {
        self.iso.to_homogeneous() * self.skew.to_homogeneous()
    }

    pub fn translation(&self) -> na::Vector3<f32> {
        self.iso.translation.vector
    }
}

/// Recomputes `Global3` of every entity with `Local3`, parents first.
///
/// Entities whose parent is gone, is not part of the hierarchy
/// or loops back to them are despawned.
/// Returns number of despawned entities.
pub fn update_globals(world: &mut World) -> usize {
    let mut resolved = HashMap::new();
    let mut visiting = HashSet::new();

    let entities: Vec<Entity> = world
        .query::<&Local3>()
        .with::<Global3>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    for &entity in &entities {
        resolve(entity, world, &mut resolved, &mut visiting);
    }

    let mut despawn = Vec::new();
    for entity in entities {
        match resolved.get(&entity).copied().flatten() {
            Some(global) => {
                if let Ok(mut slot) = world.get_mut::<Global3>(entity) {
                    *slot = global;
                }
            }
            None => despawn.push(entity),
        }
    }

    for &entity in &despawn {
        let _ = world.despawn(entity);
    }

    despawn.len()
}

fn resolve(
    entity: Entity,
    world: &World,
    resolved: &mut HashMap<Entity, Option<Global3>>,
    visiting: &mut HashSet<Entity>,
) -> Option<Global3> {
    if let Some(global) = resolved.get(&entity) {
        return *global;
    }

    let local = match world.get::<Local3>(entity) {
        Ok(local) => *local,
        Err(_) => {
            // Root or missing entity.
            let global = world.get::<Global3>(entity).ok().map(|g| *g);
            resolved.insert(entity, global);
            return global;
        }
    };

    if !visiting.insert(entity) {
        tracing::warn!(
            "Entity {:?} is its own ancestor and shall be despawned",
            entity
        );
        return None;
    }

    let global = resolve(local.parent, world, resolved, visiting)
        .map(|parent| parent.append_local(&local));

    if global.is_none() {
        tracing::warn!(
            "Entity's ({:?}) parent is not in scene and shall be despawned",
            entity
        );
    }

    visiting.remove(&entity);
    resolved.insert(entity, global);
    global
}

#[cfg(test)]
mod tests {
    use {super::*, std::f32::consts::FRAC_PI_2};

    const EPS: f32 = 1e-5;

    fn offset(x: f32, y: f32, z: f32) -> na::Isometry3<f32> {
        na::Isometry3::translation(x, y, z)
    }

    #[test]
    fn globals_follow_hierarchy() {
        let mut world = World::new();
        let root = world.spawn((Global3::from_iso(offset(0.0, 0.0, 5.0)),));

        let turn = na::Isometry3::from_parts(
            na::Translation3::new(0.0, 1.0, 0.0),
            na::UnitQuaternion::from_axis_angle(
                &na::Vector3::z_axis(),
                FRAC_PI_2,
            ),
        );
        let arm =
            world.spawn((Local3::from_iso(root, turn), Global3::identity()));
        let hand = world.spawn((
            Local3::from_iso(arm, offset(0.0, 2.0, 0.0)),
            Global3::identity(),
        ));

        assert_eq!(update_globals(&mut world), 0);

        let arm = *world.get::<Global3>(arm).unwrap();
        assert!(
            (arm.translation() - na::Vector3::new(0.0, 1.0, 5.0)).norm() < EPS
        );

        let hand = *world.get::<Global3>(hand).unwrap();
        assert!(
            (hand.translation() - na::Vector3::new(-2.0, 1.0, 5.0)).norm() < EPS
        );
    }

    #[test]
    fn orphans_are_despawned() {
        let mut world = World::new();
        let root = world.spawn((Global3::identity(),));
        let child = world.spawn((Local3::identity(root), Global3::identity()));
        let grandchild =
            world.spawn((Local3::identity(child), Global3::identity()));

        let detached = world.spawn((0u32,));
        let stray =
            world.spawn((Local3::identity(detached), Global3::identity()));

        world.despawn(root).unwrap();

        assert_eq!(update_globals(&mut world), 3);
        assert!(world.entity(child).is_err());
        assert!(world.entity(grandchild).is_err());
        assert!(world.entity(stray).is_err());
        assert!(world.entity(detached).is_ok());
    }

    #[test]
    fn cycles_are_despawned() {
        let mut world = World::new();
        let placeholder = world.spawn((Global3::identity(),));
        let a =
            world.spawn((Local3::identity(placeholder), Global3::identity()));
        let b = world.spawn((Local3::identity(a), Global3::identity()));
        world.get_mut::<Local3>(a).unwrap().parent = b;

        assert_eq!(update_globals(&mut world), 2);
        assert!(world.entity(a).is_err());
        assert!(world.entity(b).is_err());
        assert!(world.entity(placeholder).is_ok());
    }
}
