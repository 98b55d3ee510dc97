use {
    crate::scene::{Global3, Local3},
    animate::{BoneId, Pose, SkeletonGraph},
    hecs::{Entity, World},
    nalgebra as na,
};

#[derive(Debug, thiserror::Error)]
pub enum RigError {
    #[error("Entity {entity:?} of bone {bone:?} is missing `Local3`")]
    MissingBone { bone: BoneId, entity: Entity },

    #[error("Pose has {actual} bones while rig has {expected}")]
    PoseMismatch { expected: usize, actual: usize },
}

/// Marks entity spawned for a skeleton bone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bone {
    pub id: BoneId,
}

#[derive(Clone, Copy, Debug)]
struct RestPart {
    id: BoneId,
    offset: na::Isometry3<f32>,
    translation: na::Translation3<f32>,
}

/// Skeleton instantiated as scene entities.
#[derive(Debug)]
pub struct Rig {
    root: Entity,
    bones: Box<[Entity]>,
    rest: Box<[RestPart]>,
}

impl Rig {
    /// Spawns root entity at `iso` and one entity per bone in rest pose.
    pub fn spawn(
        graph: &SkeletonGraph,
        iso: na::Isometry3<f32>,
        world: &mut World,
    ) -> Self {
        let root = world.spawn((Global3::from_iso(iso),));

        let mut bones = Vec::with_capacity(graph.len());
        let mut rest = Vec::with_capacity(graph.len());

        for id in graph.ids() {
            let node = graph.bone(id);

            // Parents precede children in the graph.
            let parent = match node.parent {
                Some(parent) => bones[parent.index()],
                None => root,
            };

            let entity = world.spawn((
                Local3::from_iso(parent, node.rest_isometry()),
                Global3::identity(),
                Bone { id },
            ));

            bones.push(entity);
            rest.push(RestPart {
                id,
                offset: node.offset,
                translation: node.rest_translation.into(),
            });
        }

        tracing::debug!("Rig with {} bones spawned", bones.len());

        Rig {
            root,
            bones: bones.into(),
            rest: rest.into(),
        }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone_entity(&self, bone: BoneId) -> Option<Entity> {
        self.bones.get(bone.index()).copied()
    }

    /// Overwrites local rotation of every bone entity with the pose.
    ///
    /// Nothing is written when any bone entity lost its `Local3`.
    pub fn sync(&self, pose: &Pose, world: &mut World) -> Result<(), RigError> {
        if pose.len() != self.bones.len() {
            return Err(RigError::PoseMismatch {
                expected: self.bones.len(),
                actual: pose.len(),
            });
        }

        // Either every bone is posed or none is.
        let missing = self
            .bones
            .iter()
            .zip(self.rest.iter())
            .find(|(entity, _)| world.get::<Local3>(**entity).is_err());

        if let Some((&entity, rest)) = missing {
            return Err(RigError::MissingBone {
                bone: rest.id,
                entity,
            });
        }

        for (&entity, rest) in self.bones.iter().zip(self.rest.iter()) {
            let mut local = world.get_mut::<Local3>(entity).map_err(|_| {
                RigError::MissingBone {
                    bone: rest.id,
                    entity,
                }
            })?;

            local.iso = rest.offset
                * na::Isometry3::from_parts(
                    rest.translation,
                    pose.local_rotation(rest.id),
                );
        }

        Ok(())
    }

    /// Despawns bone entities and the root.
    pub fn despawn(self, world: &mut World) {
        for &entity in self.bones.iter() {
            let _ = world.despawn(entity);
        }
        let _ = world.despawn(self.root);
    }
}
