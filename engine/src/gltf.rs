use {
    animate::SkeletonNode,
    nalgebra as na,
    std::{collections::HashSet, path::Path},
};

#[derive(Debug, thiserror::Error)]
pub enum SkeletonLoadError {
    #[error(transparent)]
    GltfError {
        #[from]
        source: gltf::Error,
    },

    #[error("GLTF with no scenes")]
    NoScenes,

    #[error("GLTF node {index} is its own ancestor")]
    Cycle { index: usize },
}

/// Loads node hierarchy of the default scene.
///
/// Nodes referenced as joints by any skin become bones.
/// Documents without skins treat every node as a bone.
#[tracing::instrument]
pub fn load_skeleton(path: &Path) -> Result<SkeletonNode, SkeletonLoadError> {
    let gltf = gltf::Gltf::open(path)?;
    skeleton_from_document(&gltf)
}

pub fn skeleton_from_slice(
    bytes: &[u8],
) -> Result<SkeletonNode, SkeletonLoadError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    skeleton_from_document(&gltf)
}

fn skeleton_from_document(
    gltf: &gltf::Gltf,
) -> Result<SkeletonNode, SkeletonLoadError> {
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or(SkeletonLoadError::NoScenes)?;

    let joints: HashSet<usize> = gltf
        .skins()
        .flat_map(|skin| skin.joints().map(|joint| joint.index()))
        .collect();

    if joints.is_empty() {
        tracing::debug!("No skins found, every node is a bone");
    }

    let mut visiting = HashSet::new();
    let mut roots = scene
        .nodes()
        .map(|node| load_node(node, &joints, &mut visiting))
        .collect::<Result<Vec<_>, _>>()?;

    if roots.len() == 1 {
        Ok(roots.remove(0))
    } else {
        let name = scene.name().unwrap_or("Scene");
        Ok(roots
            .into_iter()
            .fold(SkeletonNode::group(name), SkeletonNode::with_child))
    }
}

fn load_node(
    node: gltf::Node<'_>,
    joints: &HashSet<usize>,
    visiting: &mut HashSet<usize>,
) -> Result<SkeletonNode, SkeletonLoadError> {
    let index = node.index();
    if !visiting.insert(index) {
        return Err(SkeletonLoadError::Cycle { index });
    }

    let name = match node.name() {
        Some(name) => name.to_owned(),
        None => format!("node{}", index),
    };

    let (t, r, s) = node.transform().decomposed();
    if s.iter().any(|s| (s - 1.0).abs() > 1e-3) {
        tracing::trace!("Scale {:?} of node '{}' is ignored", s, name);
    }

    let [tx, ty, tz] = t;
    let [rx, ry, rz, rw] = r;

    let mut skeleton = if joints.is_empty() || joints.contains(&index) {
        SkeletonNode::bone(name)
    } else {
        SkeletonNode::group(name)
    }
    .with_translation(na::Vector3::new(tx, ty, tz))
    .with_rotation(na::Unit::new_normalize(na::Quaternion::new(
        rw, rx, ry, rz,
    )));

    for child in node.children() {
        skeleton.children.push(load_node(child, joints, visiting)?);
    }

    visiting.remove(&index);
    Ok(skeleton)
}
