use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::animation::data::AnimationData;
use crate::assets::AnimationDataSource;
use crate::assets::bundle::AssetBundle;
use crate::assets::description::{AnimationDataDescription, NodeDescription};
use crate::errors::{LimeError, Result};
use crate::scene::component::AssetBundlePathComponent;
use crate::scene::{NodeHandle, Scene};

/// Extensions probed, in order, when resolving a scene path.
pub const SCENE_EXTENSIONS: [&str; 3] = [".scene", ".t3d", ".tan"];

/// Called with the root of every top-level scene once its external scenes are mounted.
pub type BuiltHandler = Box<dyn Fn(&mut Scene, NodeHandle) + Send + Sync>;

type LoadingKey = (ThreadId, String);

/// Loads scenes from an [`AssetBundle`] and mounts the external scenes they
/// reference through `contents_path`.
///
/// Scene paths are given without extension. Paths that are being loaded are
/// tracked per thread; entering one of them again is a cyclic dependency.
pub struct SceneLoader {
    bundle: Arc<dyn AssetBundle>,
    loading: Mutex<FxHashSet<LoadingKey>>,
    on_built: Option<BuiltHandler>,
}

struct LoadingGuard<'a> {
    loading: &'a Mutex<FxHashSet<LoadingKey>>,
    key: LoadingKey,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading.lock().remove(&self.key);
    }
}

impl SceneLoader {
    pub fn new(bundle: Arc<dyn AssetBundle>) -> Self {
        Self {
            bundle,
            loading: Mutex::new(FxHashSet::default()),
            on_built: None,
        }
    }

    #[must_use]
    pub fn with_on_built(mut self, handler: impl Fn(&mut Scene, NodeHandle) + Send + Sync + 'static) -> Self {
        self.on_built = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn bundle(&self) -> &Arc<dyn AssetBundle> {
        &self.bundle
    }

    /// The existing file for `path` among [`SCENE_EXTENSIONS`], `None` when
    /// there is none.
    pub fn resolve_scene_path(&self, path: &str) -> Result<Option<String>> {
        let candidates: Vec<String> = SCENE_EXTENSIONS
            .iter()
            .map(|ext| format!("{path}{ext}"))
            .filter(|candidate| self.bundle.file_exists(candidate))
            .collect();
        if candidates.len() > 1 {
            return Err(LimeError::AmbiguousScenePath {
                candidates: candidates.join("; "),
            });
        }
        Ok(candidates.into_iter().next())
    }

    /// Loads a scene as a detached subtree and returns its root.
    pub fn load(&self, scene: &mut Scene, path: &str) -> Result<NodeHandle> {
        self.load_scene(scene, path, false)
    }

    fn load_scene(&self, scene: &mut Scene, path: &str, external: bool) -> Result<NodeHandle> {
        let has_extension = SCENE_EXTENSIONS
            .iter()
            .any(|ext| path.to_ascii_lowercase().ends_with(ext));
        let full_path = if has_extension && self.bundle.file_exists(path) {
            path.to_string()
        } else {
            self.resolve_scene_path(path)?
                .ok_or_else(|| LimeError::SceneNotFound {
                    path: path.to_string(),
                    candidates: SCENE_EXTENSIONS
                        .iter()
                        .map(|ext| format!("{path}{ext}"))
                        .collect::<Vec<_>>()
                        .join(", "),
                })?
        };

        let key = (thread::current().id(), full_path.clone());
        if !self.loading.lock().insert(key.clone()) {
            return Err(LimeError::CyclicDependency { path: full_path });
        }
        let _guard = LoadingGuard {
            loading: &self.loading,
            key,
        };

        log::debug!("Loading scene '{full_path}'");
        let data = self.bundle.read_file(&full_path)?;
        let description = NodeDescription::from_json_slice(&data)?;
        let root = scene.instantiate(&description)?;
        if let Err(err) = self.load_external_scenes(scene, root, !external) {
            scene.dispose(root);
            return Err(err);
        }
        if let Some(n) = scene.get_node_mut(root) {
            n.components_mut().add(AssetBundlePathComponent::new(full_path));
        }
        Ok(root)
    }

    /// Replaces the content of every node below `node` (included) that has a
    /// resolvable `contents_path` with the scene it names. Nodes with a
    /// contents path are not searched further.
    pub fn load_external_scenes(&self, scene: &mut Scene, node: NodeHandle, is_external_root: bool) -> Result<()> {
        let contents_path = scene
            .node_ref(node)?
            .contents_path()
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        match contents_path {
            None => {
                let children: Vec<NodeHandle> = scene.children(node).collect();
                for child in children {
                    self.load_external_scenes(scene, child, false)?;
                }
            }
            Some(path) => {
                if self.resolve_scene_path(&path)?.is_some() {
                    let content = self.load_scene(scene, &path, true)?;
                    if let Err(err) = scene.replace_content(node, content) {
                        scene.dispose(content);
                        return Err(err);
                    }
                } else {
                    log::warn!("External scene '{path}' of {} not found", scene.describe(node));
                }
            }
        }
        if is_external_root && let Some(handler) = &self.on_built {
            handler(scene, node);
        }
        Ok(())
    }
}

impl AnimationDataSource for SceneLoader {
    fn load_animation_data(&self, contents_path: &str) -> Result<AnimationData> {
        let path = AnimationData::bundle_path(contents_path);
        let data = self.bundle.read_file(&path)?;
        let description: AnimationDataDescription = serde_json::from_slice(&data)?;
        description.to_data()
    }
}
