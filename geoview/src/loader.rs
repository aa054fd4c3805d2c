//! Loading layers off the UI thread.

use std::path::{Path, PathBuf};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::GeoviewError;
use crate::layer::{layer_name, Layer, LayerKind};
use crate::source::SourceConfig;

/// Runs blocking layer loads on the blocking thread pool of a tokio runtime.
///
/// The loaded layer is returned through a [`LoadHandle`] and must be registered by the owner of
/// the map with [`Map::add_loaded_layer`](crate::Map::add_loaded_layer).
#[derive(Debug, Clone)]
pub struct LayerLoader {
    runtime: Handle,
    config: SourceConfig,
}

impl LayerLoader {
    /// Creates a loader that uses the given runtime.
    pub fn new(runtime: Handle, config: SourceConfig) -> Self {
        Self { runtime, config }
    }

    /// Creates a loader that uses the runtime of the current thread. Returns `None` when called
    /// outside of a tokio runtime.
    pub fn current(config: SourceConfig) -> Option<Self> {
        Handle::try_current()
            .ok()
            .map(|runtime| Self::new(runtime, config))
    }

    /// Configuration used to open the files.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Starts loading the file. The layer is named after the file name without extension.
    pub fn load(&self, path: impl Into<PathBuf>, kind: LayerKind) -> LoadHandle {
        let path = path.into();
        let name = layer_name(&path);
        let config = self.config.clone();

        let task = {
            let (name, path) = (name.clone(), path.clone());
            self.runtime.spawn_blocking(move || {
                log::debug!("Background load of '{name}' started");
                Layer::open(name, path, kind, &config)
            })
        };

        LoadHandle { name, path, task }
    }
}

/// Pending layer load started by a [`LayerLoader`].
#[derive(Debug)]
pub struct LoadHandle {
    name: String,
    path: PathBuf,
    task: JoinHandle<Result<Layer, GeoviewError>>,
}

impl LoadHandle {
    /// Name the layer will have.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File being loaded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the load is done and [`LoadHandle::wait`] will not block.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the load to complete.
    pub async fn wait(self) -> Result<Layer, GeoviewError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(GeoviewError::load(&self.path, err)),
        }
    }
}
