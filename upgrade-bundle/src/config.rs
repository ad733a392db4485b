//! Typed configuration for one bundle build

use std::path::{Path, PathBuf};

use crate::layout::{Component, FlashSize};

/// Everything needed to produce a bundle
///
/// Built either from the command line (see [`crate::cli::Args::to_config`])
/// or programmatically through the fluent setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleConfig {
    pub boot: Option<PathBuf>,
    pub kernel: Option<PathBuf>,
    pub rootfs: Option<PathBuf>,
    pub output: PathBuf,
    /// CMA allocator parameters, appended verbatim to the kernel cmdline
    pub cma: Option<String>,
    /// Add `init=/init` to the kernel cmdline
    pub init: bool,
    /// Pack kernel and rootfs back-to-back instead of at fixed offsets
    pub pack: bool,
    pub flash: FlashSize,
}

impl BundleConfig {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            boot: None,
            kernel: None,
            rootfs: None,
            output: output.into(),
            cma: None,
            init: false,
            pack: false,
            flash: FlashSize::default(),
        }
    }

    pub fn boot(mut self, path: impl Into<PathBuf>) -> Self {
        self.boot = Some(path.into());
        self
    }

    pub fn kernel(mut self, path: impl Into<PathBuf>) -> Self {
        self.kernel = Some(path.into());
        self
    }

    pub fn rootfs(mut self, path: impl Into<PathBuf>) -> Self {
        self.rootfs = Some(path.into());
        self
    }

    /// Set the CMA parameter string. An empty string counts as not supplied.
    pub fn cma(mut self, cma: impl Into<String>) -> Self {
        let cma = cma.into();
        self.cma = (!cma.is_empty()).then_some(cma);
        self
    }

    pub fn init(mut self, init: bool) -> Self {
        self.init = init;
        self
    }

    pub fn pack(mut self, pack: bool) -> Self {
        self.pack = pack;
        self
    }

    pub fn flash(mut self, flash: FlashSize) -> Self {
        self.flash = flash;
        self
    }

    /// Input path configured for `component`, if any
    pub fn component_path(&self, component: Component) -> Option<&Path> {
        match component {
            Component::Boot => self.boot.as_deref(),
            Component::Kernel => self.kernel.as_deref(),
            Component::Rootfs => self.rootfs.as_deref(),
        }
    }

    /// Configured components paired with their inputs, in packing order
    pub fn components(&self) -> impl Iterator<Item = (Component, &Path)> {
        Component::ALL
            .into_iter()
            .filter_map(|c| self.component_path(c).map(|p| (c, p)))
    }
}
