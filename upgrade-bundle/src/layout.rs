//! Flash geometries and the partition capacities they reserve

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BundleError, Result};

/// Firmware components a bundle can carry, in flashing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// U-Boot image
    Boot,
    /// Kernel image
    Kernel,
    /// Root filesystem image
    Rootfs,
}

impl Component {
    /// All components in the order they are packed
    pub const ALL: [Component; 3] = [Self::Boot, Self::Kernel, Self::Rootfs];

    pub fn name(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Kernel => "kernel",
            Self::Rootfs => "rootfs",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Fixed partition capacities of one flash geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionLayout {
    pub boot: u64,
    pub kernel: u64,
    pub rootfs: u64,
}

impl PartitionLayout {
    /// Capacity in bytes of the partition holding `component`
    pub fn capacity(&self, component: Component) -> u64 {
        match component {
            Component::Boot => self.boot,
            Component::Kernel => self.kernel,
            Component::Rootfs => self.rootfs,
        }
    }
}

pub const LAYOUT_8MB: PartitionLayout = PartitionLayout {
    boot: 0x40000,
    kernel: 0x200000,
    rootfs: 0x500000,
};

pub const LAYOUT_16MB: PartitionLayout = PartitionLayout {
    boot: 0x40000,
    kernel: 0x300000,
    rootfs: 0xA00000,
};

/// Supported flash chip sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlashSize {
    #[default]
    Mb8,
    Mb16,
}

impl FlashSize {
    /// Parse an optional selector; absent means the 8MB default.
    pub fn from_selector(selector: Option<&str>) -> Result<Self> {
        selector.map_or(Ok(Self::default()), str::parse)
    }

    pub fn layout(self) -> PartitionLayout {
        match self {
            Self::Mb8 => LAYOUT_8MB,
            Self::Mb16 => LAYOUT_16MB,
        }
    }
}

/// Accepts `8MB`, `16MB` or an empty string, which means the 8MB default.
impl FromStr for FlashSize {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "8MB" => Ok(Self::Mb8),
            "16MB" => Ok(Self::Mb16),
            other => Err(BundleError::invalid_configuration(other)),
        }
    }
}

impl fmt::Display for FlashSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mb8 => "8MB",
            Self::Mb16 => "16MB",
        };
        write!(f, "{}", name)
    }
}

/// Resolve an optional flash selector to its partition layout.
pub fn select_layout(selector: Option<&str>) -> Result<PartitionLayout> {
    let flash = FlashSize::from_selector(selector)?;
    debug!("flash {flash}: {:x?}", flash.layout());
    Ok(flash.layout())
}
