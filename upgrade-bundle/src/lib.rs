//! # upgrade-bundle
//!
//! Packs U-Boot, kernel and rootfs images into a single upgrade bundle for
//! SPI-NOR based devices. A bundle is a JSON manifest describing every
//! partition, a NUL byte, and the raw images concatenated in flashing order.
//!
//! ## Example
//!
//! ```no_run
//! use upgrade_bundle::{BundleBuilder, BundleConfig, FlashSize};
//!
//! let config = BundleConfig::new("upgrade.bin")
//!     .boot("u-boot.bin")
//!     .kernel("uImage")
//!     .rootfs("rootfs.squashfs")
//!     .flash(FlashSize::Mb16)
//!     .init(true);
//!
//! let bundle = BundleBuilder::from_config(&config)?;
//! bundle.write_to_file(&config.output)?;
//! # Ok::<(), upgrade_bundle::BundleError>(())
//! ```

pub mod builder;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod manifest;
mod reader;

#[macro_use]
extern crate log;

pub use builder::BundleBuilder;
pub use bundle::{Bundle, MANIFEST_TERMINATOR};
pub use config::BundleConfig;
pub use error::{BundleError, Result};
pub use layout::{Component, FlashSize, PartitionLayout, select_layout};
pub use manifest::{Manifest, PartitionDescriptor, fingerprint};

/// Current version of the upgrade-bundle implementation
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
