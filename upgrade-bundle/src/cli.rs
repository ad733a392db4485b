//! Command line interface for upgrade-bundle

use std::path::PathBuf;

use byte_unit::Byte;
use clap::Parser;
use clap::builder::{OsStringValueParser, TypedValueParser};
use colored::Colorize;
use log::LevelFilter;

use crate::builder::BundleBuilder;
use crate::config::BundleConfig;
use crate::error::Result;
use crate::layout::FlashSize;
use crate::VERSION;

/// Command line arguments for upgrade-bundle
#[derive(Parser, Debug)]
#[command(name = "upgrade-bundle")]
#[command(version = VERSION)]
#[command(about = "Pack boot, kernel and rootfs images into a flashable upgrade bundle", long_about = None)]
pub struct Args {
    /// U-Boot image file
    #[arg(short, long, value_parser = input_path())]
    pub boot: Option<PathBuf>,

    /// Kernel image file
    #[arg(short, long, value_parser = input_path())]
    pub kernel: Option<PathBuf>,

    /// Rootfs image file
    #[arg(short, long, value_parser = input_path())]
    pub rootfs: Option<PathBuf>,

    /// Output bundle file
    #[arg(short, long)]
    pub output: PathBuf,

    /// CMA allocator parameters, appended to the kernel cmdline
    #[arg(short, long)]
    pub cma: Option<String>,

    /// Add init=/init to the kernel cmdline
    #[arg(short, long)]
    pub init: bool,

    /// Pack kernel and rootfs tightly instead of at fixed partition sizes
    #[arg(short, long)]
    pub pack: bool,

    /// Flash size: 8MB (default) or 16MB
    #[arg(short, long, value_name = "8MB|16MB")]
    pub flash: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode - only output errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Validate the raw arguments into a typed [`BundleConfig`]
    pub fn to_config(&self) -> Result<BundleConfig> {
        let flash = FlashSize::from_selector(self.flash.as_deref())?;

        let mut config = BundleConfig::new(&self.output)
            .init(self.init)
            .pack(self.pack)
            .flash(flash);
        config.boot = given(&self.boot);
        config.kernel = given(&self.kernel);
        config.rootfs = given(&self.rootfs);
        if let Some(cma) = &self.cma {
            config = config.cma(cma);
        }
        Ok(config)
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

/// Input paths accept the empty string, which counts as not given
fn input_path() -> impl TypedValueParser<Value = PathBuf> {
    OsStringValueParser::new().map(PathBuf::from)
}

fn given(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.clone().filter(|p| !p.as_os_str().is_empty())
}

/// Main CLI handler
pub fn run_cli(args: Args) -> Result<()> {
    let config = args.to_config()?;
    let bundle = BundleBuilder::from_config(&config)?;
    bundle.write_to_file(&config.output)?;

    if !args.quiet {
        let size = bundle.total_size()?;
        println!(
            "{} {} ({:#})",
            "bundle written:".green().bold(),
            config.output.display(),
            Byte::from_u64(size)
        );
        if args.verbose {
            print!("{}", bundle.manifest());
        }
    }

    Ok(())
}
