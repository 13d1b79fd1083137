mod cmd;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modgraph_lib::config::ConfigOverrides;

/// modgraph - Module graph configurator
#[derive(Parser)]
#[command(name = "modgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(flatten)]
  config: ConfigArgs,

  #[command(subcommand)]
  command: Commands,
}

/// Flags overriding the configuration set by the definitions file.
#[derive(Args)]
struct ConfigArgs {
  /// VNDK version the vendor partition is built against ("current" for the platform's)
  #[arg(long, global = true)]
  device_vndk_version: Option<String>,

  /// VNDK version of the platform
  #[arg(long, global = true)]
  platform_vndk_version: Option<String>,
}

impl ConfigArgs {
  fn overrides(&self) -> ConfigOverrides {
    ConfigOverrides {
      device_vndk_version: self.device_vndk_version.clone(),
      platform_vndk_version: self.platform_vndk_version.clone(),
      ..ConfigOverrides::default()
    }
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Configure a definitions file and summarize the resulting graph
  Plan {
    /// Path to the definitions file
    file: String,

    /// Print the full graph summary as JSON
    #[arg(long)]
    json: bool,
  },

  /// List the variants of a module
  Variants {
    /// Path to the definitions file
    file: String,

    /// Module name
    module: String,
  },

  /// Show the bound dependencies and link order of a variant
  Deps {
    /// Path to the definitions file
    file: String,

    /// Module name
    module: String,

    /// Variant name (e.g. android_arm64_core_shared)
    variant: String,
  },

  /// Print the build actions as JSON
  Actions {
    /// Path to the definitions file
    file: String,
  },

  /// Configure a definitions file and report errors only
  Check {
    /// Path to the definitions file
    file: String,
  },

  /// Show host platform, module types and passes
  Info,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let overrides = cli.config.overrides();
  match cli.command {
    Commands::Plan { file, json } => cmd::cmd_plan(&file, &overrides, json),
    Commands::Variants { file, module } => cmd::cmd_variants(&file, &overrides, &module),
    Commands::Deps { file, module, variant } => cmd::cmd_deps(&file, &overrides, &module, &variant),
    Commands::Actions { file } => cmd::cmd_actions(&file, &overrides),
    Commands::Check { file } => cmd::cmd_check(&file, &overrides),
    Commands::Info => {
      cmd::cmd_info();
      Ok(())
    }
  }
}
