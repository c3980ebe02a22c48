mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ConfigArgs, cmd_compile, cmd_run};
use output::{OutputFormat, print_error};

/// hotchunk - compile Lua source at runtime and load it from a cache
#[derive(Parser)]
#[command(name = "hotchunk")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(flatten)]
  config: ConfigArgs,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a unit and report the artifacts it produces
  Compile {
    /// Dotted unit name, e.g. pkg.Foo
    name: String,

    /// Where to read the source: a path, a resource name, or `=<inline source>`
    location: String,
  },

  /// Load a unit into a fresh Lua state and print its value
  Run {
    /// Dotted unit name, e.g. pkg.Foo
    name: String,

    /// Where to read the source: a path, a resource name, or `=<inline source>`
    location: String,

    /// Exported function to call instead of printing the module value
    #[arg(long, value_name = "FUNCTION")]
    call: Option<String>,

    /// Arguments passed to the called function
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(e) = run(cli) {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  let config = cli.config.resolve()?;

  match cli.command {
    Commands::Compile { name, location } => cmd_compile(&config, &name, &location, cli.output),
    Commands::Run {
      name,
      location,
      call,
      args,
    } => cmd_run(&config, &name, &location, call.as_deref(), &args, cli.output),
  }
}
