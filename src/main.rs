use std::collections::BTreeMap;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use vigil_actions::{
  ActionsConfig, ParameterFormat, RunEvent, RunNotifier, RunOptions, RunReport, ValidationActions,
};
use vigil_config::{Settings, SkipList};
use vigil_log::{DEFAULT_LOG_EXTENSION, LogSelector, Row};
use vigil_runner::{AnsiblePlaybookRunner, Inventory};
use vigil_validation::ValidationFilter;

/// Vigil - discover, run and report on Ansible validations
#[derive(Parser)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Settings file (JSON or YAML). Defaults to ~/.config/vigil/settings.yaml when present
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Directory holding the validation playbooks
  #[arg(long, global = true)]
  validation_dir: Option<PathBuf>,

  /// Directory execution logs are written to
  #[arg(long, global = true)]
  log_dir: Option<PathBuf>,

  /// Print results as JSON instead of tab separated rows
  #[arg(long, global = true)]
  json: bool,

  /// Enable debug logging (RUST_LOG takes precedence)
  #[arg(long, global = true)]
  debug: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Args)]
struct FilterArgs {
  /// Select validations in this group (repeatable)
  #[arg(long = "group")]
  groups: Vec<String>,

  /// Select validations in this category (repeatable)
  #[arg(long = "category")]
  categories: Vec<String>,

  /// Select validations for this product (repeatable)
  #[arg(long = "product")]
  products: Vec<String>,
}

impl FilterArgs {
  fn filter(&self) -> ValidationFilter {
    ValidationFilter::new()
      .with_groups(self.groups.iter().cloned())
      .with_categories(self.categories.iter().cloned())
      .with_products(self.products.iter().cloned())
  }
}

#[derive(Subcommand)]
enum Commands {
  /// List validations
  List {
    #[command(flatten)]
    filter: FilterArgs,
  },

  /// Show one validation with its execution statistics
  Show {
    /// Validation id
    validation: String,
  },

  /// Show groups and how many validations each holds
  ShowGroup {
    /// Group definition file (default: from settings)
    #[arg(long)]
    group_file: Option<PathBuf>,
  },

  /// Show the parameters of validations
  ShowParameter {
    /// Validation id (repeatable)
    #[arg(long = "validation")]
    validations: Vec<String>,

    #[command(flatten)]
    filter: FilterArgs,

    /// Output format: json or yaml
    #[arg(long, default_value = "json")]
    format: String,

    /// Also write the parameters to this file
    #[arg(long)]
    download: Option<PathBuf>,
  },

  /// Run validations
  Run(RunArgs),

  /// Show past executions
  History {
    /// Only executions of this validation (repeatable)
    #[arg(long = "validation")]
    validations: Vec<String>,

    /// Only the N most recent logs (0 reads every log)
    #[arg(long)]
    limit: Option<usize>,

    /// Log file extension
    #[arg(long, default_value = DEFAULT_LOG_EXTENSION)]
    extension: String,
  },

  /// Show hosts affected by tasks with a given status
  Status {
    /// Validation id
    #[arg(long, conflicts_with = "uuid", required_unless_present = "uuid")]
    validation: Option<String>,

    /// Execution uuid
    #[arg(long)]
    uuid: Option<String>,

    /// Task status to look for
    #[arg(long, default_value = "FAILED")]
    status: String,
  },
}

#[derive(Args)]
struct RunArgs {
  /// Validation id (repeatable)
  #[arg(long = "validation")]
  validations: Vec<String>,

  #[command(flatten)]
  filter: FilterArgs,

  /// Inventory path or host list (default: from settings)
  #[arg(long, short = 'i')]
  inventory: Option<String>,

  /// Ansible host pattern restricting the run
  #[arg(long)]
  limit: Option<String>,

  /// Extra variables as a JSON object
  #[arg(long)]
  extra_vars: Option<String>,

  /// Extra environment variable for the runner, KEY=VALUE (repeatable)
  #[arg(long = "extra-env-var", value_parser = parse_key_value)]
  extra_env_vars: Vec<(String, String)>,

  /// Skip list file (JSON or YAML)
  #[arg(long)]
  skip_list: Option<PathBuf>,

  #[arg(long)]
  python_interpreter: Option<String>,

  #[arg(long)]
  ssh_user: Option<String>,

  /// Show the runner output instead of capturing it
  #[arg(long)]
  verbose_output: bool,

  /// Dispatch the validations without waiting for them
  #[arg(long = "async")]
  run_async: bool,

  /// Executable used to run playbooks
  #[arg(long, default_value = "ansible-playbook")]
  ansible_playbook: PathBuf,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.debug);

  let settings = load_settings(&cli)?;
  let config = ActionsConfig::from(&settings);
  let json = cli.json;

  let Some(command) = cli.command else {
    println!("vigil - use --help to see available commands");
    return Ok(());
  };

  match command {
    Commands::List { filter } => {
      let actions = ValidationActions::new(config, AnsiblePlaybookRunner::new());
      let rows = actions
        .list_validations(&filter.filter())
        .context("failed to list validations")?;
      print_rows(&rows, json)?;
    }
    Commands::Show { validation } => {
      let actions = ValidationActions::new(config, AnsiblePlaybookRunner::new());
      let details = actions
        .show_validations(&validation)
        .with_context(|| format!("failed to show validation {}", validation))?;
      println!("{}", serde_json::to_string_pretty(&details)?);
    }
    Commands::ShowGroup { group_file } => {
      let group_file = group_file.unwrap_or_else(|| settings.group_file.clone());
      let actions = ValidationActions::new(config, AnsiblePlaybookRunner::new());
      let rows = actions
        .group_information(&group_file)
        .with_context(|| format!("failed to read groups from {}", group_file.display()))?;
      print_rows(&rows, json)?;
    }
    Commands::ShowParameter {
      validations,
      filter,
      format,
      download,
    } => {
      let format: ParameterFormat = format.parse()?;
      let actions = ValidationActions::new(config, AnsiblePlaybookRunner::new());
      let parameters = actions
        .show_validations_parameters(&validations, &filter.filter(), format, download.as_deref())
        .context("failed to collect validation parameters")?;
      println!("{}", format.render(&parameters)?);
    }
    Commands::Run(args) => {
      run(config, &settings, args, json)?;
    }
    Commands::History {
      validations,
      limit,
      extension,
    } => {
      let actions = ValidationActions::new(config, AnsiblePlaybookRunner::new());
      let rows = actions
        .show_history(&validations, &extension, limit)
        .context("failed to read execution history")?;
      print_rows(&rows, json)?;
    }
    Commands::Status {
      validation,
      uuid,
      status,
    } => {
      let selector = match (validation, uuid) {
        (Some(validation), _) => LogSelector::Validation(validation),
        (None, Some(uuid)) => LogSelector::Uuid(uuid),
        (None, None) => bail!("either --validation or --uuid is required"),
      };
      let actions = ValidationActions::new(config, AnsiblePlaybookRunner::new());
      let rows = actions
        .get_status(&selector, &status)
        .context("failed to read task status")?;
      print_rows(&rows, json)?;
    }
  }

  Ok(())
}

fn run(config: ActionsConfig, settings: &Settings, args: RunArgs, json: bool) -> Result<()> {
  let mut options = RunOptions::from(settings);
  options.validation_names = args.validations;
  options.filter = args.filter.filter();
  options.limit_hosts = args.limit;
  options.quiet = !args.verbose_output;
  options.run_async = args.run_async;
  options.extra_env_vars = args.extra_env_vars.into_iter().collect::<BTreeMap<_, _>>();

  if let Some(inventory) = args.inventory {
    options.inventory = Inventory::Path(inventory);
  }
  if let Some(extra_vars) = args.extra_vars {
    options.extra_vars =
      serde_json::from_str(&extra_vars).context("--extra-vars must be a JSON object")?;
  }
  if let Some(path) = args.skip_list {
    options.skip_list = SkipList::load(&path)
      .with_context(|| format!("failed to load skip list {}", path.display()))?;
  }
  if args.python_interpreter.is_some() {
    options.python_interpreter = args.python_interpreter;
  }
  if args.ssh_user.is_some() {
    options.ssh_user = args.ssh_user;
  }

  let notifier = ProgressNotifier {
    enabled: options.quiet && io::stderr().is_terminal(),
  };
  let runner = AnsiblePlaybookRunner::with_program(args.ansible_playbook);
  let actions = ValidationActions::with_notifier(config, runner, notifier);

  let rt = tokio::runtime::Runtime::new()?;
  let report = rt
    .block_on(async { actions.run_validations(options).await })
    .context("validation run failed")?;

  match &report {
    RunReport::Completed(results) => print_rows(results, json)?,
    RunReport::Dispatched(records) => println!("{}", serde_json::to_string_pretty(records)?),
  }

  report.ensure_passed()?;
  Ok(())
}

/// Prints run progress to stderr while the runner output is captured.
struct ProgressNotifier {
  enabled: bool,
}

impl RunNotifier for ProgressNotifier {
  fn notify(&self, event: RunEvent) {
    if !self.enabled {
      return;
    }
    match event {
      RunEvent::ValidationSkipped {
        validation, reason, ..
      } => eprintln!(
        "Skipping {} ({})",
        validation,
        reason.as_deref().unwrap_or("no reason given")
      ),
      RunEvent::ValidationStarted { validation, .. } => eprintln!("Running {}...", validation),
      RunEvent::ValidationCompleted {
        validation, status, ..
      } => eprintln!("Finished {}: {}", validation, status),
      RunEvent::RunCompleted { executed, skipped } => {
        eprintln!("{} executed, {} skipped", executed, skipped)
      }
    }
  }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
  let path = cli.config.clone().or_else(|| {
    dirs::config_dir()
      .map(|dir| dir.join("vigil").join("settings.yaml"))
      .filter(|path| path.is_file())
  });

  let mut settings = match path {
    Some(path) => {
      debug!(file = %path.display(), "loading settings");
      Settings::load(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?
    }
    None => Settings::default(),
  };

  if let Some(dir) = &cli.validation_dir {
    settings.validation_dir = dir.clone();
  }
  if let Some(dir) = &cli.log_dir {
    settings.log_dir = dir.clone();
  }

  Ok(settings)
}

fn init_tracing(debug: bool) {
  let default = if debug { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
    .init();
}

fn print_rows<T: Row + Serialize>(rows: &[T], json: bool) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(rows)?);
    return Ok(());
  }

  println!("{}", T::columns().join("\t"));
  for row in rows {
    println!("{}", row.cells().join("\t"));
  }
  Ok(())
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
  s.split_once('=')
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}
