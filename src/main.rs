//! controllerx - Ansible Controller dynamic inventory
//!
//! Prints the filtered inventory in the format `ansible-inventory` expects.
//! Exit status: 0 on success, 2 for configuration errors, 3 when the
//! inventory cannot be fetched or ingested, 4 when the filtered graph is
//! inconsistent, 1 otherwise.

mod cli;

use anyhow::{Context, Result};
use cli::output::OutputFormatter;
use cli::{Action, Cli};
use controllerx::config::{ControllerConfig, InventorySource};
use controllerx::inventory::export;
use controllerx::inventory::plugins::{ControllerxPlugin, ScriptFilePlugin};
use controllerx::inventory::InventoryPlugin;
use controllerx::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_args();

    init_logging(cli.verbosity());

    let output = OutputFormatter::new(!cli.no_color);

    let exit_code = match run(&cli, &output).await {
        Ok(()) => 0,
        Err(err) => {
            report(&output, &err);
            exit_code(&err)
        }
    };

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}

async fn run(cli: &Cli, output: &OutputFormatter) -> Result<()> {
    let action = cli.action();
    if action == Action::Doc {
        output.document(&render_doc());
        return Ok(());
    }

    let source = match cli.inventory.as_deref() {
        Some(path) => InventorySource::from_path(path).map_err(Error::from)?,
        None => InventorySource::Environment,
    };
    let overrides = cli.overrides();

    let plugin: Box<dyn InventoryPlugin> = match &cli.script_file {
        Some(path) => {
            if overrides.include_metadata == Some(true) {
                output.warning("Controller metadata is not available when reading a script file");
            }
            let filters =
                ControllerConfig::load_filters(&source, &overrides).map_err(Error::from)?;
            Box::new(ScriptFilePlugin::new(path, filters))
        }
        None => Box::new(ControllerxPlugin::from_source(&source, &overrides)?),
    };

    plugin.verify()?;
    let inventory = plugin.parse().await?;

    let document = match action {
        Action::List if cli.yaml => {
            export::to_yaml(&inventory).context("failed to render inventory as YAML")?
        }
        Action::List => export::to_json(&inventory).context("failed to render inventory as JSON")?,
        Action::Host(name) => {
            let vars = export::host_vars_document(&inventory, &name).map_err(Error::from)?;
            serde_json::to_string_pretty(&vars).context("failed to render host variables")?
        }
        Action::Graph(group) => export::render_graph(&inventory, &group).map_err(Error::from)?,
        Action::Doc => render_doc(),
    };

    output.document(&document);
    Ok(())
}

/// Option table for `--doc`
fn render_doc() -> String {
    let mut doc = format!(
        "controllerx {}\n\nAnsible Controller inventory with regex host and group filtering.\n\nOPTIONS (= is mandatory):\n\n",
        controllerx::VERSION
    );
    for option in ControllerxPlugin::options() {
        let marker = if option.required { '=' } else { '-' };
        doc.push_str(&format!("{} {}\n", marker, option));
    }
    doc
}

fn report(output: &OutputFormatter, err: &anyhow::Error) {
    match err.downcast_ref::<Error>() {
        Some(inner) => {
            output.error(&inner.to_string());
            if let Some(hint) = inner.hint() {
                output.hint(&hint);
            }
        }
        None => output.error(&format!("{:#}", err)),
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>().map_or(1, Error::exit_code)
}
