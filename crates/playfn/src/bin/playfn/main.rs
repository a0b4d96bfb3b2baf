mod cli;

use anyhow::Context;
use playfn::playbook::Playbook;
use std::path::Path;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("PLAYFN_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Render(render_cli) => render(render_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn render(cli: cli::RenderCommand) -> anyhow::Result<()> {
    let mut playbook = load(&cli.source)?;

    playbook
        .expand()
        .with_context(|| format!("Failed to expand {}", cli.source.display()))?;

    let rendered = output(&cli.output, &playbook)?;

    if is_stdio(&cli.destination) {
        print!("{rendered}");
    } else {
        std::fs::write(&cli.destination, rendered)
            .with_context(|| format!("Failed to write {}", cli.destination.display()))?;
        tracing::info!(path=%cli.destination.display(), "playbook written");
    }

    Ok(())
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn load(source: &Path) -> anyhow::Result<Playbook> {
    let playbook = if is_stdio(source) {
        Playbook::load_reader(std::io::stdin())
    } else {
        Playbook::load_file(source)
    };

    playbook.with_context(|| format!("Failed to load {}", source.display()))
}

fn output(output: &cli::OutputArgs, playbook: &Playbook) -> anyhow::Result<String> {
    let rendered = match output.format {
        cli::OutputFormat::Yaml => playbook.to_yaml()?,
        cli::OutputFormat::Json => serde_json::to_string_pretty(playbook.root())? + "\n",
    };

    Ok(rendered)
}

/// (playfn-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    match cli.command {
        cli::DevSubCommand::Functions { source } => {
            println!("{:#?}", load(&source)?.function_tables()?)
        }
        cli::DevSubCommand::Playbook { source } => println!("{:#?}", load(&source)?.root()),
    }

    Ok(())
}
