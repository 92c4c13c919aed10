//! agentic-eda binary entry point.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agentic_eda::agent_loop::{ScriptedInput, SessionEnd, StdinInput, UserInput};
use agentic_eda::browser::{BrowserAgent, CommandBrowserAgent, DEFAULT_DATASET_TASK};
use agentic_eda::cli::errors::format_error_help;
use agentic_eda::cli::menu::{
    download_menu, existing_dataset_menu, main_menu, MainChoice, Prompter,
};
use agentic_eda::cli::{Cli, Commands};
use agentic_eda::config::EdaConfig;
use agentic_eda::error::{EdaError, Result};
use agentic_eda::present::{Presenter, TerminalPresenter};
use agentic_eda::session::{self, run_eda_session, Datasets};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_filter());

    match run(cli).await {
        Ok(()) => {}
        // Already shown; exit now instead of waiting on a blocked stdin read.
        Err(EdaError::Interrupted) => std::process::exit(130),
        Err(e) => {
            eprintln!("Error: {}", format_error_help(&e));
            std::process::exit(1);
        }
    }
}

/// Routes Ctrl-C: inside a session it interrupts the session, anywhere else
/// it ends the process.
#[derive(Clone, Default)]
struct Interrupts {
    in_session: Arc<AtomicBool>,
}

impl Interrupts {
    fn install() -> Self {
        let interrupts = Self::default();
        let in_session = Arc::clone(&interrupts.in_session);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !in_session.load(Ordering::SeqCst) {
                    eprintln!();
                    std::process::exit(130);
                }
            }
        });
        interrupts
    }

    async fn session<F>(&self, session: F) -> Result<SessionEnd>
    where
        F: Future<Output = Result<SessionEnd>>,
    {
        self.in_session.store(true, Ordering::SeqCst);
        let result = session.await;
        self.in_session.store(false, Ordering::SeqCst);
        result
    }
}

fn init_logging(filter: &str) {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = EdaConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    let mut presenter = TerminalPresenter::stdout();
    let interrupts = Interrupts::install();

    match cli.command {
        Some(Commands::Analyze(args)) => {
            let datasets = Datasets::from_paths(&args.paths)?;
            let mut input: Box<dyn UserInput> = if args.ask.is_empty() {
                Box::new(StdinInput::new())
            } else {
                Box::new(ScriptedInput::new(args.ask))
            };
            interrupts
                .session(run_eda_session(
                    &config,
                    &datasets,
                    &mut presenter,
                    input.as_mut(),
                    session::ctrl_c(),
                ))
                .await?;
        }
        Some(Commands::Download(args)) => {
            let task = args.task.unwrap_or_else(|| DEFAULT_DATASET_TASK.to_string());
            let datasets = download(&config, &task, &mut presenter).await?;
            interrupts
                .session(run_eda_session(
                    &config,
                    &datasets,
                    &mut presenter,
                    &mut StdinInput::new(),
                    session::ctrl_c(),
                ))
                .await?;
        }
        None => menu_loop(&config, &mut presenter, &interrupts).await?,
    }
    Ok(())
}

async fn download(
    config: &EdaConfig,
    task: &str,
    presenter: &mut dyn Presenter,
) -> Result<Datasets> {
    let agent = CommandBrowserAgent::from_config(config)?;
    presenter.info("Starting browser agent...");
    let downloaded = agent.download(task).await?;
    for path in downloaded.paths() {
        presenter.info(&format!("Dataset downloaded successfully to {}", path.display()));
    }
    Ok(Datasets::from(&downloaded))
}

/// Main menu until the user exits. A failed session returns to the menu;
/// its error has already been shown. An interrupted session ends the program.
async fn menu_loop(
    config: &EdaConfig,
    presenter: &mut dyn Presenter,
    interrupts: &Interrupts,
) -> Result<()> {
    loop {
        let choice = main_menu(&mut Prompter::stdio())?;
        let datasets = match choice {
            MainChoice::Exit => return Ok(()),
            MainChoice::Download => {
                let Some(task) = download_menu(&mut Prompter::stdio())? else {
                    continue;
                };
                match download(config, &task, presenter).await {
                    Ok(datasets) => datasets,
                    Err(err) => {
                        presenter.error(&err);
                        continue;
                    }
                }
            }
            MainChoice::UseExisting => {
                let mut prompter = Prompter::stdio();
                let Some(path) = existing_dataset_menu(&mut prompter, &config.default_dataset)? else {
                    continue;
                };
                Datasets::from_paths([path])?
            }
        };

        let mut input = StdinInput::new();
        let outcome = interrupts
            .session(run_eda_session(
                config,
                &datasets,
                presenter,
                &mut input,
                session::ctrl_c(),
            ))
            .await;
        match outcome {
            Ok(_) => {}
            Err(EdaError::Interrupted) => return Err(EdaError::Interrupted),
            Err(err) => warn!(error = %err, "eda session ended with an error"),
        }
    }
}
