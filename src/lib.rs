//! agentic-eda: an interactive exploratory-data-analysis agent.
//!
//! A chat model drives analysis of uploaded datasets by calling two tools,
//! `run_python_code` and `run_on_command_line`, which execute in a remote
//! sandbox. Results are rendered on the terminal and fed back to the model
//! until it answers the user.
//!
//! # Quick Start
//!
//! ```no_run
//! use agentic_eda::prelude::*;
//! use agentic_eda::agent_loop::StdinInput;
//! use agentic_eda::present::TerminalPresenter;
//! use agentic_eda::session::{run_eda_session, Datasets};
//!
//! # async fn example() -> agentic_eda::error::Result<()> {
//! let config = EdaConfig::load(None)?;
//! let datasets = Datasets::from_paths(["./Download/data.csv"])?;
//! let mut presenter = TerminalPresenter::stdout();
//! run_eda_session(
//!     &config,
//!     &datasets,
//!     &mut presenter,
//!     &mut StdinInput::new(),
//!     agentic_eda::session::ctrl_c(),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod browser;
pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod present;
pub mod provider;
pub mod sandbox;
pub mod session;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
