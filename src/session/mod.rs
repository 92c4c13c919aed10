//! One end-to-end EDA session: sandbox, dataset upload, conversation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::agent_loop::{Conversation, SessionEnd, SessionLimits, UserInput};
use crate::browser::DownloadedDataset;
use crate::config::EdaConfig;
use crate::error::{EdaError, Result};
use crate::executor::{SandboxTools, TempImageWriter};
use crate::present::Presenter;
use crate::provider::{self, ModelProvider};
use crate::sandbox::{upload_files, with_sandbox, E2bSandbox, E2bSettings, Sandbox};
use crate::types::GenerationSettings;

/// Local dataset files and the names they get inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datasets {
    pub local_paths: Vec<PathBuf>,
    pub names: Vec<String>,
}

impl Datasets {
    /// Upload each file under its own file name.
    pub fn from_paths<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut local_paths = Vec::new();
        let mut names = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    EdaError::InvalidArgument(format!("{} is not a file path", path.display()))
                })?;
            local_paths.push(path.to_path_buf());
            names.push(name);
        }
        if local_paths.is_empty() {
            return Err(EdaError::InvalidArgument("no dataset given".into()));
        }
        Ok(Self { local_paths, names })
    }
}

impl From<&DownloadedDataset> for Datasets {
    fn from(dataset: &DownloadedDataset) -> Self {
        Self {
            local_paths: dataset.paths(),
            names: dataset.file_names.clone(),
        }
    }
}

/// Everything a session needs besides the sandbox and the terminal.
pub struct EdaSession {
    provider: Arc<dyn ModelProvider>,
    limits: SessionLimits,
    image_dir: PathBuf,
    settings: GenerationSettings,
}

impl EdaSession {
    pub fn new(provider: Arc<dyn ModelProvider>, limits: SessionLimits) -> Self {
        Self {
            provider,
            limits,
            image_dir: PathBuf::from("."),
            settings: GenerationSettings::default(),
        }
    }

    pub fn from_config(config: &EdaConfig) -> Result<Self> {
        let provider: Arc<dyn ModelProvider> = Arc::from(provider::create_provider(config)?);
        Ok(Self::new(provider, SessionLimits::new(config.max_consecutive_tool_calls)?)
            .with_image_dir(config.image_dir.clone()))
    }

    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Upload `datasets`, chat until the user leaves, and close `sandbox`
    /// on every path out.
    pub async fn run(
        &self,
        sandbox: Arc<dyn Sandbox>,
        datasets: &Datasets,
        presenter: &mut dyn Presenter,
        input: &mut dyn UserInput,
    ) -> Result<SessionEnd> {
        self.run_until(sandbox, datasets, presenter, input, std::future::pending())
            .await
    }

    /// Like [`run`](Self::run), but stop with [`EdaError::Interrupted`] as
    /// soon as `interrupt` resolves. The sandbox is closed after the
    /// interruption is shown.
    pub async fn run_until<I>(
        &self,
        sandbox: Arc<dyn Sandbox>,
        datasets: &Datasets,
        presenter: &mut dyn Presenter,
        input: &mut dyn UserInput,
        interrupt: I,
    ) -> Result<SessionEnd>
    where
        I: Future<Output = ()>,
    {
        let sandbox_id = sandbox.sandbox_id().to_string();
        let mut body_failed = false;
        let failed = &mut body_failed;
        let p = &mut *presenter;

        let outcome = with_sandbox(sandbox, |sandbox| async move {
            let converse = self.converse(sandbox, datasets, &mut *p, input);
            let finished = tokio::select! {
                result = converse => Some(result),
                () = interrupt => None,
            };
            let result = finished.unwrap_or_else(|| {
                warn!("session interrupted");
                p.error(&EdaError::Interrupted);
                Err(EdaError::Interrupted)
            });
            *failed = result.is_err();
            result
        })
        .await;

        match &outcome {
            Ok(_) => presenter.info(&format!("----- Closed Sandbox (id: {sandbox_id}) -----")),
            // Body errors were shown where they happened.
            Err(err) if !body_failed => presenter.error(err),
            Err(_) => {}
        }
        outcome
    }

    async fn converse(
        &self,
        sandbox: Arc<dyn Sandbox>,
        datasets: &Datasets,
        presenter: &mut dyn Presenter,
        input: &mut dyn UserInput,
    ) -> Result<SessionEnd> {
        let id = sandbox.sandbox_id().to_string();
        presenter.info(&format!("Started Sandbox (id: {id})"));
        for path in &datasets.local_paths {
            presenter.info(&format!(
                "Uploading dataset at {} to Sandbox (id: {id})",
                path.display()
            ));
        }
        if let Err(err) = upload_files(sandbox.as_ref(), &datasets.local_paths, &datasets.names).await
        {
            presenter.error(&err);
            return Err(err);
        }
        info!(sandbox_id = %id, files = datasets.names.len(), "datasets uploaded");

        let tools = SandboxTools::new(sandbox, TempImageWriter::new(&self.image_dir));
        let mut conversation = Conversation::new(Arc::clone(&self.provider), tools, presenter, self.limits)
            .with_settings(self.settings.clone());
        conversation.start(&datasets.names).await?;
        let end = conversation.run(input).await?;
        drop(conversation);

        presenter.info(&format!(
            "------ EDA Session Completed for Sandbox (id: {id}) ------"
        ));
        Ok(end)
    }
}

/// Resolves on the first Ctrl-C. If the signal handler cannot be installed
/// this never resolves.
pub async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Create a sandbox from `config` and run a full session in it, stopping
/// early when `interrupt` resolves.
pub async fn run_eda_session<I>(
    config: &EdaConfig,
    datasets: &Datasets,
    presenter: &mut dyn Presenter,
    input: &mut dyn UserInput,
    interrupt: I,
) -> Result<SessionEnd>
where
    I: Future<Output = ()>,
{
    let prepared = config
        .validate()
        .and_then(|_| EdaSession::from_config(config))
        .and_then(|session| Ok((session, E2bSettings::from_config(config)?)));
    let (session, settings) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            presenter.error(&err);
            return Err(err);
        }
    };

    let sandbox = match E2bSandbox::create(&settings).await {
        Ok(sandbox) => sandbox,
        Err(err) => {
            presenter.error(&err);
            return Err(err);
        }
    };
    session
        .run_until(Arc::new(sandbox), datasets, presenter, input, interrupt)
        .await
}
