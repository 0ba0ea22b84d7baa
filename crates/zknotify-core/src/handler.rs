use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::config::{ConfigKey, HandlerConfig};
use crate::error::{NotifyError, ValidationError};
use crate::run::{Phase, RunContext, RunHook};
use crate::store::{StoreConnection, StoreConnector};
use crate::template::{TemplateContext, TemplateRenderer, TemplateSource};

/// Publishes a status document to a znode at the start and end of a run.
///
/// The store connection is opened on the first publish and reused for the
/// lifetime of the handler.
pub struct NotificationHandler<C: StoreConnector> {
    config: HandlerConfig,
    connector: C,
    connection: Option<C::Connection>,
    renderer: TemplateRenderer,
}

impl<C: StoreConnector> std::fmt::Debug for NotificationHandler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHandler")
            .field("config", &self.config)
            .field("connector", &self.connector)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl<C: StoreConnector> NotificationHandler<C> {
    pub fn new(config: HandlerConfig, connector: C) -> Self {
        debug!("zknotify handler initialized");
        Self {
            config,
            connector,
            connection: None,
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut HandlerConfig {
        &mut self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Validates the config and renders the payload for `phase`.
    ///
    /// # Errors
    /// Fails with a validation error before any template is read when the
    /// config is incomplete or names a missing template file.
    pub fn render(&self, phase: Phase, run: Option<&RunContext>) -> Result<String, NotifyError> {
        self.config.validate()?;
        let source = TemplateSource::for_phase(&self.config, phase);
        let context = TemplateContext::new(&self.config, phase, run, Utc::now());
        self.renderer.render(&source, &context)
    }

    /// Renders the payload for the current phase of `run` and writes it to
    /// the configured znode.
    #[instrument(skip(self, run))]
    pub fn notify(&mut self, run: Option<&RunContext>) -> Result<Phase, NotifyError> {
        let phase = Phase::select(run);
        match phase {
            Phase::Start => info!("zknotify START"),
            Phase::End => info!("zknotify END"),
        }

        let body = self.render(phase, run)?;
        let znode = self
            .config
            .znode()
            .ok_or(ValidationError::MissingOption(ConfigKey::Znode))?
            .to_string();

        self.connection()?
            .write(&znode, &body)
            .map_err(|source| NotifyError::StoreWrite {
                path: znode.clone(),
                source,
            })?;
        debug!("wrote {} bytes to {znode}", body.len());
        Ok(phase)
    }

    fn connection(&mut self) -> Result<&C::Connection, NotifyError> {
        let conn = match self.connection.take() {
            Some(conn) => conn,
            None => {
                let server = self
                    .config
                    .server()
                    .ok_or(ValidationError::MissingOption(ConfigKey::Server))?;
                debug!("connecting to {server}");
                self.connector
                    .connect(server)
                    .map_err(|source| NotifyError::StoreConnect {
                        server: server.to_string(),
                        source,
                    })?
            }
        };
        Ok(self.connection.insert(conn))
    }
}

impl<C: StoreConnector> RunHook for NotificationHandler<C> {
    fn on_run_complete(&mut self, run: Option<&RunContext>) -> Result<(), NotifyError> {
        self.notify(run).map(|_| ())
    }
}
