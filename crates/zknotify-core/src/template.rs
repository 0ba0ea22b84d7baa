//! Payload templates.
//!
//! Templates use Handlebars syntax and are rendered against a
//! [`TemplateContext`]; fields outside that context are a render error.
//! Interpolated values are escaped for use inside JSON string literals.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::config::HandlerConfig;
use crate::constants::{DEFAULT_END_TEMPLATE, DEFAULT_START_TEMPLATE};
use crate::error::NotifyError;
use crate::run::{Phase, RunContext};

/// Where a template's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// One of the templates shipped with the crate.
    Builtin(Phase),
    /// A user-supplied template file.
    File(PathBuf),
}

impl TemplateSource {
    /// The configured override for `phase`, or the built-in template.
    pub fn for_phase(config: &HandlerConfig, phase: Phase) -> Self {
        let configured = match phase {
            Phase::Start => config.start_template(),
            Phase::End => config.end_template(),
        };
        match configured {
            Some(path) => Self::File(PathBuf::from(path)),
            None => Self::Builtin(phase),
        }
    }
}

impl Display for TemplateSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin(phase) => write!(f, "builtin:{}", phase.as_str()),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The values a template may reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateContext {
    pub server: Option<String>,
    pub znode: Option<String>,
    pub start_template: Option<String>,
    pub end_template: Option<String>,
    pub node_name: Option<String>,
    pub phase: Phase,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Seconds.
    pub elapsed_time: Option<f64>,
    pub success: bool,
}

impl TemplateContext {
    /// Builds the context for one notification.
    ///
    /// `now` stands in for the start time when the host supplied no run, or
    /// a run whose clock never started.
    pub fn new(
        config: &HandlerConfig,
        phase: Phase,
        run: Option<&RunContext>,
        now: DateTime<Utc>,
    ) -> Self {
        let start = run.and_then(|r| r.start_time).unwrap_or(now);
        let end = run.and_then(|r| r.end_time);
        let elapsed = run
            .and_then(RunContext::elapsed_time)
            .map(|d| d.num_milliseconds() as f64 / 1000.0);

        Self {
            server: config.server().map(ToOwned::to_owned),
            znode: config.znode().map(ToOwned::to_owned),
            start_template: config.start_template().map(ToOwned::to_owned),
            end_template: config.end_template().map(ToOwned::to_owned),
            node_name: run.and_then(|r| r.node_name.clone()),
            phase,
            start_time: Some(timestamp(start)),
            end_time: end.map(timestamp),
            elapsed_time: elapsed,
            success: run.map_or(true, RunContext::success),
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Escapes a value for use between JSON string quotes.
fn json_escape(value: &str) -> String {
    match serde_json::to_string(value) {
        Ok(quoted) => quoted[1..quoted.len() - 1].to_string(),
        Err(_) => value.to_string(),
    }
}

/// Renders notification payloads.
pub struct TemplateRenderer {
    hbs: Handlebars<'static>,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("strict_mode", &self.hbs.strict_mode())
            .finish_non_exhaustive()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(json_escape);
        Self { hbs }
    }

    /// Loads the template text for `source`.
    ///
    /// # Errors
    /// Returns [`NotifyError::Io`] when a template file cannot be read.
    pub fn load(&self, source: &TemplateSource) -> Result<String, NotifyError> {
        match source {
            TemplateSource::Builtin(Phase::Start) => Ok(DEFAULT_START_TEMPLATE.to_string()),
            TemplateSource::Builtin(Phase::End) => Ok(DEFAULT_END_TEMPLATE.to_string()),
            TemplateSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| NotifyError::Io {
                    path: path.clone(),
                    source,
                })
            }
        }
    }

    pub fn render(
        &self,
        source: &TemplateSource,
        context: &TemplateContext,
    ) -> Result<String, NotifyError> {
        let text = self.load(source)?;
        debug!("rendering template {source} for phase {}", context.phase.as_str());
        self.render_str(&source.to_string(), &text, context)
    }

    /// Renders already-loaded template text; `name` only labels errors.
    pub fn render_str(
        &self,
        name: &str,
        text: &str,
        context: &TemplateContext,
    ) -> Result<String, NotifyError> {
        self.hbs
            .render_template(text, context)
            .map_err(|source| NotifyError::Render {
                template: name.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn config() -> HandlerConfig {
        let mut cfg = HandlerConfig::new();
        cfg.set_server("127.0.0.1:2181").set_znode("/chef/1.2.3.4");
        cfg
    }

    fn completed_run() -> RunContext {
        let start = Utc.with_ymd_and_hms(2013, 5, 1, 12, 0, 0).unwrap();
        RunContext {
            node_name: Some("test".to_string()),
            start_time: Some(start),
            end_time: Some(start + Duration::milliseconds(42_500)),
            failure: None,
        }
    }

    fn context(phase: Phase, run: Option<&RunContext>) -> TemplateContext {
        TemplateContext::new(&config(), phase, run, Utc::now())
    }

    #[test]
    fn source_prefers_configured_template() {
        let mut cfg = config();
        assert_eq!(
            TemplateSource::for_phase(&cfg, Phase::Start),
            TemplateSource::Builtin(Phase::Start)
        );

        cfg.set_end_template("/etc/zknotify/end.hbs");
        assert_eq!(
            TemplateSource::for_phase(&cfg, Phase::End),
            TemplateSource::File(PathBuf::from("/etc/zknotify/end.hbs"))
        );
        assert_eq!(
            TemplateSource::for_phase(&cfg, Phase::Start),
            TemplateSource::Builtin(Phase::Start)
        );
    }

    #[test]
    fn renders_default_start_template() {
        let mut run = RunContext::new("test");
        run.start_clock();
        let renderer = TemplateRenderer::new();

        let body = renderer
            .render(&TemplateSource::Builtin(Phase::Start), &context(Phase::Start, Some(&run)))
            .expect("default start template should render");
        assert!(body.contains("\"start_time\":"));

        let json: serde_json::Value = serde_json::from_str(&body).expect("body must be JSON");
        assert_eq!(json["status"], "start");
        assert_eq!(json["node"], "test");
    }

    #[test]
    fn renders_default_end_template() {
        let run = completed_run();
        let renderer = TemplateRenderer::new();

        let body = renderer
            .render(&TemplateSource::Builtin(Phase::End), &context(Phase::End, Some(&run)))
            .expect("default end template should render");
        assert!(body.contains("\"end_time\":"));

        let json: serde_json::Value = serde_json::from_str(&body).expect("body must be JSON");
        assert_eq!(json["start_time"], "2013-05-01T12:00:00Z");
        assert_eq!(json["end_time"], "2013-05-01T12:00:42Z");
        assert_eq!(json["elapsed_time"], 42.5);
        assert_eq!(json["success"], true);
    }

    #[test]
    fn start_time_defaults_to_now_without_a_run() {
        let now = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let ctx = TemplateContext::new(&config(), Phase::Start, None, now);
        assert_eq!(ctx.start_time.as_deref(), Some("2020-01-02T03:04:05Z"));
        assert_eq!(ctx.end_time, None);
        assert_eq!(ctx.node_name, None);
        assert!(ctx.success);
    }

    #[test]
    fn interpolated_values_stay_valid_json() {
        let mut run = completed_run();
        run.node_name = Some("web \"01\"\n".to_string());
        run.record_failure("boom");

        let body = TemplateRenderer::new()
            .render(&TemplateSource::Builtin(Phase::End), &context(Phase::End, Some(&run)))
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).expect("body must be JSON");
        assert_eq!(json["node"], "web \"01\"\n");
        assert_eq!(json["success"], false);
    }

    #[test]
    fn renders_user_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("start.hbs");
        std::fs::write(&path, "{{znode}} on {{server}}: {{phase}}").unwrap();

        let body = TemplateRenderer::new()
            .render(&TemplateSource::File(path), &context(Phase::Start, None))
            .unwrap();
        assert_eq!(body, "/chef/1.2.3.4 on 127.0.0.1:2181: start");
    }

    #[test]
    fn unreadable_template_is_an_io_error() {
        let err = TemplateRenderer::new()
            .render(
                &TemplateSource::File(PathBuf::from("/tmp/nonexistent-template.hbs")),
                &context(Phase::Start, None),
            )
            .expect_err("missing file must fail");
        assert!(matches!(err, NotifyError::Io { .. }));
    }

    #[test]
    fn fields_outside_the_context_are_rejected() {
        let err = TemplateRenderer::new()
            .render_str("inline", "{{run_status.node.attributes}}", &context(Phase::Start, None))
            .expect_err("unknown field must fail");
        assert!(matches!(err, NotifyError::Render { ref template, .. } if template == "inline"));
    }

    #[test]
    fn plain_text_renders_unchanged() {
        let body = TemplateRenderer::new()
            .render_str("inline", "My Template", &context(Phase::End, None))
            .unwrap();
        assert_eq!(body, "My Template");
    }
}
