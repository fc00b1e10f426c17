//! census-wizard
//!
//! Terminal host for the census wizard core. Each invocation activates one
//! section against the configured backend and the file-backed draft store.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use wizard_core::{ActiveSection, SchemaValidator, SectionCatalog, SectionController, WizardConfig};
use wizard_drafts::{DraftStore, FileDraftStore};
use wizard_remote::HttpBackend;
use wizard_snapshot::SubjectId;

fn target_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("subject")
            .long("subject")
            .required(true)
            .value_parser(value_parser!(u64))
            .help("Subject (school) identifier"),
    )
    .arg(
        Arg::new("section")
            .long("section")
            .required(true)
            .help("Wizard step, as listed by `sections`"),
    )
}

fn cli() -> Command {
    Command::new("census-wizard")
        .version(wizard_core::VERSION)
        .about("Census wizard: load, edit and submit sections with local drafts")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(Command::new("sections").about("List the wizard steps in order"))
        .subcommand(target_args(
            Command::new("show").about("Print the merged snapshot with per-field provenance"),
        ))
        .subcommand(target_args(
            Command::new("edit")
                .about("Apply edits through the reconciler and persist the draft")
                .arg(
                    Arg::new("assignments")
                        .required(true)
                        .num_args(1..)
                        .value_name("FIELD=VALUE")
                        .help("Values are read as JSON, falling back to plain text"),
                ),
        ))
        .subcommand(target_args(
            Command::new("submit").about("Validate and submit the section"),
        ))
        .subcommand(target_args(
            Command::new("discard").about("Remove the local draft of the section"),
        ))
        .subcommand(
            Command::new("purge")
                .about("Delete local drafts written under another schema version"),
        )
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<WizardConfig> {
    if let Some(path) = path {
        return WizardConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()));
    }
    let mut config = WizardConfig::new();
    config.apply_env_overrides();
    config.validate().context("validating default configuration")?;
    Ok(config)
}

fn build_controller(config: WizardConfig) -> Result<SectionController> {
    let catalog = Arc::new(SectionCatalog::census().context("building census catalog")?);
    let backend = HttpBackend::new(config.api_base_url.clone())
        .context("creating HTTP backend")?
        .with_submit_timeout(config.submit_timeout());
    let drafts: Arc<dyn DraftStore> = Arc::new(FileDraftStore::new(config.draft.directory.clone()));
    debug!(api = %backend.base_url(), drafts = %config.draft.directory.display(), "wiring controller");

    Ok(SectionController::new(catalog, Arc::new(backend), drafts, config)?)
}

fn purge_orphans(config: &WizardConfig) -> Result<usize> {
    let store = FileDraftStore::new(config.draft.directory.clone());
    let namespace = config.draft_namespace()?;
    store
        .purge_orphans(namespace.as_str(), config.schema_version())
        .with_context(|| format!("purging drafts in {}", store.root().display()))
}

fn target(args: &ArgMatches) -> Result<(SubjectId, String)> {
    let subject = args
        .get_one::<u64>("subject")
        .copied()
        .context("missing --subject")?;
    let section = args
        .get_one::<String>("section")
        .cloned()
        .context("missing --section")?;
    Ok((SubjectId(subject), section))
}

/// Split `field=value`; the value is JSON when it parses, text otherwise
fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let Some((field, value)) = raw.split_once('=') else {
        bail!("expected FIELD=VALUE, got {raw:?}");
    };
    let field = field.trim();
    if field.is_empty() {
        bail!("empty field name in {raw:?}");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

fn render(section: &ActiveSection) -> Value {
    let mut fields = Map::new();
    for (field, source) in section.provenance() {
        let value = section.value(field).cloned().unwrap_or(Value::Null);
        fields.insert(field.clone(), json!({ "value": value, "source": source }));
    }
    json!({
        "subject": section.key().subject.0,
        "section": section.key().section.as_str(),
        "state": format!("{:?}", section.state()),
        "fields": fields,
    })
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(matches: ArgMatches) -> Result<()> {
    let config = load_config(matches.get_one::<PathBuf>("config"))?;

    match matches.subcommand() {
        Some(("sections", _)) => {
            let catalog = SectionCatalog::census().context("building census catalog")?;
            for definition in catalog.iter() {
                let marker = if definition.is_terminal() { " (final)" } else { "" };
                println!(
                    "{:>2}. {:<16} {}{marker}",
                    definition.position() + 1,
                    definition.id().as_str(),
                    definition.title(),
                );
            }
        }
        Some(("show", args)) => {
            let (subject, section) = target(args)?;
            let controller = build_controller(config)?;
            let active = controller
                .activate(subject, &section)
                .await
                .with_context(|| format!("activating {section} for subject {}", subject.0))?;
            print_json(&render(&active))?;
        }
        Some(("edit", args)) => {
            let (subject, section) = target(args)?;
            let assignments = args
                .get_many::<String>("assignments")
                .into_iter()
                .flatten()
                .map(|raw| parse_assignment(raw))
                .collect::<Result<Vec<_>>>()?;

            let controller = build_controller(config)?;
            let mut active = controller
                .activate(subject, &section)
                .await
                .with_context(|| format!("activating {section} for subject {}", subject.0))?;
            for (field, value) in assignments {
                let changes = active
                    .edit(&field, value)
                    .with_context(|| format!("editing {field}"))?;
                for write in &changes.writes {
                    info!(field = %write.field, from = %write.previous, to = %write.value, derived = write.is_derived(), "applied");
                }
            }
            print_json(&render(&active))?;
        }
        Some(("submit", args)) => {
            let (subject, section) = target(args)?;
            let controller = build_controller(config)?;
            let mut active = controller
                .activate(subject, &section)
                .await
                .with_context(|| format!("activating {section} for subject {}", subject.0))?;
            active
                .submit(&SchemaValidator::new())
                .await
                .with_context(|| format!("submitting {section} for subject {}", subject.0))?;
            info!(subject = subject.0, section = %section, status = %active.submission_status(), "submitted");
        }
        Some(("discard", args)) => {
            let (subject, section) = target(args)?;
            let controller = build_controller(config)?;
            controller.discard_draft(subject, &section)?;
            info!(subject = subject.0, section = %section, "draft discarded");
        }
        Some(("purge", _)) => {
            let removed = purge_orphans(&config)?;
            info!(removed, directory = %config.draft.directory.display(), "orphaned drafts purged");
        }
        _ => bail!("no subcommand given"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("log-json"));

    match run(matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
