//! promptdir: command-line shell for the JSON prompt directory.
//!
//! Browses, submits and generates prompts against the store selected by the
//! environment (local snapshot by default, remote table when configured).
//!
//! Environment variables:
//!   RUST_LOG   - standard env filter (default: "promptdir=info")
//!   LOG_FORMAT - "json" or "text" when --log-format is not given

mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use promptdir_core::{
    available_tags, filter_records, find_record, ImageRef, RecordId, StoreConfig,
};
use promptdir_db::open_store;
use promptdir_inference::GeminiBackend;
use promptdir_submit::{SubmissionForm, SubmissionPipeline, Workbench};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "promptdir")]
#[command(author, version, about = "Browse and publish structured JSON image prompts")]
#[command(propagate_version = true)]
struct Cli {
    /// Local snapshot directory (overrides PROMPTDIR_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct BodySource {
    /// JSON prompt body
    #[arg(long)]
    body: Option<String>,

    /// File containing the JSON prompt body
    #[arg(long)]
    body_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ImageSource {
    /// Image file to normalize and attach
    #[arg(long)]
    image: Option<PathBuf>,

    /// Existing image URL
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List records, newest first
    List {
        /// Only records carrying this tag
        #[arg(long, default_value = "All")]
        tag: String,

        /// Case-insensitive text to search for
        #[arg(long, default_value = "")]
        search: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one record
    Show {
        /// Record id
        id: String,
    },

    /// List the tags in use
    Tags,

    /// Show store connectivity
    Status,

    /// Publish a new record
    Submit {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        #[arg(long)]
        author_url: Option<String>,

        #[command(flatten)]
        body: BodySource,

        #[command(flatten)]
        image: ImageSource,

        /// Tag to attach (can specify multiple)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Ask the tag model for additional tags
        #[arg(long)]
        auto_tag: bool,
    },

    /// Render a JSON body to an image file
    Generate {
        #[command(flatten)]
        body: BodySource,

        /// Output file for the generated image
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Discard local submissions and restore the seed collection
    Reset,
}

fn init_tracing(format: Option<LogFormat>) {
    let format = format.unwrap_or_else(|| match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Text,
    });

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "promptdir=info".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn read_body(source: BodySource) -> anyhow::Result<String> {
    match (source.body, source.body_file) {
        (Some(body), _) => Ok(body),
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        (None, None) => bail!("a body is required"),
    }
}

fn store_config(data_dir: Option<PathBuf>) -> StoreConfig {
    let mut config = StoreConfig::from_env();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    config
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = store_config(cli.data_dir);

    match cli.command {
        Commands::List { tag, search, json } => {
            let handle = open_store(&config).await?;
            let records = handle.store.records().await;
            let matches = filter_records(&records, &tag, &search);
            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                for record in &matches {
                    println!("{}", output::summary_line(record));
                }
            }
        }
        Commands::Show { id } => {
            let handle = open_store(&config).await?;
            let records = handle.store.records().await;
            let record = find_record(&records, &RecordId::new(id.clone()))
                .with_context(|| format!("no record with id {}", id))?;
            println!("{}", output::detail(record));
        }
        Commands::Tags => {
            let handle = open_store(&config).await?;
            for tag in available_tags(&handle.store.records().await) {
                println!("{}", tag);
            }
        }
        Commands::Status => {
            let handle = open_store(&config).await?;
            println!("backend: {}", handle.store.backend_name());
            println!("status: {}", handle.store.status());
            match &config.remote {
                Some(remote) => println!("remote: {} ({})", remote.url, remote.table),
                None => println!("data dir: {}", config.data_dir.display()),
            }
            println!("records: {}", handle.store.records().await.len());
            let backend = GeminiBackend::from_env()?;
            println!("generation: {}", generation_status(backend.as_ref()).await);
        }
        Commands::Submit {
            title,
            author,
            author_url,
            body,
            image,
            tags,
            auto_tag,
        } => {
            let mut form = SubmissionForm {
                title,
                author,
                author_url: author_url.unwrap_or_default(),
                body: read_body(body).await?,
                ..SubmissionForm::default()
            };
            form.set_tags_from_input(&tags.join(","));

            match (image.image, image.image_url) {
                (Some(path), _) => {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    form.attach_image(bytes).await?;
                }
                (None, Some(url)) => form.image_ref = Some(ImageRef::parse(&url)?),
                (None, None) => bail!("an image is required"),
            }

            if auto_tag {
                match GeminiBackend::from_env()? {
                    Some(backend) => form.suggest_tags(&backend).await,
                    None => warn!(
                        subsystem = "cli",
                        "Tag generation unavailable; set GEMINI_API_KEY"
                    ),
                }
            }

            let handle = open_store(&config).await?;
            let pipeline = SubmissionPipeline::new(handle.store, handle.bucket);
            let record = form.submit(&pipeline).await?;
            println!("{}", record.id);
        }
        Commands::Generate { body, out } => {
            let body = read_body(body).await?;
            cmd_generate(body, &out).await?;
        }
        Commands::Reset => {
            let handle = open_store(&config).await?;
            handle.store.reset().await?;
            info!(subsystem = "cli", backend = handle.store.backend_name(), "Store reset");
            println!("reset {} store", handle.store.backend_name());
        }
    }
    Ok(())
}

/// Generation availability as reported by `status`.
async fn generation_status(backend: Option<&GeminiBackend>) -> &'static str {
    match backend {
        None => "unavailable (set GEMINI_API_KEY)",
        Some(backend) => match backend.health_check().await {
            Ok(true) => "available",
            Ok(false) => "unreachable",
            Err(e) => {
                warn!(subsystem = "cli", error = %e, "Generation health check failed");
                "unreachable"
            }
        },
    }
}

async fn cmd_generate(body: String, out: &Path) -> anyhow::Result<()> {
    let backend = GeminiBackend::from_env()?
        .context("generation unavailable: set GEMINI_API_KEY")?;

    let mut bench = Workbench::new();
    bench.body = body;
    let state = bench.generate(&backend).await;
    if let Some(error) = &state.error {
        bail!("{}", error);
    }
    let image = state
        .result
        .as_ref()
        .context("generation returned no image")?;

    tokio::fs::write(out, &image.data)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("{} ({}, {} bytes)", out.display(), image.mime_type, image.data.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use promptdir_inference::InferenceConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::try_parse_from(["promptdir", "list"]).unwrap();
        match cli.command {
            Commands::List { tag, search, json } => {
                assert_eq!(tag, "All");
                assert_eq!(search, "");
                assert!(!json);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_submit_requires_one_body_and_one_image() {
        let base = ["promptdir", "submit", "--title", "T", "--author", "A"];

        let missing_body: Vec<&str> = base.iter().copied().chain(["--image-url", "https://x/y.jpg"]).collect();
        assert!(Cli::try_parse_from(missing_body).is_err());

        let both_bodies: Vec<&str> = base
            .iter()
            .copied()
            .chain(["--body", "{}", "--body-file", "b.json", "--image-url", "https://x/y.jpg"])
            .collect();
        assert!(Cli::try_parse_from(both_bodies).is_err());

        let ok: Vec<&str> = base
            .iter()
            .copied()
            .chain(["--body", "{}", "--image-url", "https://x/y.jpg", "--tag", "a", "--tag", "b"])
            .collect();
        let cli = Cli::try_parse_from(ok).unwrap();
        match cli.command {
            Commands::Submit { tags, auto_tag, .. } => {
                assert_eq!(tags, vec!["a", "b"]);
                assert!(!auto_tag);
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "promptdir",
            "status",
            "--data-dir",
            "/tmp/x",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
    }

    #[tokio::test]
    async fn test_read_body_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, "{\"a\": 1}").unwrap();
        let body = read_body(BodySource {
            body: None,
            body_file: Some(path),
        })
        .await
        .unwrap();
        assert_eq!(body, "{\"a\": 1}");
    }

    fn gemini_at(server: &MockServer) -> GeminiBackend {
        let mut config = InferenceConfig::new("test-key");
        config.base_url = server.uri();
        GeminiBackend::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_generation_status_runs_health_check() {
        assert_eq!(
            generation_status(None).await,
            "unavailable (set GEMINI_API_KEY)"
        );

        let healthy = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .expect(1)
            .mount(&healthy)
            .await;
        assert_eq!(generation_status(Some(&gemini_at(&healthy))).await, "available");

        let failing = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&failing)
            .await;
        assert_eq!(generation_status(Some(&gemini_at(&failing))).await, "unreachable");
    }

    #[test]
    fn test_data_dir_flag_overrides_env() {
        let config = store_config(Some(PathBuf::from("/tmp/override")));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/override"));
    }
}
