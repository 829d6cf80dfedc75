use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use leafscan::{Config, ImageUpload, InferenceClient, Prediction, Verdict};

#[derive(Parser)]
#[command(name = "leafscan")]
#[command(about = "Diagnose kiwi leaf photos and render the explanation")]
struct Cli {
    /// Config file (defaults to ./leafscan.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a markdown explanation file, or stdin when omitted or `-`
    Render {
        input: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Output file (PDF defaults to the input name with .pdf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a leaf image to the inference service and show the result
    Predict {
        image: PathBuf,

        /// Inference endpoint, overriding the config file
        #[arg(long)]
        endpoint: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Output file (PDF defaults to the image name with .pdf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Typst,
    Pdf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) if !path.exists() => bail!("config file {} not found", path.display()),
        Some(path) => Config::load(path),
        None => Config::load(Path::new("leafscan.toml")),
    };

    match cli.command {
        Command::Render {
            input,
            format,
            output,
        } => render(input, format, output, &config),
        Command::Predict {
            image,
            endpoint,
            format,
            output,
        } => predict(image, endpoint, format, output, config).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "leafscan=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn render(
    input: Option<PathBuf>,
    format: Format,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let input = input.filter(|path| path != Path::new("-"));
    let markdown = match &input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Error reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Error reading stdin")?;
            buf
        }
    };

    let document = leafscan::render(markdown.as_str());
    let color = styled(output.as_deref());
    let bytes = match format {
        Format::Text => leafscan::document_to_text(&document, color).into_bytes(),
        Format::Json => json_bytes(&document)?,
        Format::Typst => leafscan::document_to_typst(&document, &config.report).into_bytes(),
        Format::Pdf => leafscan::markdown_to_pdf_with_config(&markdown, config)?,
    };

    let output = match (format, output, &input) {
        (Format::Pdf, None, Some(path)) => Some(path.with_extension("pdf")),
        (Format::Pdf, None, None) => bail!("PDF output from stdin needs --output"),
        (_, output, _) => output,
    };
    emit(output.as_deref(), &bytes)
}

async fn predict(
    image: PathBuf,
    endpoint: Option<String>,
    format: Format,
    output: Option<PathBuf>,
    mut config: Config,
) -> Result<()> {
    if let Some(url) = endpoint {
        config.endpoint.url = url;
    }

    let upload = ImageUpload::from_path(&image, config.upload.max_bytes)?;
    tracing::info!(
        file = upload.file_name(),
        size_mb = %format!("{:.2}", upload.size_mb()),
        mime = upload.mime_type(),
        "selected image"
    );

    let client = InferenceClient::new(&config.endpoint)?;
    let prediction = client.predict(&upload).await;

    let color = styled(output.as_deref());
    let bytes = match format {
        Format::Text => prediction_text(&prediction, &upload, color).into_bytes(),
        Format::Json => json_bytes(&serde_json::json!({
            "prediction": prediction.prediction,
            "verdict": prediction.verdict(),
            "explanation": prediction.explanation,
            "document": prediction.document(),
        }))?,
        Format::Typst => leafscan::report_to_typst(&prediction, &config.report).into_bytes(),
        Format::Pdf => leafscan::report_to_pdf(&prediction, &config)?,
    };

    let output = match (format, output) {
        (Format::Pdf, None) => Some(image.with_extension("pdf")),
        (_, output) => output,
    };
    emit(output.as_deref(), &bytes)
}

fn prediction_text(prediction: &Prediction, upload: &ImageUpload, styled: bool) -> String {
    let verdict = prediction.verdict();
    let label = match verdict {
        Verdict::Healthy => style(&prediction.prediction).green().bold(),
        Verdict::Diseased => style(&prediction.prediction).red().bold(),
        Verdict::Error => style(&prediction.prediction).dim().bold(),
    }
    .force_styling(styled);

    let mut out = format!(
        "{} ({:.2} MB, {})\nPrediction: {label} ({verdict})\n\n",
        upload.file_name(),
        upload.size_mb(),
        upload.mime_type(),
    );
    out.push_str(&leafscan::document_to_text(&prediction.document(), styled));
    out
}

fn json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Only style output headed for an interactive terminal.
fn styled(output: Option<&Path>) -> bool {
    output.is_none() && console::colors_enabled()
}

fn emit(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("Error writing {}", path.display()))?;
            eprintln!("Created {}", path.display());
        }
        None => io::stdout()
            .write_all(bytes)
            .context("Error writing to stdout")?,
    }
    Ok(())
}
