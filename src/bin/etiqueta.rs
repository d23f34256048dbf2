//! etiqueta - render part labels from the command line
//!
//! Resolves a label from flags, composes it and writes `etiqueta.pdf` into
//! the output directory. A PNG preview can be written alongside.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info};

use etiqueta_renderer::{
    DEFAULT_PAGE_SIZE, DirectorySink, FontLibrary, LabelComposer, LabelConfig, LabelDraft,
    LabelError, LabelResult, LogoAsset, PhysicalSize, PrintSink, RenderOptions, Symbology,
    export_pdf,
};

#[derive(Parser)]
#[command(name = "etiqueta")]
#[command(about = "Render part identification labels to PDF")]
struct Cli {
    /// Part number (looked up in the catalog)
    #[arg(short, long)]
    part: String,

    /// Manufacture date as YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Invoice number
    #[arg(short, long, default_value = "")]
    invoice: String,

    /// Override the catalog release level
    #[arg(long)]
    release: Option<String>,

    /// Override the catalog manufacture serial
    #[arg(long)]
    serial: Option<String>,

    /// Override the catalog matrix code label
    #[arg(long)]
    code_label: Option<String>,

    /// Number of pages to print
    #[arg(short, long, default_value_t = 1)]
    copies: u32,

    /// Logo image file
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Output resolution (overrides the options file)
    #[arg(long)]
    dpi: Option<u32>,

    /// Rotate the label by 90 degrees
    #[arg(long)]
    rotate: bool,

    /// Matrix code symbology (overrides the options file)
    #[arg(long, value_enum)]
    symbology: Option<Symbology>,

    /// Fail instead of warning when the logo or fonts are missing
    #[arg(long)]
    strict: bool,

    /// Font files to load (repeatable), in addition to the bundled DejaVu Sans
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Also load the fonts installed on this system
    #[arg(long)]
    system_fonts: bool,

    /// Sheet width in millimetres
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE.width_mm)]
    page_width: f64,

    /// Sheet height in millimetres
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE.height_mm)]
    page_height: f64,

    /// JSON label configuration (catalog, supplier id, date format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON render options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Directory receiving etiqueta.pdf
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Write a PNG preview to this path
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Width of the preview in pixels
    #[arg(long, default_value_t = 500)]
    preview_width: u32,

    /// Skip the PDF export
    #[arg(long)]
    no_pdf: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "etiqueta=info,etiqueta_renderer=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ LabelError::InvalidArgument { .. }) => {
            error!("{err}");
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> LabelResult<()> {
    let config = match &cli.config {
        Some(path) => LabelConfig::from_json(&fs::read_to_string(path)?)?,
        None => LabelConfig::default(),
    };

    let mut options = match &cli.options {
        Some(path) => RenderOptions::from_json(&fs::read_to_string(path)?)?,
        None => RenderOptions::default(),
    };
    if let Some(dpi) = cli.dpi {
        options = options.with_dpi(dpi);
    }
    if let Some(symbology) = cli.symbology {
        options = options.with_symbology(symbology);
    }
    if cli.rotate {
        options = options.with_rotation(true);
    }
    if cli.strict {
        options = options.with_strict_assets(true);
    }

    let mut fonts = FontLibrary::bundled();
    if cli.system_fonts {
        fonts = fonts.with_system_fonts();
    }
    for path in &cli.fonts {
        fonts = fonts.with_font_file(path)?;
    }
    info!(faces = fonts.face_count(), "fonts loaded");

    let date = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let mut draft = LabelDraft::new(date, cli.part).with_invoice(cli.invoice);
    if let Some(release) = cli.release {
        draft = draft.with_release_level(release);
    }
    if let Some(serial) = cli.serial {
        draft = draft.with_manufacture_serial(serial);
    }
    if let Some(label) = cli.code_label {
        draft = draft.with_matrix_code_label(label);
    }

    let logo = cli.logo.map(LogoAsset::from_path).unwrap_or_default();

    let composer = LabelComposer::new(config, fonts);
    let label = composer.compose_draft(&draft, &logo, &options)?;
    info!(payload = %label.payload, "label composed");

    if let Some(path) = &cli.preview {
        label.preview(cli.preview_width)?.save(path)?;
        info!(path = %path.display(), "preview written");
    }

    if !cli.no_pdf {
        let sheet = PhysicalSize::new(cli.page_width, cli.page_height).oriented_for(label.size);
        let document = export_pdf(&label, cli.copies, sheet)?;
        DirectorySink::new(&cli.out).send(&document)?;
    }

    Ok(())
}
