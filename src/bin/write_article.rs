use anyhow::{Context, Result, anyhow};
use clap::Parser;
use jurnalis::cli::ModelOptions;
use jurnalis::config::{Models, setup_logging};
use jurnalis::language::Language;
use jurnalis::pipeline::{
    ArticleRequest, ImageOutcome, analyze_image, load_reference, prepare_article, write_article,
};
use jurnalis::reference::ReferenceDocument;
use jurnalis::upload::UploadedImage;
use std::fs;
use std::path::PathBuf;

/// Write one article from a photo and an instruction.
///
/// Minimal UX:
///   write_article --image banjir.jpg "Tulis berita viral 1000 kata"
#[derive(Parser, Debug)]
#[command(name = "write_article")]
struct Args {
    /// What to write, e.g. "Tulis artikel investigasi tentang kejadian ini"
    instruction: String,

    /// Photo to caption (JPEG or PNG)
    #[arg(long)]
    image: Option<PathBuf>,

    /// Style reference (.txt, .pdf or .docx)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Output language, `id` or `en`
    #[arg(long, default_value = "id", env = "JURNALIS_LANGUAGE")]
    language: String,

    /// Append the photo's EXIF metadata to the caption
    #[arg(long)]
    with_metadata: bool,

    /// Enable debug logging
    #[arg(long, env = "JURNALIS_DEBUG")]
    debug: bool,

    #[clap(flatten)]
    models: ModelOptions,
}

fn caption_for(args: &Args, models: &Models) -> Result<Option<String>> {
    let Some(path) = args.image.as_ref() else {
        return Ok(None);
    };
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let upload = UploadedImage::new(bytes, None);
    match analyze_image(&upload, models.captioner.as_ref(), args.with_metadata)? {
        ImageOutcome::Described(analysis) => Ok(Some(analysis.caption)),
        ImageOutcome::Rejected(err) => {
            eprintln!("{err}");
            Ok(None)
        }
    }
}

fn reference_for(args: &Args) -> Result<Option<String>> {
    let Some(path) = args.reference.as_ref() else {
        return Ok(None);
    };
    let document =
        ReferenceDocument::from_path(path).with_context(|| format!("reading {}", path.display()))?;
    match load_reference(&document) {
        Ok(text) if text.trim().is_empty() => {
            eprintln!("⚠️ {} has no text, continuing without a reference", path.display());
            Ok(None)
        }
        Ok(text) => Ok(Some(text)),
        Err(err) => {
            eprintln!("{err}");
            Ok(None)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _ = setup_logging(args.debug);

    let language: Language = args.language.parse()?;
    if args.instruction.trim().is_empty() {
        return Err(anyhow!("Tolong masukkan perintah atau pertanyaan."));
    }

    let models = Models::hosted(&args.models).context("configuring models")?;
    let caption = caption_for(&args, &models)?;
    let reference = reference_for(&args)?;

    let request = ArticleRequest {
        caption: caption.as_deref(),
        instruction: args.instruction.trim(),
        language,
        reference: reference.as_deref(),
    };
    let draft = prepare_article(&request);

    println!("== Rencana ==");
    for goal in &draft.plan.goals {
        println!("Tujuan: {goal}");
    }
    for step in &draft.plan.steps {
        println!("Langkah: {step}");
    }
    for question in &draft.plan.questions {
        println!("Pertanyaan: {question}");
    }

    let record = write_article(&request, &draft, &models.generator).context("writing article")?;
    println!("\n== Artikel ==\n{}", record.result);
    Ok(())
}
