// The composition root: wire infra implementations into the core services
// and walk through the five steps of a survey run.

use super::args::CliArgs;
use super::settings::Settings;
use crate::core::drive::{DriveService, DriveSource};
use crate::core::pipeline::{FormatNormalizer, PipelineService};
use crate::core::presentation::create_presentation;
use crate::core::speech::SpeechService;
use crate::infra::browser::open_in_browser;
use crate::infra::converters::default_converters;
use crate::infra::google_drive::{GoogleAuth, GoogleDriveClient};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Output file names share one timestamp so a run's files sort together.
pub fn output_paths(output_dir: &Path, timestamp: &str) -> (PathBuf, PathBuf) {
    (
        output_dir.join(format!("archaeological_narration_{}.mp3", timestamp)),
        output_dir.join(format!("presentation_{}.html", timestamp)),
    )
}

pub async fn run(args: CliArgs) -> Result<()> {
    // Setup errors come first so nothing is downloaded on a broken config.
    let settings = Settings::from_env(args.openai_key.clone())?;

    let auth = GoogleAuth::from_source(&settings.drive_credentials)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Google Drive credentials are not set up")?;

    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| format!("Cannot create output directory {}", args.output_dir.display()))?;

    let scratch = tempfile::Builder::new()
        .prefix("archaeological_agent_")
        .tempdir()
        .context("Failed to create a temporary directory")?;

    println!("\n{}", RULE);
    println!("Archaeological Site AI Agent");
    println!("{}\n", RULE);

    let drive = DriveService::new(GoogleDriveClient::new(auth));
    let result = survey(&args, &settings, &drive, scratch.path()).await;

    match scratch.close() {
        Ok(()) => println!("\n✓ Cleaned up temporary files"),
        Err(e) => tracing::warn!("Could not clean up temporary files: {}", e),
    }

    result
}

/// An empty download is reported and ends the run without an error.
async fn survey<D: DriveSource>(
    args: &CliArgs,
    settings: &Settings,
    drive: &DriveService<D>,
    scratch: &Path,
) -> Result<()> {
    // Step 1: download
    println!(
        "Step 1: Downloading {} most recent image(s) from Google Drive...",
        args.num_images
    );
    let image_paths = drive
        .download_recent_images(&args.folder_id, args.num_images as usize, scratch)
        .await
        .context("Could not list the Drive folder")?;

    if image_paths.is_empty() {
        tracing::error!(folder = %args.folder_id, "No images downloaded");
        println!("Error: No images downloaded!");
        return Ok(());
    }

    // Step 2: analyze
    println!("\nStep 2: Analyzing images for artifacts...");
    let provider = settings.ai.build_provider();
    tracing::info!(model = %settings.ai.model, "Using {:?} model backend", settings.ai.backend);

    let normalizer = FormatNormalizer::new(default_converters(settings.conversion_timeout));
    let pipeline = PipelineService::new(normalizer, provider, &settings.ai.model);
    let output = pipeline.run(&image_paths).await;

    if !output.artifacts.is_empty() {
        println!("\nArtifacts identified:");
        for artifact in &output.artifacts {
            println!("  - {}", artifact.name);
        }
    }

    println!("\nGenerated Presentation Script:");
    println!("{}", THIN_RULE);
    println!("{}", output.narration);
    println!("{}\n", THIN_RULE);

    // Step 3: narrate
    println!("Step 3: Generating audio narration...");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let (audio_path, presentation_path) = output_paths(&args.output_dir, &timestamp);

    let speech = SpeechService::new(
        settings.speech.build_synthesizer(),
        settings.speech.lang.clone(),
        settings.speech.slow,
    );
    let audio_created = match speech.narrate_to_file(&output.narration, &audio_path).await {
        Ok(()) => {
            println!("✓ Audio file created: {}", audio_path.display());
            true
        }
        Err(e) => {
            tracing::error!("Error generating audio: {}", e);
            false
        }
    };

    // Step 4: slideshow
    println!("\nStep 4: Creating presentation with images and audio...");
    let presentation = create_presentation(&output.normalized_paths, &audio_path, &presentation_path)
        .await
        .context("Failed to write the presentation")?;

    // Step 5: browser
    if args.no_browser {
        println!("\nStep 5: Skipping browser (--no-browser)");
    } else {
        println!("\nStep 5: Opening presentation in browser...");
        if let Err(e) = open_in_browser(&presentation).await {
            tracing::warn!("Could not open browser: {}", e);
            println!("Please open this file manually: {}", presentation.display());
        }
    }

    println!("\n{}", RULE);
    println!("✓ All done! The presentation is ready!");
    println!("{}", RULE);
    println!("\nFiles created:");
    if audio_created {
        println!("  - Audio: {}", audio_path.display());
    }
    println!("  - Presentation: {}", presentation.display());
    println!(
        "\nAnalyzed {} of {} image(s). Navigate with the arrow keys; Enter plays the narration.",
        output.analyzed_count,
        image_paths.len()
    );

    Ok(())
}
