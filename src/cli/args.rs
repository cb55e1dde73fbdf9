use clap::Parser;
use std::path::PathBuf;

/// Drive folder the survey drone uploads into.
pub const DEFAULT_FOLDER_ID: &str = "1G0Pi9LF9rAHa9nWKO-EInp1MkgYx_wkM";

/// Analyzes recent drone photos of an archaeological site and builds a
/// narrated slideshow.
#[derive(Parser, Debug)]
#[command(name = "archaeology-agent")]
#[command(about = "Analyzes drone photos and creates narrated presentations")]
#[command(version)]
pub struct CliArgs {
    /// How many recent images to download and analyze (example: 3)
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub num_images: u32,

    /// OpenAI API key
    #[arg(long = "openai-key", alias = "api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_key: Option<String>,

    /// Google Drive folder holding the drone photos
    #[arg(long, env = "DRIVE_FOLDER_ID", default_value = DEFAULT_FOLDER_ID)]
    pub folder_id: String,

    /// Where the narration audio and the presentation are written
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Do not open the presentation when done
    #[arg(long)]
    pub no_browser: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_images_is_rejected() {
        assert!(CliArgs::try_parse_from(["archaeology-agent", "0"]).is_err());
    }

    #[test]
    fn test_flags() {
        let args = CliArgs::try_parse_from([
            "archaeology-agent",
            "3",
            "--api-key",
            "sk-test",
            "--folder-id",
            "folder42",
            "--output-dir",
            "out",
            "--no-browser",
        ])
        .unwrap();

        assert_eq!(args.num_images, 3);
        assert_eq!(args.openai_key.as_deref(), Some("sk-test"));
        assert_eq!(args.folder_id, "folder42");
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert!(args.no_browser);
    }

    #[test]
    fn test_defaults() {
        if std::env::var("DRIVE_FOLDER_ID").is_ok() {
            return;
        }
        let args = CliArgs::try_parse_from(["archaeology-agent", "1"]).unwrap();

        assert_eq!(args.folder_id, DEFAULT_FOLDER_ID);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(!args.no_browser);
    }
}
