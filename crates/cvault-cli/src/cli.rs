use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cvault_types::VersionId;

#[derive(Parser)]
#[command(
    name = "cvault",
    about = "cvault — session-scoped history of generated CVs",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Directory holding this session's storage
    #[arg(long, global = true)]
    pub session_dir: Option<PathBuf>,

    /// TOML file with storage_key, obfuscation_key and max_versions
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Save a generated CV as the newest version
    Save(SaveArgs),
    /// List stored versions, newest first
    List(ListArgs),
    /// Show one version
    Show(ShowArgs),
    /// Show the newest version
    Latest(LatestArgs),
    /// Delete one version
    Delete(DeleteArgs),
    /// Delete every version
    Clear(ClearArgs),
    /// Write a version to cv_{style}_{id}.json
    Export(ExportArgs),
    /// Show version summaries with relative ages
    History(HistoryArgs),
    /// Show storage usage
    Stats(StatsArgs),
    /// End the session and discard its storage
    EndSession(EndSessionArgs),
}

#[derive(Args)]
pub struct SaveArgs {
    /// JSON file with the CV content ("-" reads stdin)
    #[arg(short, long)]
    pub file: PathBuf,
    #[arg(long)]
    pub style: Option<String>,
    #[arg(long)]
    pub job_title: Option<String>,
    #[arg(long)]
    pub job_id: Option<String>,
    #[arg(long = "section")]
    pub sections: Vec<String>,
    /// Extra metadata as key=value; values that parse as JSON are kept typed
    #[arg(long = "meta", value_parser = parse_key_val)]
    pub meta: Vec<(String, String)>,
}

#[derive(Args)]
pub struct ListArgs {}

#[derive(Args)]
pub struct ShowArgs {
    pub id: VersionId,
}

#[derive(Args)]
pub struct LatestArgs {}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: VersionId,
}

#[derive(Args)]
pub struct ClearArgs {}

#[derive(Args)]
pub struct ExportArgs {
    pub id: VersionId,
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct HistoryArgs {}

#[derive(Args)]
pub struct StatsArgs {}

#[derive(Args)]
pub struct EndSessionArgs {}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_save() {
        let cli = Cli::try_parse_from([
            "cvault", "save", "-f", "cv.json", "--style", "modern", "--job-title", "Engineer",
            "--section", "summary", "--section", "skills", "--meta", "atsScore=91",
        ])
        .unwrap();
        if let Command::Save(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("cv.json"));
            assert_eq!(args.style, Some("modern".into()));
            assert_eq!(args.job_title, Some("Engineer".into()));
            assert_eq!(args.sections, vec!["summary", "skills"]);
            assert_eq!(args.meta, vec![("atsScore".to_string(), "91".to_string())]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_save_requires_file() {
        assert!(Cli::try_parse_from(["cvault", "save"]).is_err());
    }

    #[test]
    fn parse_bad_meta() {
        assert!(Cli::try_parse_from(["cvault", "save", "-f", "x", "--meta", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["cvault", "save", "-f", "x", "--meta", "=v"]).is_err());
    }

    #[test]
    fn parse_show() {
        let cli = Cli::try_parse_from(["cvault", "show", "1700000000000"]).unwrap();
        if let Command::Show(args) = cli.command {
            assert_eq!(args.id, VersionId::from_millis(1_700_000_000_000));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_show_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["cvault", "show", "latest"]).is_err());
    }

    #[test]
    fn parse_export_default_out() {
        let cli = Cli::try_parse_from(["cvault", "export", "42"]).unwrap();
        if let Command::Export(args) = cli.command {
            assert_eq!(args.out, PathBuf::from("."));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_end_session() {
        let cli = Cli::try_parse_from(["cvault", "end-session"]).unwrap();
        assert!(matches!(cli.command, Command::EndSession(_)));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "cvault", "--format", "json", "--session-dir", "/tmp/s", "-v", "stats",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.session_dir, Some(PathBuf::from("/tmp/s")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Stats(_)));
    }
}
