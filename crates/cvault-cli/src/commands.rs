use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use cvault_history::{CvHistory, CvVersion, DirectorySink, HistoryConfig, VersionMetadata};
use cvault_store::FileSessionStorage;
use cvault_types::JobId;
use serde_json::Value;

use crate::cli::*;

type History = CvHistory<FileSessionStorage>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let session_dir = cli.session_dir.clone().unwrap_or_else(default_session_dir);

    if let Command::EndSession(_) = cli.command {
        return cmd_end_session(&session_dir);
    }

    let config = match &cli.config {
        Some(path) => HistoryConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => HistoryConfig::default(),
    };
    let storage = FileSessionStorage::open(&session_dir)
        .with_context(|| format!("failed to open session at {}", session_dir.display()))?;
    let history = CvHistory::with_config(storage, &config)?;
    let format = cli.format;

    match cli.command {
        Command::Save(args) => cmd_save(&history, args, &format),
        Command::List(_) => cmd_list(&history, &format),
        Command::Show(args) => match history.get_version(args.id) {
            Some(version) => print_version(&version, &format),
            None => bail!("no CV version with id {}", args.id),
        },
        Command::Latest(_) => match history.get_latest() {
            Some(version) => print_version(&version, &format),
            None => {
                println!("No saved versions.");
                Ok(())
            }
        },
        Command::Delete(args) => cmd_delete(&history, args),
        Command::Clear(_) => {
            history.clear_all();
            println!("{} Cleared all CV versions.", "✓".green());
            Ok(())
        }
        Command::Export(args) => cmd_export(&history, args),
        Command::History(_) => cmd_history(&history, &format),
        Command::Stats(_) => cmd_stats(&history, &format),
        Command::EndSession(_) => unreachable!("handled before the session is opened"),
    }
}

fn default_session_dir() -> PathBuf {
    std::env::temp_dir().join("cvault-session")
}

fn cmd_save(history: &History, args: SaveArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let cv = read_cv(&args.file)?;
    let metadata = build_metadata(&args);
    let style = metadata.style.clone();

    let Some(id) = history.save_version(&cv, metadata) else {
        bail!("CV version was not saved; rerun with --verbose for details");
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "id": id })),
        OutputFormat::Text => {
            println!("{} Saved CV version {}", "✓".green().bold(), id.to_string().yellow());
            println!("  Style: {}", style.cyan());
            println!("  Versions: {}/{}", history.list_versions().len(), history.max_versions());
        }
    }
    Ok(())
}

fn read_cv(path: &Path) -> anyhow::Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read CV from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

pub(crate) fn build_metadata(args: &SaveArgs) -> VersionMetadata {
    let mut metadata = VersionMetadata::default().with_sections(args.sections.iter().cloned());
    if let Some(style) = &args.style {
        metadata = metadata.with_style(style.as_str());
    }
    if let Some(title) = &args.job_title {
        metadata = metadata.with_job_title(title.as_str());
    }
    if let Some(job_id) = &args.job_id {
        metadata.job_id = Some(match job_id.parse::<u64>() {
            Ok(n) => JobId::from(n),
            Err(_) => JobId::from(job_id.as_str()),
        });
    }
    for (key, raw) in &args.meta {
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
        metadata = metadata.with_extra(key.as_str(), value);
    }
    metadata
}

fn cmd_list(history: &History, format: &OutputFormat) -> anyhow::Result<()> {
    let versions = history.list_versions();
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }
    if versions.is_empty() {
        println!("No saved versions.");
        return Ok(());
    }
    for (i, v) in versions.iter().enumerate() {
        let marker = if i == 0 { "*".green().bold() } else { " ".normal() };
        println!(
            "{} {}  {}  {}  {}",
            marker,
            v.id.to_string().yellow(),
            cvault_types::to_iso_millis(&v.timestamp).dimmed(),
            v.metadata.style.cyan(),
            v.metadata.job_title.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn print_version(version: &CvVersion, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(version)?),
        OutputFormat::Text => {
            println!("Version {}", version.id.to_string().yellow().bold());
            println!("  Saved: {}", cvault_types::to_iso_millis(&version.timestamp));
            println!("  Style: {}", version.metadata.style.cyan());
            if let Some(title) = &version.metadata.job_title {
                println!("  Job: {title}");
            }
            if let Some(job_id) = &version.metadata.job_id {
                println!("  Job id: {job_id}");
            }
            if !version.metadata.sections.is_empty() {
                println!("  Sections: {}", version.metadata.sections.join(", "));
            }
            println!("{}", serde_json::to_string_pretty(&version.cv_content)?);
        }
    }
    Ok(())
}

fn cmd_delete(history: &History, args: DeleteArgs) -> anyhow::Result<()> {
    if !history.try_delete_version(args.id)? {
        bail!("no CV version with id {}", args.id);
    }
    println!("Deleted CV version {}", args.id.to_string().yellow());
    Ok(())
}

fn cmd_export(history: &History, args: ExportArgs) -> anyhow::Result<()> {
    let Some(version) = history.get_version(args.id) else {
        bail!("no CV version with id {}", args.id);
    };
    let sink = DirectorySink::new(&args.out);
    if !history.export_version(args.id, &sink) {
        bail!("failed to export CV version {}", args.id);
    }
    let path = sink.path_for(&version.export_file_name())?;
    println!("{} Exported to {}", "✓".green().bold(), path.display().to_string().bold());
    Ok(())
}

fn cmd_history(history: &History, format: &OutputFormat) -> anyhow::Result<()> {
    let summaries = history.summaries();
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("No saved versions.");
        return Ok(());
    }
    for s in &summaries {
        println!(
            "{}  {:<16} {:<14} {} ({} sections)",
            s.id.to_string().yellow(),
            s.relative_age,
            s.style.cyan(),
            s.job_title,
            s.sections_count,
        );
    }
    Ok(())
}

fn cmd_stats(history: &History, format: &OutputFormat) -> anyhow::Result<()> {
    let stats = history.storage_stats();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => {
            println!("Versions: {}/{}", stats.total_versions.to_string().bold(), stats.max_versions);
            println!("Storage used: {} KB", stats.storage_used_kb);
            println!("Newest: {}", stats.newest_timestamp.as_deref().unwrap_or("-"));
            println!("Oldest: {}", stats.oldest_timestamp.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}

fn cmd_end_session(session_dir: &Path) -> anyhow::Result<()> {
    FileSessionStorage::open(session_dir)?.destroy()?;
    println!("{} Session ended; storage at {} discarded.", "✓".green(), session_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use cvault_store::SessionStorage;
    use serde_json::json;
    use tempfile::TempDir;

    fn run(session: &Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["cvault", "--session-dir", session.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    fn save_args(extra: &[&str]) -> SaveArgs {
        let mut argv = vec!["cvault", "save", "-f", "cv.json"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Save(args) => args,
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn metadata_defaults_without_flags() {
        let meta = build_metadata(&save_args(&[]));
        assert_eq!(meta, VersionMetadata::default());
    }

    #[test]
    fn metadata_from_flags() {
        let meta = build_metadata(&save_args(&[
            "--style", "creative", "--job-id", "77", "--meta", "atsScore=91", "--meta", "note=hello",
        ]));
        assert_eq!(meta.style, "creative");
        assert_eq!(meta.job_id, Some(JobId::from(77u64)));
        assert_eq!(meta.extra.get("atsScore"), Some(&json!(91)));
        assert_eq!(meta.extra.get("note"), Some(&json!("hello")));
    }

    #[test]
    fn textual_job_id_stays_text() {
        let meta = build_metadata(&save_args(&["--job-id", "job-17"]));
        assert_eq!(meta.job_id, Some(JobId::from("job-17")));
    }

    #[test]
    fn save_export_delete_end_to_end() {
        let dir = TempDir::new().unwrap();
        let session = dir.path().join("session");
        let cv_path = dir.path().join("cv.json");
        std::fs::write(&cv_path, r#"{"name": "Jane"}"#).unwrap();

        run(&session, &["save", "-f", cv_path.to_str().unwrap(), "--style", "creative"]).unwrap();

        let storage = FileSessionStorage::open(&session).unwrap();
        let history = CvHistory::new(storage);
        let latest = history.get_latest().unwrap();
        assert_eq!(latest.cv_content, json!({"name": "Jane"}));
        let id = latest.id.to_string();

        let out = dir.path().join("exports");
        run(&session, &["export", &id, "--out", out.to_str().unwrap()]).unwrap();
        assert!(out.join(format!("cv_creative_{id}.json")).is_file());

        run(&session, &["history"]).unwrap();
        run(&session, &["--format", "json", "stats"]).unwrap();

        run(&session, &["delete", &id]).unwrap();
        assert!(run(&session, &["delete", &id]).is_err());
        assert!(history.list_versions().is_empty());

        run(&session, &["end-session"]).unwrap();
        assert!(!session.exists());
    }

    #[test]
    fn show_unknown_id_fails() {
        let dir = TempDir::new().unwrap();
        assert!(run(dir.path(), &["show", "123"]).is_err());
    }

    #[test]
    fn save_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let cv_path = dir.path().join("cv.json");
        std::fs::write(&cv_path, "not json").unwrap();
        assert!(run(&dir.path().join("s"), &["save", "-f", cv_path.to_str().unwrap()]).is_err());
    }

    #[test]
    fn clear_removes_stored_value() {
        let dir = TempDir::new().unwrap();
        let session = dir.path().join("session");
        let cv_path = dir.path().join("cv.json");
        std::fs::write(&cv_path, "{}").unwrap();
        run(&session, &["save", "-f", cv_path.to_str().unwrap()]).unwrap();
        run(&session, &["clear"]).unwrap();

        let storage = FileSessionStorage::open(&session).unwrap();
        assert!(!storage.contains_key(cvault_history::DEFAULT_STORAGE_KEY).unwrap());
    }
}
