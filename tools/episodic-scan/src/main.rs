//! Episodic Scan Tool
//!
//! Maintains a SQLite catalog of series and episodes and imports video files
//! into it through the episodic-core decision engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use episodic_core::{
    Catalog, FfprobeProber, ImportConfig, ImportOutcome, ImportService, LibraryScanner, LocalDisk,
    NewEpisode, NewSeries, RecycleBin, SceneParser, SeriesId, SqliteCatalog,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Default catalog location
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("episodic")
        .join("catalog.db")
}

/// CLI arguments
#[derive(Parser)]
#[command(name = "episodic-scan")]
#[command(about = "Scan and import episodic media files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog database file
    #[arg(short, long, env = "EPISODIC_DB")]
    database: Option<PathBuf>,

    /// Import configuration (JSON)
    #[arg(short, long, env = "EPISODIC_CONFIG")]
    config: Option<PathBuf>,

    /// Move replaced files here instead of deleting them
    #[arg(short, long, env = "EPISODIC_RECYCLE_BIN")]
    recycle_bin: Option<PathBuf>,

    /// ffprobe executable used for runtime checks
    #[arg(long, env = "EPISODIC_FFPROBE", default_value = "ffprobe")]
    ffprobe: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a series and its library folder
    AddSeries {
        title: String,
        path: PathBuf,
        /// Episodes are addressed by air date
        #[arg(long)]
        daily: bool,
    },
    /// Register an episode of a series
    AddEpisode {
        series_id: i64,
        season: u32,
        number: u32,
        /// Air date (YYYY-MM-DD), for daily series
        #[arg(long)]
        air_date: Option<NaiveDate>,
    },
    /// Import a file, or every video file below a directory
    Import { series_id: i64, path: PathBuf },
    /// Scan series library folders
    Scan {
        /// Only scan this series
        #[arg(short, long)]
        series: Option<i64>,
        /// Drop catalog records whose files are gone before scanning
        #[arg(long)]
        clean: bool,
    },
    /// Show series and episode coverage
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ImportConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ImportConfig::default(),
    };
    if let Some(dir) = cli.recycle_bin {
        config = config.with_recycle_bin(dir);
    }

    let db_path = cli.database.unwrap_or_else(default_database_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let catalog = Arc::new(
        SqliteCatalog::open(&db_path)
            .with_context(|| format!("Failed to open catalog {}", db_path.display()))?,
    );
    info!(database = %db_path.display(), "Catalog ready");

    let prober = FfprobeProber::with_ffprobe_path(cli.ffprobe);
    if !prober.is_available() {
        warn!("ffprobe not found; undersized files will be rejected");
    }

    let service = build_service(config, catalog, prober)?;
    run(cli.command, &service)
}

fn build_service(
    config: ImportConfig,
    catalog: Arc<dyn Catalog>,
    prober: FfprobeProber,
) -> Result<ImportService> {
    let disk = match &config.recycle_bin {
        Some(dir) => LocalDisk::with_recycle_bin(RecycleBin::new(dir)),
        None => LocalDisk::new(),
    };
    let parser = SceneParser::new().context("Failed to build filename parser")?;
    Ok(ImportService::new(
        config,
        Arc::new(parser),
        catalog,
        Arc::new(disk),
        Arc::new(prober),
    ))
}

fn run(command: Commands, service: &ImportService) -> Result<()> {
    let catalog = service.catalog();

    match command {
        Commands::AddSeries { title, path, daily } => {
            let path = canonical(&path)?;
            let series = catalog.add_series(NewSeries { title, path, daily })?;
            println!("Added series {} ({}) at {}", series.id, series.title, series.path.display());
        }
        Commands::AddEpisode {
            series_id,
            season,
            number,
            air_date,
        } => {
            let episode = catalog.add_episode(NewEpisode {
                series_id: SeriesId(series_id),
                season,
                number,
                air_date,
            })?;
            println!(
                "Added episode {} (S{:02}E{:02}) to series {}",
                episode.id, episode.season, episode.number, episode.series_id
            );
        }
        Commands::Import { series_id, path } => {
            let series = catalog
                .series(SeriesId(series_id))?
                .with_context(|| format!("No series with id {series_id}"))?;
            let path = canonical(&path)?;
            if path.is_dir() {
                let report = LibraryScanner::new(service).scan_directory(&series, &path);
                println!("{report}");
            } else {
                let outcome = service
                    .import_file(&series, &path)
                    .with_context(|| format!("Failed to import {}", path.display()))?;
                println!("{}", describe(&path, &outcome));
            }
        }
        Commands::Scan { series, clean } => {
            let scanner = LibraryScanner::new(service);
            let targets = match series {
                Some(id) => vec![
                    catalog
                        .series(SeriesId(id))?
                        .with_context(|| format!("No series with id {id}"))?,
                ],
                None => catalog.all_series()?,
            };
            if targets.is_empty() {
                bail!("No series registered; add one with add-series");
            }

            let mut total = episodic_core::ScanReport::default();
            for series in &targets {
                if clean {
                    let removed = scanner.clean_missing(series)?;
                    if removed > 0 {
                        println!("{}: removed {removed} missing file(s)", series.title);
                    }
                }
                let report = scanner.scan_series(series);
                println!("{}: {report}", series.title);
                total.merge(&report);
            }
            if targets.len() > 1 {
                println!("Total: {total}");
            }
        }
        Commands::Status => {
            for series in catalog.all_series()? {
                let episodes = catalog.episodes_for_series(series.id)?;
                let missing = episodes.iter().filter(|e| e.is_missing()).count();
                println!(
                    "[{}] {}{} - {} episodes, {} missing - {}",
                    series.id,
                    series.title,
                    if series.daily { " (daily)" } else { "" },
                    episodes.len(),
                    missing,
                    series.path.display()
                );
            }
        }
    }

    Ok(())
}

/// Absolute form of a user-supplied path, matching what a scan registers.
fn canonical(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).with_context(|| format!("Failed to resolve {}", path.display()))
}

fn describe(path: &Path, outcome: &ImportOutcome) -> String {
    let name = path.display();
    match outcome {
        ImportOutcome::Imported(file) => {
            format!("Imported {name} as {} (file {})", file.quality, file.id)
        }
        ImportOutcome::AlreadyExists => format!("Already registered: {name}"),
        ImportOutcome::Rejected { size, runtime_secs } => {
            format!("Rejected {name}: {size} bytes, {runtime_secs}s runtime")
        }
        ImportOutcome::NotParsed => format!("Could not identify {name}"),
        ImportOutcome::NoEpisodes(candidate) => {
            format!("No catalog episodes for {} in {name}", candidate.episodes)
        }
        ImportOutcome::Skipped(candidate) => {
            format!("Skipped {name}: existing files at least {}", candidate.quality)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(catalog: Arc<SqliteCatalog>) -> ImportService {
        // Size threshold zero: tiny test files pass without ffprobe.
        let config = ImportConfig::default().with_min_file_size(0);
        build_service(
            config,
            catalog,
            FfprobeProber::with_ffprobe_path("/nonexistent/ffprobe"),
        )
        .unwrap()
    }

    #[test]
    fn test_default_database_path() {
        let path = default_database_path();
        assert!(path.ends_with("episodic/catalog.db"));
    }

    #[test]
    fn test_add_and_import() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Weeds");
        std::fs::create_dir_all(&root).unwrap();
        let file = root.join("Weeds.S03E01.DVDRip.XviD-HELLYWOOD.avi");
        std::fs::write(&file, b"episode").unwrap();

        let catalog = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let service = service(catalog.clone());

        run(
            Commands::AddSeries {
                title: "Weeds".into(),
                path: root.clone(),
                daily: false,
            },
            &service,
        )
        .unwrap();
        let series = catalog.all_series().unwrap().remove(0);
        run(
            Commands::AddEpisode {
                series_id: series.id.0,
                season: 3,
                number: 1,
                air_date: None,
            },
            &service,
        )
        .unwrap();
        run(
            Commands::Import {
                series_id: series.id.0,
                path: file.clone(),
            },
            &service,
        )
        .unwrap();

        let file = std::fs::canonicalize(&file).unwrap();
        assert!(catalog.media_file_exists(&file).unwrap());
        run(Commands::Status, &service).unwrap();
    }

    #[test]
    fn test_import_resolves_indirect_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Weeds");
        std::fs::create_dir_all(root.join("Season 3")).unwrap();
        let file = root.join("Season 3").join("Weeds.S03E02.DVDRip.XviD-HELLYWOOD.avi");
        std::fs::write(&file, b"episode").unwrap();

        let catalog = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let service = service(catalog.clone());
        let series = catalog
            .add_series(NewSeries {
                title: "Weeds".into(),
                path: std::fs::canonicalize(&root).unwrap(),
                daily: false,
            })
            .unwrap();
        catalog
            .add_episode(NewEpisode {
                series_id: series.id,
                season: 3,
                number: 2,
                air_date: None,
            })
            .unwrap();

        let indirect = root
            .join("Season 3")
            .join("..")
            .join("Season 3")
            .join("Weeds.S03E02.DVDRip.XviD-HELLYWOOD.avi");
        run(
            Commands::Import {
                series_id: series.id.0,
                path: indirect.clone(),
            },
            &service,
        )
        .unwrap();

        let stored = catalog.media_files_for_series(series.id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].path, std::fs::canonicalize(&file).unwrap());
        assert!(!catalog.media_file_exists(&indirect).unwrap());
    }

    #[test]
    fn test_import_missing_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let series = catalog
            .add_series(NewSeries {
                title: "Weeds".into(),
                path: dir.path().to_path_buf(),
                daily: false,
            })
            .unwrap();
        let result = run(
            Commands::Import {
                series_id: series.id.0,
                path: dir.path().join("gone.avi"),
            },
            &service(catalog),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_series() {
        let catalog = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let result = run(
            Commands::Import {
                series_id: 42,
                path: PathBuf::from("/tmp/x.mkv"),
            },
            &service(catalog),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_describe() {
        let text = describe(
            Path::new("a.mkv"),
            &ImportOutcome::Rejected {
                size: 10,
                runtime_secs: 3,
            },
        );
        assert_eq!(text, "Rejected a.mkv: 10 bytes, 3s runtime");
    }
}
