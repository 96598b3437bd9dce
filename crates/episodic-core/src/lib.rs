//! # Episodic Core
//!
//! Import decision engine for episodic media libraries. Given a file on disk
//! and the series it may belong to, decides whether it becomes the current
//! file of one or more catalog episodes, and which older files it replaces.
//!
//! ## Quick Start
//!
//! ```rust
//! use episodic_core::parser::SceneParser;
//! use episodic_core::types::{EpisodeSpec, QualityType};
//!
//! let parser = SceneParser::new().unwrap();
//! let release = parser.parse_name("Weeds.S03E01.720p.HDTV.x264-LOL.mkv").unwrap();
//!
//! assert_eq!(release.title.as_deref(), Some("Weeds"));
//! assert_eq!(release.episodes, Some(EpisodeSpec::Single { season: 3, episode: 1 }));
//! assert_eq!(release.quality.kind, QualityType::HDTV720p);
//! assert_eq!(release.release_group.as_deref(), Some("LOL"));
//! ```
pub mod catalog;
pub mod config;
pub mod disk;
pub mod error;
pub mod import;
pub mod parser;
pub mod probe;
pub mod scan;
pub mod types;

// Re-export primary API
pub use catalog::{Catalog, MemoryCatalog, NewEpisode, NewSeries, SqliteCatalog};
pub use config::ImportConfig;
pub use disk::{DiskProvider, LocalDisk, RecycleBin};
pub use error::{EpisodicError, Result};
pub use import::{Decision, ImportOutcome, ImportService};
pub use parser::{FilenameParser, SceneParser, SceneRelease};
pub use probe::{FfprobeProber, RuntimeProber};
pub use scan::{LibraryScanner, ScanReport};
pub use types::{
    Episode, EpisodeId, EpisodeSpec, MediaFile, MediaFileId, NewMediaFile, ParsedCandidate,
    Quality, QualityTable, QualityType, Series, SeriesId,
};
