pub mod episode;
pub mod library;
pub mod quality;
pub mod result;

pub use episode::EpisodeSpec;
pub use library::{Episode, EpisodeId, MediaFile, MediaFileId, NewMediaFile, Series, SeriesId};
pub use quality::{Quality, QualityTable, QualityType};
pub use result::ParsedCandidate;
