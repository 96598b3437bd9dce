use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{EpisodicError, Result};
use crate::types::{EpisodeSpec, ParsedCandidate, Quality, QualityType, Series};

use super::FilenameParser;

/// Ranges wider than this are treated as misparses (e.g. "S01E01-720").
const MAX_RANGE_SPAN: u32 = 30;

/// Release source keyword, in decreasing precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Bluray,
    BdRip,
    Web,
    Hdtv,
    Dvd,
    Sdtv,
}

/// Fields extracted from a single release name, before any series matching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneRelease {
    /// Show title preceding the episode token, normalized to spaces.
    pub title: Option<String>,
    /// Season and episode numbers, if an `SxxEyy`-style token was found.
    pub episodes: Option<EpisodeSpec>,
    /// Air date, if a `YYYY.MM.DD` token was found.
    pub air_date: Option<NaiveDate>,
    /// Proposed quality.
    pub quality: Quality,
    /// Trailing scene group, e.g. "LOL" in "Show.S01E01.720p-LOL".
    pub release_group: Option<String>,
    /// File extension (without leading dot).
    pub extension: Option<String>,
}

/// Scene-naming parser built on pre-compiled regex patterns.
///
/// Understands `S03E01`, `S03E01E02`, `S03E01-E03`, `3x01`, daily
/// `2012.01.15` dates, and `Season 3/01 - Title.mkv` folder layouts.
pub struct SceneParser {
    re_range: Regex,
    re_multi: Regex,
    re_part: Regex,
    re_cross: Regex,
    re_daily: Regex,
    re_resolution: Regex,
    re_source: Regex,
    re_proper: Regex,
    re_group: Regex,
    re_extension: Regex,
    re_season_folder: Regex,
    re_leading_episode: Regex,
}

impl SceneParser {
    /// Constructs a new `SceneParser` with pre-compiled regex patterns.
    ///
    /// # Errors
    ///
    /// Returns `EpisodicError::RegexError` if any pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_range: Regex::new(r"(?i)\bS(\d{1,2})[ ._-]?E(\d{1,3})-E?(\d{1,3})\b")?,
            re_multi: Regex::new(r"(?i)\bS(\d{1,2})((?:[ ._-]?E\d{1,3})+)\b")?,
            re_part: Regex::new(r"(?i)E(\d{1,3})")?,
            re_cross: Regex::new(r"(?i)\b(\d{1,2})x(\d{2,3})\b")?,
            re_daily: Regex::new(r"\b((?:19|20)\d{2})[.\-_ ](\d{2})[.\-_ ](\d{2})\b")?,
            re_resolution: Regex::new(r"(?i)\b(2160|1080|720|480)[pi]\b")?,
            re_source: Regex::new(
                r"(?i)\b(blu-?ray|bd25|bd50|bdrip|brrip|web-?dl|web-?rip|web|hdtv|pdtv|sdtv|dsr|tvrip|dvd(?:rip|r|5|9)?|xvid|divx)\b",
            )?,
            re_proper: Regex::new(r"(?i)\b(proper|repack|rerip)\b")?,
            re_group: Regex::new(r"-([A-Za-z0-9]+)$")?,
            re_extension: Regex::new(r"\.(\w{2,4})$")?,
            re_season_folder: Regex::new(r"(?i)^(?:season|series|s)[ ._-]*(\d{1,2})$")?,
            re_leading_episode: Regex::new(r"(?i)^(?:e|ep|episode)?[ ._-]*(\d{1,3})\b")?,
        })
    }

    /// Parses a bare release name such as `WEEDS.S03E01.DUAL.dvd.HELLYWOOD.avi`.
    ///
    /// # Errors
    ///
    /// Returns `EpisodicError::EmptyInput` if the input is empty or whitespace-only.
    pub fn parse_name(&self, input: &str) -> Result<SceneRelease> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EpisodicError::EmptyInput);
        }

        let mut release = SceneRelease::default();
        let stem = match self.re_extension.captures(trimmed).and_then(|c| c.get(1)) {
            Some(ext) => {
                release.extension = Some(ext.as_str().to_lowercase());
                &trimmed[..ext.start() - 1]
            }
            None => trimmed,
        };

        release.release_group = self.extract_group(stem);
        release.quality = Quality::new(
            self.extract_quality(trimmed),
            self.re_proper.is_match(trimmed),
        );

        let (episodes, episode_start) = self.extract_episodes(stem);
        release.episodes = episodes;
        let (air_date, date_start) = self.extract_air_date(stem);
        release.air_date = air_date;

        // Title: everything before the first identifying token
        let cut = [episode_start, date_start].into_iter().flatten().min();
        release.title = cut.and_then(|end| clean_title(&stem[..end]));

        Ok(release)
    }

    fn extract_group(&self, stem: &str) -> Option<String> {
        self.re_group
            .captures(stem)
            .map(|c| c[1].to_string())
            .filter(|g| !g.chars().all(|c| c.is_ascii_digit()))
    }

    /// Returns the episode spec and the byte offset where its token starts.
    fn extract_episodes(&self, stem: &str) -> (Option<EpisodeSpec>, Option<usize>) {
        // Try explicit ranges first: "S03E01-06", "S03E01-E06"
        if let Some(caps) = self.re_range.captures(stem) {
            let parsed = (
                caps[1].parse::<u32>(),
                caps[2].parse::<u32>(),
                caps[3].parse::<u32>(),
            );
            if let (Ok(season), Ok(start), Ok(end)) = parsed {
                if start < end && end - start <= MAX_RANGE_SPAN {
                    let numbers: Vec<u32> = (start..=end).collect();
                    let offset = caps.get(0).map(|m| m.start());
                    return (EpisodeSpec::numbered(season, &numbers), offset);
                }
            }
        }

        // Chained parts: "S03E01", "S03E01E02", "S03E01.E02"
        if let Some(caps) = self.re_multi.captures(stem) {
            if let Ok(season) = caps[1].parse::<u32>() {
                let numbers: Vec<u32> = self
                    .re_part
                    .captures_iter(&caps[2])
                    .filter_map(|c| c[1].parse().ok())
                    .collect();
                let offset = caps.get(0).map(|m| m.start());
                return (EpisodeSpec::numbered(season, &numbers), offset);
            }
        }

        // Cross notation: "3x01"
        if let Some(caps) = self.re_cross.captures(stem) {
            if let (Ok(season), Ok(episode)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
                let offset = caps.get(0).map(|m| m.start());
                return (Some(EpisodeSpec::Single { season, episode }), offset);
            }
        }

        (None, None)
    }

    fn extract_air_date(&self, stem: &str) -> (Option<NaiveDate>, Option<usize>) {
        self.re_daily
            .captures(stem)
            .and_then(|c| {
                let year = c[1].parse().ok()?;
                let month = c[2].parse().ok()?;
                let day = c[3].parse().ok()?;
                let date = NaiveDate::from_ymd_opt(year, month, day)?;
                Some((Some(date), c.get(0).map(|m| m.start())))
            })
            .unwrap_or((None, None))
    }

    fn extract_quality(&self, input: &str) -> QualityType {
        let resolution = self
            .re_resolution
            .captures(input)
            .and_then(|c| c[1].parse::<u32>().ok());

        let source = self
            .re_source
            .captures_iter(input)
            .filter_map(|c| classify_source(&c[1]))
            .min_by_key(|s| *s as u8);

        match (source, resolution) {
            (Some(Source::Bluray), Some(2160)) | (Some(Source::BdRip), Some(2160)) => {
                QualityType::Bluray2160p
            }
            (Some(Source::Bluray), Some(1080)) | (Some(Source::BdRip), Some(1080)) => {
                QualityType::Bluray1080p
            }
            (Some(Source::Bluray), _) | (Some(Source::BdRip), Some(720)) => QualityType::Bluray720p,
            (Some(Source::BdRip), _) => QualityType::DVD,
            (Some(Source::Web), Some(2160)) => QualityType::WEBDL2160p,
            (Some(Source::Web), Some(1080)) => QualityType::WEBDL1080p,
            (Some(Source::Web), Some(480)) => QualityType::SDTV,
            (Some(Source::Web), _) => QualityType::WEBDL720p,
            (Some(Source::Hdtv), Some(2160)) | (None, Some(2160)) => QualityType::HDTV2160p,
            (Some(Source::Hdtv), Some(1080)) | (None, Some(1080)) => QualityType::HDTV1080p,
            (Some(Source::Hdtv), Some(720)) | (None, Some(720)) => QualityType::HDTV720p,
            (Some(Source::Hdtv), _) | (Some(Source::Sdtv), _) | (None, Some(480)) => {
                QualityType::SDTV
            }
            (Some(Source::Dvd), _) => QualityType::DVD,
            (None, _) => QualityType::Unknown,
        }
    }

    /// Folder-position inference: `.../Season 3/01 - Title.mkv`.
    fn infer_from_folder(&self, path: &Path, stem: &str) -> Option<EpisodeSpec> {
        let folder = path.parent()?.file_name()?.to_str()?;
        let season: u32 = self
            .re_season_folder
            .captures(folder.trim())
            .and_then(|c| c[1].parse().ok())?;
        let episode: u32 = self
            .re_leading_episode
            .captures(stem.trim())
            .and_then(|c| c[1].parse().ok())?;
        Some(EpisodeSpec::Single { season, episode })
    }
}

impl FilenameParser for SceneParser {
    fn parse(
        &self,
        path: &Path,
        series: &Series,
        scene_source: bool,
    ) -> Result<Option<ParsedCandidate>> {
        let Some(name) = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.trim().is_empty())
        else {
            tracing::debug!(path = %path.display(), "Filename is not readable text");
            return Ok(None);
        };
        let release = self.parse_name(name)?;

        if scene_source {
            // Outside the series folder only the filename can vouch for the series.
            let matches_series = release
                .title
                .as_deref()
                .is_some_and(|title| titles_match(title, &series.title));
            if !matches_series {
                tracing::debug!(
                    path = %path.display(),
                    title = ?release.title,
                    series = %series.title,
                    "scene-sourced file does not name this series"
                );
                return Ok(None);
            }
        }

        let episodes = if series.daily {
            release
                .air_date
                .map(EpisodeSpec::Daily)
                .or_else(|| release.episodes.clone())
        } else {
            release.episodes.clone()
        };

        let episodes = match episodes {
            Some(spec) => Some(spec),
            None if !scene_source => {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
                self.infer_from_folder(path, stem)
            }
            None => None,
        };

        Ok(episodes.map(|episodes| ParsedCandidate {
            path: path.to_path_buf(),
            series_id: series.id,
            title: release.title,
            episodes,
            quality: release.quality,
            release_group: release.release_group,
            scene_source,
        }))
    }
}

fn classify_source(token: &str) -> Option<Source> {
    let token = token.to_lowercase().replace('-', "");
    match token.as_str() {
        "bluray" | "bd25" | "bd50" => Some(Source::Bluray),
        "bdrip" | "brrip" => Some(Source::BdRip),
        "webdl" | "webrip" | "web" => Some(Source::Web),
        "hdtv" => Some(Source::Hdtv),
        s if s.starts_with("dvd") => Some(Source::Dvd),
        "pdtv" | "sdtv" | "dsr" | "tvrip" | "xvid" | "divx" => Some(Source::Sdtv),
        _ => None,
    }
}

/// Replaces separators with spaces and trims dangling punctuation.
fn clean_title(region: &str) -> Option<String> {
    let cleaned = region
        .replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ' ' || c == '[' || c == '(')
        .to_string();

    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Lowercase alphanumerics only, so "Mr. Robot" and "mr_robot" compare equal.
fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Compares a filename title against a series title, tolerating a trailing
/// year on either side ("Doctor Who (2005)" vs "Doctor.Who").
fn titles_match(parsed: &str, series: &str) -> bool {
    let strip_year = |s: &str| {
        let n = normalize_title(s);
        let len = n.len();
        if len > 4 && n[len - 4..].chars().all(|c| c.is_ascii_digit()) {
            let year: u32 = n[len - 4..].parse().unwrap_or(0);
            if (1900..=2100).contains(&year) {
                return n[..len - 4].to_string();
            }
        }
        n
    };
    let parsed = normalize_title(parsed);
    let series = normalize_title(series);
    !parsed.is_empty()
        && (parsed == series
            || strip_year(&parsed) == series
            || strip_year(&series) == parsed
            || strip_year(&parsed) == strip_year(&series))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::types::SeriesId;

    fn parser() -> SceneParser {
        SceneParser::new().unwrap()
    }

    fn series(title: &str, daily: bool) -> Series {
        Series {
            id: SeriesId(1),
            title: title.into(),
            path: PathBuf::from("/tv").join(title),
            daily,
        }
    }

    #[test]
    fn empty_input_errors() {
        let p = parser();
        assert!(matches!(p.parse_name(""), Err(EpisodicError::EmptyInput)));
        assert!(matches!(p.parse_name("   "), Err(EpisodicError::EmptyInput)));
    }

    #[test]
    fn standard_scene_name() {
        let r = parser().parse_name("WEEDS.S03E01.DUAL.dvd.HELLYWOOD.avi").unwrap();
        assert_eq!(r.title.as_deref(), Some("WEEDS"));
        assert_eq!(
            r.episodes,
            Some(EpisodeSpec::Single {
                season: 3,
                episode: 1
            })
        );
        assert_eq!(r.quality, Quality::plain(QualityType::DVD));
        assert_eq!(r.extension.as_deref(), Some("avi"));
    }

    #[test]
    fn multi_episode_chain() {
        let r = parser()
            .parse_name("WEEDS.S03E01E02.DUAL.bluray.x264.AC3.-HELLYWOOD.mkv")
            .unwrap();
        assert_eq!(r.episodes, EpisodeSpec::numbered(3, &[1, 2]));
        assert_eq!(r.quality.kind, QualityType::Bluray720p);
        assert_eq!(r.release_group.as_deref(), Some("HELLYWOOD"));
    }

    #[test]
    fn multi_episode_range() {
        let r = parser()
            .parse_name("WEEDS.S03E01-06.DUAL.BDRip.XviD.AC3.-HELLYWOOD.avi")
            .unwrap();
        assert_eq!(r.episodes, EpisodeSpec::numbered(3, &[1, 2, 3, 4, 5, 6]));
        assert_eq!(r.quality.kind, QualityType::DVD);

        let r = parser().parse_name("Show.S01E01-E03.720p.HDTV.x264-LOL.mkv").unwrap();
        assert_eq!(r.episodes, EpisodeSpec::numbered(1, &[1, 2, 3]));
    }

    #[test]
    fn cross_notation() {
        let r = parser().parse_name("Lost - 2x05 - Orientation.avi").unwrap();
        assert_eq!(
            r.episodes,
            Some(EpisodeSpec::Single {
                season: 2,
                episode: 5
            })
        );
        assert_eq!(r.title.as_deref(), Some("Lost"));
    }

    #[test]
    fn daily_date() {
        let r = parser()
            .parse_name("The.Daily.Show.2012.01.15.720p.HDTV.x264-LOL.mkv")
            .unwrap();
        assert_eq!(r.air_date, NaiveDate::from_ymd_opt(2012, 1, 15));
        assert_eq!(r.title.as_deref(), Some("The Daily Show"));
        assert_eq!(r.quality.kind, QualityType::HDTV720p);
    }

    #[test]
    fn quality_classification() {
        let p = parser();
        for (input, expected) in [
            ("Show.S01E01.HDTV.XviD-LOL.avi", QualityType::SDTV),
            ("Show.S01E01.720p.HDTV.x264-LOL.mkv", QualityType::HDTV720p),
            ("Show.S01E01.1080p.HDTV.x264-LOL.mkv", QualityType::HDTV1080p),
            ("Show.S01E01.720p.WEB-DL.DD5.1.H.264-GRP.mkv", QualityType::WEBDL720p),
            ("Show.S01E01.1080p.WEBRip.x264-GRP.mkv", QualityType::WEBDL1080p),
            ("Show.S01E01.720p.BluRay.x264-GRP.mkv", QualityType::Bluray720p),
            ("Show.S01E01.1080p.BluRay.x264-GRP.mkv", QualityType::Bluray1080p),
            ("Show.S01E01.2160p.BluRay.x265-GRP.mkv", QualityType::Bluray2160p),
            ("Show.S01E01.DVDRip.XviD-GRP.avi", QualityType::DVD),
            ("Show.S01E01.PDTV.XviD-GRP.avi", QualityType::SDTV),
            ("Show.S01E01.1080p.mkv", QualityType::HDTV1080p),
            ("Show.S01E01.mkv", QualityType::Unknown),
        ] {
            let r = p.parse_name(input).unwrap();
            assert_eq!(r.quality.kind, expected, "failed for input: {input}");
        }
    }

    #[test]
    fn proper_and_repack() {
        let p = parser();
        let proper = |name: &str| p.parse_name(name).unwrap().quality.proper;
        assert!(proper("Show.S01E01.PROPER.720p.HDTV.x264-LOL.mkv"));
        assert!(proper("Show.S01E01.REPACK.720p.HDTV.x264-LOL.mkv"));
        assert!(!proper("Show.S01E01.720p.HDTV.x264-LOL.mkv"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_filename_is_not_matched() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let p = parser();
        let s = series("Weeds", false);
        let name = OsStr::from_bytes(b"Weeds.S03E01.\xff.avi");
        let path = Path::new("/tv/Weeds/Season 3").join(name);
        assert!(p.parse(&path, &s, false).unwrap().is_none());
        assert!(p.parse(Path::new("/tv/Weeds/   "), &s, false).unwrap().is_none());
    }

    #[test]
    fn scene_source_requires_matching_title() {
        let p = parser();
        let s = series("30 Rock", false);

        let hit = p
            .parse(Path::new("/unsorted/30.rock.s01e01.pilot.mkv"), &s, true)
            .unwrap()
            .unwrap();
        assert!(hit.scene_source);
        assert_eq!(hit.series_id, SeriesId(1));

        let miss = p
            .parse(Path::new("/unsorted/weeds.s01e01.pilot.mkv"), &s, true)
            .unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn in_library_file_skips_title_check() {
        let p = parser();
        let s = series("30 Rock", false);
        let c = p
            .parse(Path::new("/tv/30 Rock/tr.s01e01.pilot.avi"), &s, false)
            .unwrap()
            .unwrap();
        assert!(!c.scene_source);
        assert_eq!(c.episodes.episode_numbers(), vec![1]);
    }

    #[test]
    fn folder_inference_only_inside_library() {
        let p = parser();
        let s = series("Weeds", false);
        let path = Path::new("/tv/Weeds/Season 3/01 - Doing the Back Stroke.avi");

        let c = p.parse(path, &s, false).unwrap().unwrap();
        assert_eq!(
            c.episodes,
            EpisodeSpec::Single {
                season: 3,
                episode: 1
            }
        );

        assert!(p.parse(path, &s, true).unwrap().is_none());
    }

    #[test]
    fn daily_series_prefers_air_date() {
        let p = parser();
        let s = series("The Daily Show", true);
        let c = p
            .parse(Path::new("/tv/The Daily Show/The.Daily.Show.2012.01.15.HDTV.avi"), &s, false)
            .unwrap()
            .unwrap();
        assert_eq!(c.episodes, EpisodeSpec::Daily(NaiveDate::from_ymd_opt(2012, 1, 15).unwrap()));

        let s = series("The Daily Show", false);
        let none = p
            .parse(Path::new("/tv/The Daily Show/The.Daily.Show.2012.01.15.HDTV.avi"), &s, false)
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn unparsable_name_yields_none() {
        let p = parser();
        let s = series("Weeds", false);
        assert!(p.parse(Path::new("/tv/Weeds/WEEDS.avi"), &s, false).unwrap().is_none());
    }

    #[test]
    fn title_matching_tolerates_years_and_punctuation() {
        assert!(titles_match("Doctor Who 2005", "Doctor Who"));
        assert!(titles_match("Doctor Who", "Doctor Who (2005)"));
        assert!(titles_match("Mr Robot", "Mr. Robot"));
        assert!(!titles_match("Weeds", "30 Rock"));
        assert!(!titles_match("", "30 Rock"));
    }

    #[test]
    fn special_detection_from_name() {
        let r = parser().parse_name("30.rock.s00e01.pre-pilot.avi").unwrap();
        assert!(r.episodes.unwrap().is_special());
    }
}
