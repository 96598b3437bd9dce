use std::path::Path;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use episodic_core::parser::{FilenameParser, SceneParser};
use episodic_core::types::{Series, SeriesId};

fn bench_scene_parse(c: &mut Criterion) {
    let parser = SceneParser::new().unwrap();

    let inputs = vec![
        "Weeds.S03E01.720p.HDTV.x264-LOL.mkv",
        "WEEDS.S03E01-06.DUAL.XviD.Bluray.AC3-REPACK.-HELLYWOOD.avi",
        "The.Daily.Show.2012.01.15.Guest.Name.HDTV.XviD-AFG.avi",
        "30.Rock.S01E01E02.PROPER.1080p.WEB-DL.DD5.1.H.264-NTb.mkv",
        "Doctor.Who.2005.3x07.480p.WEBRip-ION10.mp4",
    ];

    c.bench_function("scene_parse_single", |b| {
        b.iter(|| parser.parse_name(black_box(inputs[0])).unwrap());
    });

    c.bench_function("scene_parse_batch_5", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = parser.parse_name(black_box(input)).unwrap();
            }
        });
    });

    let series = Series {
        id: SeriesId(1),
        title: "Weeds".into(),
        path: "/tv/Weeds".into(),
        daily: false,
    };
    let path = Path::new("/downloads/Weeds.S03E01.720p.HDTV.x264-LOL.mkv");
    c.bench_function("scene_parse_candidate", |b| {
        b.iter(|| parser.parse(black_box(path), &series, true).unwrap());
    });
}

criterion_group!(benches, bench_scene_parse);
criterion_main!(benches);
