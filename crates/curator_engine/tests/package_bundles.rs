use std::collections::BTreeMap;
use std::fs;

use curator_engine::{
    build_bundles, Asset, Bucket, DataLayout, DecodeProbe, ItemRecord, JsonlWriter, Provenance,
};
use pretty_assertions::assert_eq;

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).expect("encode png");
    out.into_inner()
}

fn asset(file_name: &str) -> Asset {
    Asset {
        file_name: file_name.to_string(),
        original_url: format!("https://museum.example/media/{file_name}"),
        raw_caption: "caption".to_string(),
        file_size_bytes: 1,
        width: None,
        height: None,
    }
}

fn record(id: &str) -> ItemRecord {
    ItemRecord {
        id: id.to_string(),
        source_name: "Museum".to_string(),
        source_type: "primary".to_string(),
        original_url: format!("https://museum.example/photographs/{id}"),
        title: "Title".to_string(),
        raw_content: String::new(),
        images: Vec::new(),
        audio: Vec::new(),
        documents: Vec::new(),
        tags_scraped: Vec::new(),
        license_info: "license".to_string(),
        timestamp_scraped: "2026-08-30T00:00:00+00:00".to_string(),
        source_specific_metadata: Provenance {
            source_id: "museum".to_string(),
            origin_id: id.to_string(),
            date_published: None,
            fields: BTreeMap::new(),
        },
    }
}

/// Write the raw layout: metadata lines plus the media files each record
/// references.
fn seed_raw(layout: &DataLayout, records: &[ItemRecord]) {
    let mut writer = JsonlWriter::create(layout.raw_jsonl()).expect("create raw jsonl");
    for record in records {
        writer.append(record).expect("append record");
        for bucket in Bucket::KEPT {
            let Some(assets) = record.assets(bucket) else {
                continue;
            };
            if assets.is_empty() {
                continue;
            }
            let dir = layout.raw_media_dir(bucket).unwrap();
            fs::create_dir_all(&dir).unwrap();
            for asset in assets {
                let bytes = match bucket {
                    Bucket::Audio => vec![1u8; 8],
                    _ => png_bytes(),
                };
                fs::write(dir.join(&asset.file_name), bytes).unwrap();
            }
        }
    }
}

#[test]
fn bundles_split_records_by_bucket() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::under(dir.path());

    let mut with_image = record("a1");
    with_image.images.push(asset("a1_image.png"));
    let mut with_audio = record("a2");
    with_audio.audio.push(asset("a2_clip.mp3"));
    let mut with_both = record("a3");
    with_both.images.push(asset("a3_image.png"));
    with_both.audio.push(asset("a3_clip.mp3"));
    seed_raw(&layout, &[with_image, with_audio, with_both]);

    let summaries = build_bundles(&layout, &DecodeProbe).expect("bundles built");

    assert_eq!(summaries.len(), 3);
    let images = &summaries[0];
    assert_eq!(images.bucket, Bucket::Image);
    assert_eq!(images.records, 2);
    assert_eq!(images.assets, 2);
    let audio = &summaries[1];
    assert_eq!(audio.bucket, Bucket::Audio);
    assert_eq!(audio.records, 2);
    let documents = &summaries[2];
    assert_eq!(documents.records, 0);

    // The images bundle carries the media files and a README alongside the
    // metadata.
    let image_media = layout.bundle_media_dir(Bucket::Image).unwrap();
    assert!(image_media.join("a1_image.png").exists());
    assert!(image_media.join("a3_image.png").exists());
    assert!(images.dir.join("README.md").exists());

    // Bundle lines only carry their own bucket's asset list.
    let jsonl = fs::read_to_string(images.dir.join("data.jsonl")).unwrap();
    assert!(jsonl.contains("\"images\""));
    assert!(!jsonl.contains("\"audio\""));
    let line_count = jsonl.lines().count();
    assert_eq!(line_count, 2);
}

#[test]
fn packaging_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::under(dir.path());

    let mut rec = record("b1");
    rec.images.push(asset("b1_image.png"));
    seed_raw(&layout, &[rec]);

    let first = build_bundles(&layout, &DecodeProbe).expect("first build");
    let second = build_bundles(&layout, &DecodeProbe).expect("second build");

    assert_eq!(first, second);
    let jsonl =
        fs::read_to_string(layout.bundle_dir(Bucket::Image).unwrap().join("data.jsonl")).unwrap();
    assert_eq!(jsonl.lines().count(), 1);
}

#[test]
fn stale_bundle_contents_are_wiped() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::under(dir.path());

    let mut rec = record("c1");
    rec.images.push(asset("c1_image.png"));
    seed_raw(&layout, &[rec]);

    // A leftover from an earlier run with different raw data.
    let bundle_media = layout.bundle_media_dir(Bucket::Image).unwrap();
    fs::create_dir_all(&bundle_media).unwrap();
    fs::write(bundle_media.join("stale.png"), b"old").unwrap();

    build_bundles(&layout, &DecodeProbe).expect("bundles built");

    assert!(!bundle_media.join("stale.png").exists());
    assert!(bundle_media.join("c1_image.png").exists());
}

#[test]
fn invalid_files_are_excluded_from_the_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::under(dir.path());

    let mut rec = record("d1");
    rec.images.push(asset("d1_good.png"));
    rec.images.push(asset("d1_bad.png"));
    seed_raw(&layout, &[rec]);

    // Corrupt one file after the harvest wrote it.
    let raw_media = layout.raw_media_dir(Bucket::Image).unwrap();
    fs::write(raw_media.join("d1_bad.png"), b"truncated garbage").unwrap();

    let summaries = build_bundles(&layout, &DecodeProbe).expect("bundles built");

    assert_eq!(summaries[0].records, 1);
    assert_eq!(summaries[0].assets, 1);
    let bundle_media = layout.bundle_media_dir(Bucket::Image).unwrap();
    assert!(bundle_media.join("d1_good.png").exists());
    assert!(!bundle_media.join("d1_bad.png").exists());

    let jsonl = fs::read_to_string(summaries[0].dir.join("data.jsonl")).unwrap();
    assert!(jsonl.contains("d1_good.png"));
    assert!(!jsonl.contains("d1_bad.png"));
}

#[test]
fn record_with_every_asset_invalid_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::under(dir.path());

    let mut rec = record("e1");
    rec.images.push(asset("e1_bad.png"));
    seed_raw(&layout, &[rec]);
    let raw_media = layout.raw_media_dir(Bucket::Image).unwrap();
    fs::write(raw_media.join("e1_bad.png"), b"garbage").unwrap();

    let summaries = build_bundles(&layout, &DecodeProbe).expect("bundles built");

    assert_eq!(summaries[0].records, 0);
    let jsonl = fs::read_to_string(summaries[0].dir.join("data.jsonl")).unwrap();
    assert!(jsonl.is_empty());
}

#[test]
fn missing_raw_metadata_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::under(dir.path());
    assert!(build_bundles(&layout, &DecodeProbe).is_err());
}
