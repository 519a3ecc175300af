use curator_engine::{Bucket, Classifier, MediaKind, UNTITLED_AUDIO_CAPTION};
use pretty_assertions::assert_eq;

fn classify_image(caption: &str) -> Bucket {
    Classifier::default().classify(caption, MediaKind::Image)
}

fn classify_audio(caption: &str) -> Bucket {
    Classifier::default().classify(caption, MediaKind::Audio)
}

#[test]
fn plain_image_captions_default_to_image() {
    assert_eq!(classify_image("Ceremonial mask, collected 1911"), Bucket::Image);
    assert_eq!(classify_image(""), Bucket::Image);
}

#[test]
fn modern_context_rejects_images() {
    assert_eq!(classify_image("Artist at work in the studio"), Bucket::Rejected);
    assert_eq!(classify_image("Exhibition opening, London"), Bucket::Rejected);
    assert_eq!(classify_image("Workshop participants"), Bucket::Rejected);
}

#[test]
fn decade_markers_reject_images() {
    assert_eq!(classify_image("Street scene, 1954"), Bucket::Rejected);
    assert_eq!(classify_image("Festival photographed in 1998"), Bucket::Rejected);
    assert_eq!(classify_image("Community event, 2021"), Bucket::Rejected);
    // Years before the 1950s are historical material.
    assert_eq!(classify_image("Street scene, 1911"), Bucket::Image);
}

#[test]
fn document_vocabulary_routes_images_to_document() {
    assert_eq!(classify_image("Letter from the district officer"), Bucket::Document);
    assert_eq!(classify_image("Pages from the field manuscript"), Bucket::Document);
}

#[test]
fn document_match_overrides_modern_rejection() {
    // Matches both "exhibition" (modern) and "catalogue" (document); the
    // document rule wins.
    assert_eq!(
        classify_image("Catalogue prepared for the exhibition"),
        Bucket::Document
    );
}

#[test]
fn classification_is_case_insensitive() {
    assert_eq!(classify_image("EXHIBITION VIEW"), Bucket::Rejected);
    assert_eq!(classify_audio("NORTHCOTE THOMAS recording"), Bucket::Audio);
}

#[test]
fn historical_markers_accept_audio() {
    assert_eq!(classify_audio("NWT 418 cylinder"), Bucket::Audio);
    assert_eq!(
        classify_audio("Recording made by Northcote Thomas"),
        Bucket::Audio
    );
}

#[test]
fn modern_markers_reject_audio_even_with_historical_markers() {
    assert_eq!(classify_audio("Podcast episode 4"), Bucket::Rejected);
    // "interview" (modern) and "recording" (historical) both match; the
    // reject rule wins the tie.
    assert_eq!(
        classify_audio("Interview about the cylinder recording"),
        Bucket::Rejected
    );
}

#[test]
fn unmarked_audio_captions_are_rejected() {
    assert_eq!(classify_audio("Sound clip"), Bucket::Rejected);
}

#[test]
fn untitled_placeholder_is_accepted_exactly() {
    assert_eq!(classify_audio(UNTITLED_AUDIO_CAPTION), Bucket::Audio);
    // Only the exact placeholder counts; embedding it in a longer caption
    // does not.
    assert_eq!(
        classify_audio(&format!("{UNTITLED_AUDIO_CAPTION} from the archive")),
        Bucket::Rejected
    );
}

#[test]
fn matched_group_names_the_deciding_rule() {
    let classifier = Classifier::default();
    assert_eq!(
        classifier.matched_group("Podcast episode", MediaKind::Audio),
        Some("modern_audio")
    );
    assert_eq!(
        classifier.matched_group("Letter from home", MediaKind::Image),
        Some("document")
    );
    assert_eq!(classifier.matched_group("Plain caption", MediaKind::Image), None);
}
