use std::path::PathBuf;

use image::{DynamicImage, ImageBuffer, Rgba};
use mediahash_core::{process_task, serialize, Hash, HashMethod, HashTask};

fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x + 2 * y) % 256) as u8,
            255,
        ])
    }))
}

fn write_png(dir: &std::path::Path, name: &str, img: &DynamicImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

#[test]
fn file_and_memory_paths_agree() {
    let dir = tempfile::tempdir().unwrap();
    let img = gradient_image(97, 61);
    let path = write_png(dir.path(), "gradient.png", &img);

    for method in [
        HashMethod::BlockMean,
        HashMethod::BlockMeanQuick,
        HashMethod::Dct64,
    ] {
        let task = HashTask::new(path.clone(), 16, method, false, false).unwrap();
        let from_file = process_task(&task).unwrap();
        let from_memory = mediahash_core::processing::hash_image(&img, 16, method).unwrap();
        assert_eq!(from_file, from_memory);
    }
}

#[test]
fn blockmean_hash_has_grid_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "img.png", &gradient_image(40, 30));

    let task = HashTask::new(path, 8, HashMethod::BlockMean, false, false).unwrap();
    let hash = process_task(&task).unwrap();
    assert_eq!(hash.len(), 64);
    assert_eq!(hash.to_hex().len(), 16);
}

#[test]
fn dct_hash_is_two_words() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "img.png", &gradient_image(64, 64));

    let task = HashTask::new(path, 16, HashMethod::Dct64, false, false).unwrap();
    let hash = process_task(&task).unwrap();
    assert_eq!(hash.len(), 2);
    assert_eq!(hash.to_hex().len(), 16);
}

#[test]
fn hex_serialization_round_trips_real_hashes() {
    let img = gradient_image(55, 44);

    let cells = mediahash_core::processing::hash_image(&img, 16, HashMethod::BlockMean).unwrap();
    let hex = cells.to_hex();
    assert_eq!(
        Hash::Bits(serialize::hex_to_bits(&hex).unwrap()),
        cells
    );

    let words = mediahash_core::processing::hash_image(&img, 16, HashMethod::Dct64).unwrap();
    let hex = words.to_hex();
    assert_eq!(
        Hash::Words(serialize::hex_to_words(&hex).unwrap()),
        words
    );
}

#[test]
fn similar_images_have_close_dct_hashes() {
    // the same gradient with a mild brightness shift should flip few bits
    let base = gradient_image(128, 96);
    let brighter = DynamicImage::ImageRgba8(ImageBuffer::from_fn(128, 96, |x, y| {
        Rgba([
            ((x % 256) as u8).saturating_add(6),
            ((y % 256) as u8).saturating_add(6),
            (((x + 2 * y) % 256) as u8).saturating_add(6),
            255,
        ])
    }));

    let a = mediahash_core::processing::hash_image(&base, 16, HashMethod::Dct64).unwrap();
    let b = mediahash_core::processing::hash_image(&brighter, 16, HashMethod::Dct64).unwrap();

    let (Hash::Words(a), Hash::Words(b)) = (a, b) else {
        panic!("dct hashes are word hashes");
    };
    let distance: u32 = a
        .iter()
        .zip(&b)
        .map(|(x, y)| (x ^ y).count_ones())
        .sum();
    assert!(distance <= 16, "distance {distance} too large");
}

#[test]
fn missing_file_is_a_per_file_error() {
    let task = HashTask::new(
        PathBuf::from("definitely-not-here.png"),
        16,
        HashMethod::BlockMean,
        false,
        false,
    )
    .unwrap();
    assert!(process_task(&task).is_err());
}
