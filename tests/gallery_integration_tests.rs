use image::{ImageBuffer, Rgb};
use shashin::gallery::{
    AlbumId, Gallery, GalleryError, GalleryIndex, GalleryMode, ImageSize, ROOT_DISPLAY_NAME,
};
use shashin::{GalleryConfig, ImageSizeConfig, RefreshPolicy};
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test image of the given size
fn create_test_image(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 200])
    });
    img.save(path).unwrap();
}

fn test_config(temp_dir: &TempDir) -> GalleryConfig {
    GalleryConfig {
        photos_root: temp_dir.path().join("photos"),
        thumbnails_root: temp_dir.path().join("thumbnails"),
        thumbnail: ImageSizeConfig {
            width: 200,
            height: 200,
        },
        refresh: RefreshPolicy::Startup,
        scan_timeout_seconds: 30,
    }
}

#[tokio::test]
async fn test_nested_gallery_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let photos = temp_dir.path().join("photos");
    create_test_image(&photos.join("VacationPhotos/a.jpg"), 640, 480);
    create_test_image(&photos.join("VacationPhotos/B.png"), 480, 640);
    create_test_image(&photos.join("Cityscapes/c.jpg"), 300, 300);

    let gallery = Gallery::initialize(test_config(&temp_dir)).await;

    assert_eq!(gallery.mode().await.unwrap(), GalleryMode::Nested);

    let albums = gallery.list_albums().await.unwrap();
    let ids: Vec<_> = albums.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["Cityscapes", "VacationPhotos"]);
    assert_eq!(albums[1].photo_count, 2);
    assert_eq!(albums[1].cover_filename, "a.jpg");

    let photos: Vec<_> = gallery
        .list_photos("VacationPhotos")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.filename)
        .collect();
    assert_eq!(photos, vec!["a.jpg", "B.png"]);

    let cover = gallery
        .resolve_thumbnail(&albums[1].id, &albums[1].cover_filename)
        .await
        .unwrap();
    assert_eq!(image::image_dimensions(&cover).unwrap(), (200, 150));

    let portrait = gallery
        .resolve_thumbnail("VacationPhotos", "B.png")
        .await
        .unwrap();
    assert_eq!(image::image_dimensions(&portrait).unwrap(), (150, 200));
}

#[tokio::test]
async fn test_flat_gallery_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let photos = temp_dir.path().join("photos");
    create_test_image(&photos.join("photo1.jpg"), 100, 100);
    create_test_image(&photos.join("photo2.jpg"), 100, 100);
    std::fs::create_dir_all(photos.join("no-images-here")).unwrap();

    let gallery = Gallery::initialize(test_config(&temp_dir)).await;

    assert_eq!(gallery.mode().await.unwrap(), GalleryMode::Flat);
    let albums = gallery.list_albums().await.unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].id, "");
    assert_eq!(albums[0].display_name, ROOT_DISPLAY_NAME);
    assert_eq!(albums[0].photo_count, 2);

    let resolved = gallery.resolve_photo("", "photo2.jpg").await.unwrap();
    assert_eq!(
        resolved,
        photos.canonicalize().unwrap().join("photo2.jpg")
    );
}

#[tokio::test]
async fn test_traversal_is_reported_as_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let photos = temp_dir.path().join("photos");
    create_test_image(&photos.join("album/a.jpg"), 50, 50);
    std::fs::write(temp_dir.path().join("outside.jpg"), b"secret").unwrap();

    let gallery = Gallery::initialize(test_config(&temp_dir)).await;

    for (album, filename) in [
        ("album", "../../etc/passwd"),
        ("album", "../../outside.jpg"),
        ("..", "outside.jpg"),
        ("", "../outside.jpg"),
    ] {
        let photo = gallery.resolve_photo(album, filename).await;
        assert!(
            matches!(photo, Err(GalleryError::PhotoNotFound(_))),
            "{album}/{filename} should not resolve"
        );
        let thumb = gallery.resolve_thumbnail(album, filename).await;
        assert!(matches!(thumb, Err(GalleryError::PhotoNotFound(_))));
    }
}

#[tokio::test]
async fn test_unknown_album_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    create_test_image(&temp_dir.path().join("photos/a/x.jpg"), 10, 10);

    let gallery = Gallery::initialize(test_config(&temp_dir)).await;

    assert!(matches!(
        gallery.list_photos("b").await,
        Err(GalleryError::AlbumNotFound(_))
    ));
    assert!(gallery.open_photo("b", "x.jpg").await.unwrap_err().is_not_found());
}

#[test]
fn test_completeness_and_no_empty_albums() {
    let temp_dir = TempDir::new().unwrap();
    let photos = temp_dir.path().join("photos");
    let layout = [
        "root.png",
        "2019/summer/beach.jpg",
        "2019/summer/Dunes.JPEG",
        "2019/winter/snow.gif",
        "2020/x.bmp",
        "2020/y.tiff",
        "2020/z.webp",
        "deep/a/b/c/d/e/leaf.png",
    ];
    for file in layout {
        create_test_image(&photos.join(file), 30, 20);
    }
    std::fs::write(photos.join("2020/notes.txt"), b"ignored").unwrap();
    std::fs::create_dir_all(photos.join("empty/also-empty")).unwrap();

    let index = GalleryIndex::new(
        photos.clone(),
        temp_dir.path().join("thumbnails"),
        ImageSize::new(16, 16),
    );
    let model = index.build();

    assert_eq!(model.mode(), GalleryMode::Nested);
    assert_eq!(model.stats().failed, 0);
    assert!(model.albums().all(|album| !album.photos().is_empty()));

    let mut expected: Vec<(String, Vec<String>)> = vec![
        ("".into(), vec!["root.png".into()]),
        (
            "2019/summer".into(),
            vec!["beach.jpg".into(), "Dunes.JPEG".into()],
        ),
        ("2019/winter".into(), vec!["snow.gif".into()]),
        (
            "2020".into(),
            vec!["x.bmp".into(), "y.tiff".into(), "z.webp".into()],
        ),
        ("deep/a/b/c/d/e".into(), vec!["leaf.png".into()]),
    ];
    expected.sort();

    let mut actual: Vec<(String, Vec<String>)> = model
        .albums()
        .map(|album| {
            (
                album.id().as_str().to_string(),
                album.photos().iter().map(|p| p.filename.clone()).collect(),
            )
        })
        .collect();
    actual.sort();

    assert_eq!(actual, expected);

    for album in model.albums() {
        for photo in album.photos() {
            let (w, h) = image::image_dimensions(&photo.thumbnail_path).unwrap();
            assert!(w <= 16 && h <= 16, "{:?} is {}x{}", photo.thumbnail_path, w, h);
            assert_eq!((w, h), (16, 11));
        }
    }

    assert!(model.album(&AlbumId::Path("empty".into())).is_none());
    assert!(!temp_dir.path().join("thumbnails/empty").exists());
}

#[test]
fn test_rebuild_reuses_thumbnails() {
    let temp_dir = TempDir::new().unwrap();
    let photos = temp_dir.path().join("photos");
    create_test_image(&photos.join("a/one.jpg"), 400, 400);

    let index = GalleryIndex::new(
        photos.clone(),
        temp_dir.path().join("thumbnails"),
        ImageSize::new(100, 100),
    );
    let first = index.build();
    let thumb = first.album(&AlbumId::Path("a".into())).unwrap().photos()[0]
        .thumbnail_path
        .clone();
    let bytes = std::fs::read(&thumb).unwrap();

    let second = index.build();
    assert_eq!(second.stats().created, 0);
    assert_eq!(second.stats().cached, 1);
    assert_eq!(std::fs::read(&thumb).unwrap(), bytes);
}

/// Every id and filename the listing publishes can be looked up again.
async fn assert_listing_round_trips(gallery: &Gallery) {
    let albums = gallery.list_albums().await.unwrap();
    assert!(!albums.is_empty());

    for album in albums {
        let photos = gallery
            .list_photos(&album.id)
            .await
            .unwrap_or_else(|e| panic!("listed album {:?}: {}", album.id, e));
        assert_eq!(photos.len(), album.photo_count);

        for photo in photos {
            let source = gallery.resolve_photo(&album.id, &photo.filename).await;
            assert!(
                source.is_ok(),
                "listed photo {:?}/{:?}: {:?}",
                album.id,
                photo.filename,
                source
            );
            assert!(
                gallery
                    .resolve_thumbnail(&album.id, &photo.filename)
                    .await
                    .is_ok()
            );
        }
    }
}

#[tokio::test]
async fn test_listed_albums_and_photos_resolve() {
    let temp_dir = TempDir::new().unwrap();
    let photos = temp_dir.path().join("photos");
    create_test_image(&photos.join("root.jpg"), 40, 40);
    create_test_image(&photos.join("Trips/2021 Summer/beach.png"), 40, 40);
    create_test_image(&photos.join("Trips/..dots/x.gif"), 40, 40);

    let gallery = Gallery::initialize(test_config(&temp_dir)).await;

    assert_listing_round_trips(&gallery).await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_backslash_names_round_trip_on_unix() {
    let temp_dir = TempDir::new().unwrap();
    let photos = temp_dir.path().join("photos");
    create_test_image(&photos.join("a\\b/x.jpg"), 40, 40);
    create_test_image(&photos.join("ok/y\\z.jpg"), 40, 40);

    let gallery = Gallery::initialize(test_config(&temp_dir)).await;

    let ids: Vec<_> = gallery
        .list_albums()
        .await
        .unwrap()
        .into_iter()
        .map(|album| album.id)
        .collect();
    assert_eq!(ids, vec!["a\\b", "ok"]);
    assert_listing_round_trips(&gallery).await;
}
