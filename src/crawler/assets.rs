//! Downloading of the assets a mirrored page needs
//!
//! The stylesheet is part of the core path: without it the dump is not
//! browsable, so its failure is reported to the caller. Images and scripts
//! are best-effort; a failed download is logged and skipped.

use crate::crawler::PageFetcher;
use crate::output::OutputLayout;
use crate::rewrite::{
    resolve_asset_filename, rewrite_stylesheet, script_filename, stylesheet_image_paths,
    AssetReferences,
};
use crate::TsloveError;
use std::fs;
use std::path::Path;

/// Request path of diary images
const IMAGE_SCRIPT: &str = "img.php";

/// Fetches the site stylesheet and its images
///
/// Nothing is fetched when the dump already has a stylesheet.
///
/// # Returns
///
/// * `Ok(true)` - The stylesheet was fetched and written
/// * `Ok(false)` - The dump already had a stylesheet
/// * `Err(TsloveError)` - The stylesheet could not be fetched or written
pub async fn dump_stylesheet<F: PageFetcher + ?Sized>(
    fetcher: &F,
    layout: &OutputLayout,
    excluded_images: &[String],
) -> Result<bool, TsloveError> {
    let target = layout.stylesheet_file();
    if target.exists() {
        tracing::debug!("Stylesheet already present at {}", target.display());
        return Ok(false);
    }

    let css = fetcher.fetch_stylesheet().await?;

    let dir = layout.stylesheet_dir();
    for path in stylesheet_image_paths(&css, excluded_images) {
        let file = dir.join(resolve_asset_filename(&path));
        if file.exists() {
            continue;
        }
        let request_path = path.replace("&amp;", "&");
        match fetcher.fetch_image(&request_path, &[]).await {
            Ok(image) => {
                if let Err(e) = image.save(&file) {
                    tracing::warn!("Can not save stylesheet image {}. {}", path, e);
                }
            }
            Err(e) => tracing::warn!("Can not get stylesheet image {}. {}", path, e),
        }
    }

    fs::write(&target, rewrite_stylesheet(&css, excluded_images))?;
    tracing::info!("Stylesheet saved to {}", target.display());
    Ok(true)
}

/// Downloads the images of a page into the images directory
///
/// Absolute URLs point outside the forum and are left alone. Images
/// already on disk are not fetched again.
///
/// # Returns
///
/// The number of images written
pub async fn download_images<F: PageFetcher + ?Sized>(
    fetcher: &F,
    assets: &AssetReferences,
    images_dir: &Path,
) -> usize {
    let mut written = 0;

    for src in &assets.images {
        if src.contains("://") {
            continue;
        }

        let filename = resolve_asset_filename(src);
        let file = images_dir.join(&filename);
        if file.exists() {
            continue;
        }

        let result = if src.contains(IMAGE_SCRIPT) {
            fetcher
                .fetch_image(IMAGE_SCRIPT, &[("m", "pc"), ("filename", filename.as_str())])
                .await
        } else {
            fetcher.fetch_image(src, &[]).await
        };

        match result {
            Ok(image) => match image.save(&file) {
                Ok(()) => written += 1,
                Err(e) => tracing::warn!("Can not save image {}. {}", src, e),
            },
            Err(e) => tracing::warn!("Can not get image {}. {}", src, e),
        }
    }

    written
}

/// Downloads the scripts of a page into the scripts directory
///
/// # Returns
///
/// The number of scripts written
pub async fn download_scripts<F: PageFetcher + ?Sized>(
    fetcher: &F,
    assets: &AssetReferences,
    scripts_dir: &Path,
    is_excluded: impl Fn(&str) -> bool,
) -> usize {
    let mut written = 0;

    for src in &assets.scripts {
        if is_excluded(src) {
            continue;
        }

        let file = scripts_dir.join(script_filename(src));
        if file.exists() {
            continue;
        }

        match fetcher.fetch_script(src).await {
            Ok(script) => match fs::write(&file, script) {
                Ok(()) => written += 1,
                Err(e) => tracing::warn!("Can not save script {}. {}", src, e),
            },
            Err(e) => tracing::warn!("Can not get script {}. {}", src, e),
        }
    }

    written
}
