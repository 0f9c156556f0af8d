//! Media commands: upload for censoring, inspect, download, delete

use std::path::{Path, PathBuf};

use privacyguard_domain::{
    censored_file_name, CensorOptions, MediaItem, PrivacyGuardError, Result as DomainResult,
};
use privacyguard_infra::MediaUpload;
use tracing::info;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_logged;

pub async fn list_media(ctx: &AppContext) -> DomainResult<Vec<MediaItem>> {
    execute_logged("media::list", || async { Ok(ctx.api.list_media().await?) }).await
}

pub async fn show_media(ctx: &AppContext, media_id: i64) -> DomainResult<MediaItem> {
    execute_logged("media::show", || async { Ok(ctx.api.get_media(media_id).await?) }).await
}

/// Upload `path`, asking the server to blur what `options` selects.
pub async fn upload_media(
    ctx: &AppContext,
    path: &Path,
    options: CensorOptions,
) -> DomainResult<MediaItem> {
    execute_logged("media::upload", || async {
        options.validate()?;
        let upload = MediaUpload::from_path(path).await?;
        let description = options.upload_description();
        Ok(ctx.api.upload_media(upload, Some(&description)).await?)
    })
    .await
}

/// Save the processed bytes as `censored_<original name>` inside `dir`.
///
/// Returns the path written.
pub async fn download_media(
    ctx: &AppContext,
    media_id: i64,
    dir: &Path,
) -> DomainResult<PathBuf> {
    execute_logged("media::download", || async {
        let item = ctx.api.get_media(media_id).await?;
        let bytes = ctx.api.download_media(media_id).await?;

        let target = dir.join(censored_file_name(&original_file_name(&item)));
        tokio::fs::write(&target, &bytes).await.map_err(|e| {
            PrivacyGuardError::Storage(format!("cannot write {}: {e}", target.display()))
        })?;

        info!(media_id, bytes = bytes.len(), path = %target.display(), "Media downloaded");
        Ok(target)
    })
    .await
}

pub async fn delete_media(ctx: &AppContext, media_id: i64) -> DomainResult<()> {
    execute_logged("media::delete", || async { Ok(ctx.api.delete_media(media_id).await?) }).await
}

/// Last path segment of the original upload URL, without any query string.
fn original_file_name(item: &MediaItem) -> String {
    item.original_url
        .split(['?', '#'])
        .next()
        .and_then(|url| url.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("media-{}", item.id), ToString::to_string)
}
