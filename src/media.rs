//! Moves a header media asset from a source template into the destination
//! account and returns the destination's handle for it.
use reqwest::Url;
use tracing::{info, instrument};

use crate::graph::{GraphApi, GraphError, MediaFile};
use crate::model::MediaHandle;

const FALLBACK_FILE_NAME: &str = "media";
const FALLBACK_MIME: &str = "application/octet-stream";

/// Download `source_url` in full and re-upload the bytes to `account`.
#[instrument(skip(api))]
pub async fn migrate_media(
    api: &dyn GraphApi,
    source_url: &str,
    account: &str,
) -> Result<MediaHandle, GraphError> {
    info!("downloading header media");
    let bytes = api.download_media(source_url).await?;
    let file_name = file_name_from_url(source_url);
    let mime_type = infer_mime(&file_name);
    let handle = api
        .upload_media(
            account,
            MediaFile {
                file_name,
                mime_type,
                bytes,
            },
        )
        .await?;
    info!(media_id = %handle, "header media migrated");
    Ok(handle)
}

/// Last path segment of the URL, ignoring query and fragment.
pub fn file_name_from_url(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string)),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    };
    segment
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

pub fn infer_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(FALLBACK_MIME)
        .to_string()
}
