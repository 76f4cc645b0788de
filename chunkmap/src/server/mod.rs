//! HTTP tile routes.
//!
//! A thin axum layer over the cache client. One route serves composed tiles
//! as PNG or JPEG, one accepts freshly rendered chunk stamps, and one
//! reports on-disk cache usage. Everything heavier (templating, compression,
//! the chunk-capturing proxy) lives outside this crate.

use crate::cache::{self, CacheClient, TileKey};
use crate::coord;
use crate::raster::Raster;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use image::{DynamicImage, ImageFormat, ImageReader};
use serde::Serialize;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{error, warn};

/// Shared state for the tile routes.
#[derive(Clone)]
pub struct ServerState {
    /// Handle to the cache actor
    pub cache: CacheClient,
    /// On-disk cache root, for the usage route
    pub prefix: PathBuf,
}

/// Build the route table.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/worlds/:world/:dim/tiles/:layer/:s/:x/:z/:format",
            get(get_tile),
        )
        .route(
            "/worlds/:world/:dim/tiles/:layer/0/:x/:z",
            axum::routing::post(post_stamp),
        )
        .route("/worlds/:world/:dim/cache", get(get_cache_usage))
        .with_state(state)
}

/// Serve one tile at the requested zoom level.
///
/// `204 No Content` when nothing is rendered there, `400` for an unknown
/// image format.
async fn get_tile(
    State(state): State<ServerState>,
    Path((world, dim, layer, s, x, z, format)): Path<(String, String, String, u8, i32, i32, String)>,
) -> Response {
    let encoding = match format.as_str() {
        "png" => ImageFormat::Png,
        "jpeg" => ImageFormat::Jpeg,
        _ => return (StatusCode::BAD_REQUEST, "bad encoding").into_response(),
    };

    let key = TileKey::new(world, dim, layer, s, x, z);
    let Some(tile) = state.cache.get(key).await else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match encode_tile(&tile, encoding) {
        Ok(body) => {
            let content_type = match encoding {
                ImageFormat::Jpeg => "image/jpeg",
                _ => "image/png",
            };
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to encode tile");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Accept a freshly rendered 16x16 chunk stamp as a PNG body.
async fn post_stamp(
    State(state): State<ServerState>,
    Path((world, dim, layer, x, z)): Path<(String, String, String, i32, i32)>,
    body: Bytes,
) -> StatusCode {
    let decoded = ImageReader::new(Cursor::new(body.as_ref()))
        .with_guessed_format()
        .ok()
        .and_then(|r| r.decode().ok());

    let Some(stamp) = decoded else {
        warn!(%world, %dim, %layer, x, z, "undecodable chunk stamp rejected");
        return StatusCode::BAD_REQUEST;
    };

    let stamp = stamp.into_rgba8();
    if stamp.dimensions() != (coord::CHUNK_PX, coord::CHUNK_PX) {
        warn!(
            %world,
            %dim,
            %layer,
            x,
            z,
            width = stamp.width(),
            height = stamp.height(),
            "chunk stamp with wrong dimensions rejected"
        );
        return StatusCode::BAD_REQUEST;
    }

    let key = TileKey::new(world, dim, layer, 0, x, z);
    state.cache.put(key, stamp).await;
    StatusCode::NO_CONTENT
}

#[derive(Serialize)]
struct CacheUsage {
    files: u64,
    bytes: u64,
}

/// File count and byte size of the on-disk cache for one dimension.
async fn get_cache_usage(
    State(state): State<ServerState>,
    Path((world, dim)): Path<(String, String)>,
) -> Response {
    match cache::usage(&state.prefix, &world, &dim) {
        Ok((files, bytes)) => axum::Json(CacheUsage { files, bytes }).into_response(),
        Err(e) => {
            error!(%world, %dim, error = %e, "failed to measure cache usage");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Encode a raster for the wire. JPEG has no alpha channel, so transparent
/// pixels are flattened onto black first.
fn encode_tile(tile: &Raster, format: ImageFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            DynamicImage::ImageRgba8(tile.clone())
                .to_rgb8()
                .write_to(&mut buffer, ImageFormat::Jpeg)?;
        }
        _ => tile.write_to(&mut buffer, ImageFormat::Png)?,
    }
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_encode_tile_png_round_trips() {
        let tile = Raster::from_pixel(16, 16, Rgba([1, 2, 3, 255]));
        let bytes = encode_tile(&tile, ImageFormat::Png).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert_eq!(*decoded.get_pixel(0, 0), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_encode_tile_jpeg_produces_jpeg() {
        let tile = Raster::from_pixel(16, 16, Rgba([200, 10, 10, 255]));
        let bytes = encode_tile(&tile, ImageFormat::Jpeg).unwrap();

        // JPEG magic
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 16);
    }
}
