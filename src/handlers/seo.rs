//! robots.txt, XML sitemaps and Open Graph cards.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use listing::{centers, sitemap};
use tracing::{debug, instrument, trace};

use crate::helpers::errors::{from_listing, not_found, ApiError};
use crate::helpers::markup::{escape_xml, truncate};
use crate::schemas::AppState;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

fn lastmod(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XML_CONTENT_TYPE),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        body,
    )
        .into_response()
}

fn render_urlset(state: &AppState, entries: &[sitemap::SitemapEntry]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"{}\">\n",
        SITEMAP_NS
    );
    for entry in entries {
        xml.push_str(&format!(
            "  <url><loc>{}</loc><lastmod>{}</lastmod></url>\n",
            escape_xml(&state.settings.absolute_url(&entry.path)),
            lastmod(entry.last_modified)
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

#[instrument(skip(state))]
pub async fn robots_txt(State(state): State<AppState>) -> impl IntoResponse {
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: /admin\nDisallow: /dashboard\nDisallow: /api/\n\nSitemap: {}\n",
        state.settings.absolute_url("/sitemap-index.xml")
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

/// When anything listed by the static sitemap last changed.
async fn static_last_modified(state: &AppState) -> Result<DateTime<Utc>, ApiError> {
    sitemap::static_last_modified(
        &state.db,
        state.content.newest_post_at(),
        state.content.loaded_at(),
    )
    .await
    .map_err(from_listing)
}

/// Lists the static sitemap and one sitemap per 1000 centers.
#[instrument(skip(state))]
pub async fn sitemap_index(State(state): State<AppState>) -> Result<Response, ApiError> {
    trace!("Entering sitemap_index function");
    let chunks = sitemap::chunk_last_modified(&state.db)
        .await
        .map_err(from_listing)?;
    let static_modified = static_last_modified(&state).await?;

    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sitemapindex xmlns=\"{}\">\n",
        SITEMAP_NS
    );
    for entry in sitemap::index_entries(static_modified, &chunks) {
        xml.push_str(&format!(
            "  <sitemap><loc>{}</loc><lastmod>{}</lastmod></sitemap>\n",
            escape_xml(&state.settings.absolute_url(&entry.path)),
            lastmod(entry.last_modified)
        ));
    }
    xml.push_str("</sitemapindex>\n");

    debug!("Sitemap index with {} center sitemaps", chunks.len());
    Ok(xml_response(xml))
}

#[instrument(skip(state))]
pub async fn sitemap_static(State(state): State<AppState>) -> Result<Response, ApiError> {
    trace!("Entering sitemap_static function");
    let blog_paths: Vec<String> = state
        .content
        .posts()
        .iter()
        .map(|post| format!("/blog/{}", post.slug))
        .collect();

    let last_modified = static_last_modified(&state).await?;
    let entries = sitemap::static_entries(&state.db, &blog_paths, last_modified)
        .await
        .map_err(from_listing)?;
    Ok(xml_response(render_urlset(&state, &entries)))
}

async fn sitemap_centers(state: &AppState, chunk: u64) -> Result<Response, ApiError> {
    let entries = sitemap::center_entries(&state.db, chunk)
        .await
        .map_err(from_listing)?
        .ok_or_else(|| not_found("Sitemap", &sitemap::center_sitemap_path(chunk)))?;
    Ok(xml_response(render_urlset(state, &entries)))
}

/// Chunk number of a `/sitemap-centers-{n}.xml` path.
fn center_chunk(path: &str) -> Option<u64> {
    path.strip_prefix("/sitemap-centers-")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Serves the numbered center sitemaps. Any other unmatched path is a 404.
#[instrument(skip(state))]
pub async fn fallback(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    match center_chunk(uri.path()) {
        Some(chunk) => sitemap_centers(&state, chunk).await,
        None => Err(not_found("Path", uri.path())),
    }
}

/// 1200x630 Open Graph card for a center
#[instrument(skip(state))]
pub async fn center_og_image(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    trace!("Entering center_og_image function");
    let center = centers::find_center(&state.db, &slug)
        .await
        .map_err(from_listing)?
        .ok_or_else(|| not_found("Center", &slug))?;

    let site = state
        .settings
        .site_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string();

    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="630" viewBox="0 0 1200 630">
  <rect width="1200" height="630" fill="#0f4c81"/>
  <rect x="60" y="60" width="1080" height="510" rx="24" fill="#ffffff"/>
  <text x="120" y="250" font-family="Helvetica, Arial, sans-serif" font-size="64" font-weight="700" fill="#0f172a">{name}</text>
  <text x="120" y="340" font-family="Helvetica, Arial, sans-serif" font-size="40" fill="#334155">{town}, {state}</text>
  <text x="120" y="500" font-family="Helvetica, Arial, sans-serif" font-size="32" fill="#0f4c81">{site}</text>
</svg>
"##,
        name = escape_xml(&truncate(&center.name, 34)),
        town = escape_xml(&center.town),
        state = escape_xml(&center.state),
        site = escape_xml(&site),
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        svg,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_chunk() {
        assert_eq!(center_chunk("/sitemap-centers-0.xml"), Some(0));
        assert_eq!(center_chunk("/sitemap-centers-12.xml"), Some(12));
        assert_eq!(center_chunk("/sitemap-centers-x.xml"), None);
        assert_eq!(center_chunk("/sitemap-static.xml"), None);
    }
}
