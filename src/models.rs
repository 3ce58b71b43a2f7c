/// Metadata for one video, produced once per request by the fetcher.
///
/// The title is already sanitized (punctuation collapsed, title-cased) by the
/// time this struct exists; downstream code never re-cleans it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub duration: String,
    pub thumbnail_url: String,
    pub views: String,
    pub channel: String,
}
