//! Magnet URI helpers.

/// Compose a magnet URI from an info hash, display name and trackers.
///
/// Trackers are appended in the given order.
pub fn build_magnet(info_hash: &str, display_name: &str, trackers: &[String]) -> String {
    let mut magnet = format!("magnet:?xt=urn:btih:{}", info_hash);
    if !display_name.is_empty() {
        magnet.push_str("&dn=");
        magnet.push_str(&urlencoding::encode(display_name));
    }
    for tracker in trackers {
        magnet.push_str("&tr=");
        magnet.push_str(&urlencoding::encode(tracker));
    }
    magnet
}

/// Extract the info hash (lowercased) from a magnet URI.
pub fn extract_info_hash(magnet: &str) -> Option<String> {
    let (_, query) = magnet.split_once('?')?;
    query
        .split('&')
        .find_map(|param| param.strip_prefix("xt=urn:btih:"))
        .filter(|hash| !hash.is_empty())
        .map(|hash| hash.to_lowercase())
}
