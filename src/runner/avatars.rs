//! Avatar image loading
//!
//! Images are loaded through real `<img>` elements inside the page so the
//! requests carry the page's origin and cookies.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub const LOAD_SCRIPT: &str = r#"async ({ prefixes, count, timeoutMs }) => {
    const results = [];
    for (const prefix of prefixes) {
        for (let i = 1; i <= count; i++) {
            const url = `/avatars/${prefix}-${i}.jpg`;
            results.push(await new Promise((resolve) => {
                const img = new Image();
                const timer = setTimeout(
                    () => resolve({ url, ok: false, width: 0, height: 0, timedOut: true }),
                    timeoutMs
                );
                img.onload = () => {
                    clearTimeout(timer);
                    resolve({ url, ok: img.naturalWidth > 0, width: img.naturalWidth, height: img.naturalHeight, timedOut: false });
                };
                img.onerror = () => {
                    clearTimeout(timer);
                    resolve({ url, ok: false, width: 0, height: 0, timedOut: false });
                };
                img.src = url;
            }));
        }
    }
    return results;
}"#;

pub const NATURAL_SIZE_SCRIPT: &str = "el => ({ w: el.naturalWidth, h: el.naturalHeight })";

/// Result of loading one avatar URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarLoad {
    pub url: String,
    pub ok: bool,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub timed_out: bool,
}

/// Loaded images for one file-name prefix
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixSummary {
    pub prefix: String,
    pub loaded: usize,
    /// Lowest and highest loaded index
    pub range: Option<(u32, u32)>,
    /// Distinct `WxH` values among loaded images
    pub dimensions: BTreeSet<String>,
}

impl PrefixSummary {
    pub fn is_consistent(&self) -> bool {
        self.dimensions.len() <= 1
    }
}

pub fn load_arg(prefixes: &[String], count: u32, timeout_ms: u64) -> serde_json::Value {
    serde_json::json!({
        "prefixes": prefixes,
        "count": count,
        "timeoutMs": timeout_ms,
    })
}

/// Numeric index of an avatar URL such as `/avatars/men-12.jpg`
pub fn avatar_index(url: &str) -> Option<u32> {
    static INDEX: OnceLock<Option<Regex>> = OnceLock::new();
    let re = INDEX.get_or_init(|| Regex::new(r"-(\d+)\.jpg$").ok()).as_ref()?;
    re.captures(url)?.get(1)?.as_str().parse().ok()
}

pub fn summarize(prefixes: &[String], loads: &[AvatarLoad]) -> Vec<PrefixSummary> {
    prefixes
        .iter()
        .map(|prefix| {
            let needle = format!("/{}-", prefix);
            let loaded: Vec<&AvatarLoad> = loads
                .iter()
                .filter(|p| p.ok && p.url.contains(&needle))
                .collect();
            let indices: Vec<u32> = loaded.iter().filter_map(|p| avatar_index(&p.url)).collect();
            let range = match (indices.iter().min(), indices.iter().max()) {
                (Some(lo), Some(hi)) => Some((*lo, *hi)),
                _ => None,
            };
            PrefixSummary {
                prefix: prefix.clone(),
                loaded: loaded.len(),
                range,
                dimensions: loaded
                    .iter()
                    .map(|p| format!("{}x{}", p.width, p.height))
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str, ok: bool, w: u32, h: u32) -> AvatarLoad {
        AvatarLoad {
            url: url.to_string(),
            ok,
            width: w,
            height: h,
            timed_out: false,
        }
    }

    #[test]
    fn test_avatar_index() {
        assert_eq!(avatar_index("/avatars/women-17.jpg"), Some(17));
        assert_eq!(avatar_index("/avatars/men.jpg"), None);
    }

    #[test]
    fn test_men_prefix_does_not_swallow_women() {
        let prefixes = vec!["men".to_string(), "women".to_string()];
        let loads = vec![
            image("/avatars/men-1.jpg", true, 512, 512),
            image("/avatars/men-2.jpg", true, 512, 512),
            image("/avatars/men-3.jpg", false, 0, 0),
            image("/avatars/women-4.jpg", true, 512, 640),
            image("/avatars/women-9.jpg", true, 512, 512),
        ];
        let summary = summarize(&prefixes, &loads);

        assert_eq!(summary[0].loaded, 2);
        assert_eq!(summary[0].range, Some((1, 2)));
        assert!(summary[0].is_consistent());

        assert_eq!(summary[1].loaded, 2);
        assert_eq!(summary[1].range, Some((4, 9)));
        assert!(!summary[1].is_consistent());
    }

    #[test]
    fn test_load_payload_from_page() {
        let value = serde_json::json!([
            { "url": "/avatars/male-1.jpg", "ok": true, "width": 256, "height": 256, "timedOut": false },
            { "url": "/avatars/male-2.jpg", "ok": false, "width": 0, "height": 0, "timedOut": true }
        ]);
        let loads: Vec<AvatarLoad> = serde_json::from_value(value).unwrap();
        assert!(loads[1].timed_out);
        let summary = summarize(&["male".to_string()], &loads);
        assert_eq!(summary[0].loaded, 1);
        assert_eq!(summary[0].dimensions.iter().next().map(String::as_str), Some("256x256"));
    }
}
