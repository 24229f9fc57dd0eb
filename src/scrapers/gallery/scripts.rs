//! Selector lists and DOM scan scripts for the supported sites.
//!
//! Ordered by priority: the most specific markup first, generic CDN matches
//! last.

/// Image CDN hosts serving Otodom listing photos.
pub const OTODOM_CDN_HOSTS: &[&str] = &["apollo.olxcdn.com", "otodom-tech.imgix.net"];

/// Image CDN hosts serving OLX listing photos.
pub const OLX_CDN_HOSTS: &[&str] = &["olxcdn.com"];

/// Visible labels of the Otodom "view photos" control, Polish and English.
pub const OTODOM_GALLERY_LABELS: &[&str] = &["zdjęcia", "zdjęć", "zdjecia", "photos"];

/// Tags tried for the gallery control: links first, then generic elements.
pub const OTODOM_GALLERY_LINK_TAGS: &[&str] = &["a"];
pub const OTODOM_GALLERY_GENERIC_TAGS: &[&str] = &["button", "div", "span"];

pub const OTODOM_PHOTO_SELECTORS: &[&str] = &[
    r#"[data-cy="gallery-grid"] img"#,
    r#"[data-testid="gallery-grid"] img"#,
    r#"img[src*="apollo.olxcdn.com"]"#,
    r#"img[data-src*="apollo.olxcdn.com"]"#,
    r#"img[src*="otodom-tech.imgix.net"]"#,
    r#"img[data-src*="otodom-tech.imgix.net"]"#,
];

/// Photos shown on the OLX listing page without opening anything.
pub const OLX_PAGE_SELECTORS: &[&str] = &[
    r#"img[data-src*="apollo.olxcdn.com"]"#,
    r#"img[src*="apollo.olxcdn.com"]"#,
    r#"div[data-testid*="photos"] img"#,
    r#"section[data-testid="photos"] img"#,
    r#"[data-testid="swiper-image"]"#,
];

/// Main photo elements that open the OLX lightbox when clicked.
pub const OLX_MAIN_PHOTO_SELECTORS: &[&str] = &[
    r#"[data-testid="swiper-image"]"#,
    r#"[data-cy="adPhotos-swiperSlide"] img"#,
    r#"[data-testid="ad-photo"] img"#,
    r#"div[data-testid="image-galery-container"] img"#,
    r#".swiper-slide-active img"#,
    r#".swiper-zoom-container img"#,
    r#"div[data-testid*="photos"] img"#,
    r#"section[data-testid="photos"] img"#,
    r#"img[src*="apollo.olxcdn.com"]"#,
    r#"img[data-src*="apollo.olxcdn.com"]"#,
];

/// Elements whose visibility confirms the lightbox is open.
pub const OLX_OVERLAY_SELECTORS: &[&str] = &[
    r#"[role="dialog"]"#,
    r#"[aria-modal="true"]"#,
    r#"[data-testid="gallery-modal"]"#,
    r#".ReactModal__Overlay"#,
];

/// Photos inside the open lightbox.
pub const OLX_OVERLAY_PHOTO_SELECTORS: &[&str] = &[
    r#"[role="dialog"] img"#,
    r#"[aria-modal="true"] img"#,
    r#"[data-testid="gallery-modal"] img"#,
    r#".ReactModal__Overlay img"#,
];

/// "Next photo" controls, by CSS.
pub const OLX_NEXT_SELECTORS: &[&str] = &[
    r#"[data-testid="arrow-right"]"#,
    r#"[data-testid="gallery-next"]"#,
    r#"[role="dialog"] .swiper-button-next"#,
    r#"button[aria-label*="next" i]"#,
    r#"button[aria-label*="następ" i]"#,
];

/// "Next photo" controls matched by their text.
pub const OLX_NEXT_XPATHS: &[&str] = &[
    "//button[contains(normalize-space(.), 'Następne')]",
    "//button[contains(normalize-space(.), 'Dalej')]",
    "//button[contains(normalize-space(.), 'Next')]",
    "//*[@role='button'][contains(normalize-space(.), 'Następne')]",
];

/// Build a script returning `[{src, width, height}]` for every image matched
/// by `selectors` whose source is served by one of `hosts`.
///
/// Width and height are the natural size when loaded, else the layout size,
/// else `null`. With `visible_only`, unrendered images are skipped.
pub fn scan_script(selectors: &[&str], hosts: &[&str], visible_only: bool) -> String {
    let selectors = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    let hosts = serde_json::to_string(hosts).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
            const selectors = {selectors};
            const hosts = {hosts};
            const visibleOnly = {visible_only};
            const seen = new Set();
            const photos = [];
            for (const selector of selectors) {{
                let elements;
                try {{
                    elements = document.querySelectorAll(selector);
                }} catch (e) {{
                    continue;
                }}
                for (const el of elements) {{
                    const src = el.currentSrc || el.src || (el.dataset && el.dataset.src) || el.getAttribute('data-src');
                    if (!src || !hosts.some(h => src.includes(h)) || seen.has(src)) continue;
                    if (visibleOnly) {{
                        const rect = el.getBoundingClientRect();
                        if (rect.width === 0 || rect.height === 0) continue;
                    }}
                    seen.add(src);
                    photos.push({{
                        src: src,
                        width: el.naturalWidth || el.offsetWidth || null,
                        height: el.naturalHeight || el.offsetHeight || null
                    }});
                }}
            }}
            return photos;
        }})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_script_embeds_selectors_and_hosts() {
        let script = scan_script(&[r#"img[src*="a.com"]"#], &["a.com"], true);
        assert!(script.contains(r#"["img[src*=\"a.com\"]"]"#));
        assert!(script.contains(r#"const hosts = ["a.com"]"#));
        assert!(script.contains("const visibleOnly = true"));
    }

    #[test]
    fn test_lightbox_trigger_list_size() {
        assert_eq!(OLX_MAIN_PHOTO_SELECTORS.len(), 10);
    }
}
