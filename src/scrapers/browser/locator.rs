//! Element locators and the DOM scripts that resolve them.

use std::fmt;

/// Longest visible text a text-matched element may have. Keeps large
/// containers whose text merely includes the label from matching.
const MAX_LABEL_LEN: usize = 80;

/// How to find a single element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// First element matching a CSS selector.
    Css(String),
    /// First node matching an XPath expression.
    XPath(String),
    /// First element of the given tags (in tag priority order) whose visible
    /// text contains one of the needles, case-insensitively.
    Text {
        tags: Vec<String>,
        needles: Vec<String>,
    },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    pub fn text(tags: &[&str], needles: &[&str]) -> Self {
        Self::Text {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            needles: needles.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// JavaScript expression evaluating to the element or `null`.
    pub fn element_expression(&self) -> String {
        match self {
            Self::Css(selector) => format!("document.querySelector({})", js_string(selector)),
            Self::XPath(expression) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(expression)
            ),
            Self::Text { tags, needles } => format!(
                r#"(() => {{
                    const needles = {needles};
                    for (const tag of {tags}) {{
                        for (const el of document.querySelectorAll(tag)) {{
                            const text = (el.innerText || el.textContent || '').trim().toLowerCase();
                            if (text && text.length <= {max} && needles.some(n => text.includes(n))) {{
                                return el;
                            }}
                        }}
                    }}
                    return null;
                }})()"#,
                needles = js_array(needles),
                tags = js_array(tags),
                max = MAX_LABEL_LEN,
            ),
        }
    }

    /// Script returning `true` if the element exists.
    pub fn find_script(&self) -> String {
        format!("(() => {{ try {{ return ({}) !== null; }} catch (e) {{ return false; }} }})()", self.element_expression())
    }

    /// Script returning `true` if the element exists and is rendered.
    pub fn visible_script(&self) -> String {
        format!(
            r#"(() => {{
                const el = {};
                if (!el) return false;
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none';
            }})()"#,
            self.element_expression()
        )
    }

    /// Script that scrolls the element into view and clicks it; `false` if absent.
    pub fn click_script(&self) -> String {
        format!(
            r#"(() => {{
                const el = {};
                if (!el) return false;
                el.scrollIntoView({{ block: 'center' }});
                el.click();
                return true;
            }})()"#,
            self.element_expression()
        )
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css `{}`", selector),
            Self::XPath(expression) => write!(f, "xpath `{}`", expression),
            Self::Text { tags, needles } => {
                write!(f, "text {:?} in <{}>", needles, tags.join("|"))
            }
        }
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn js_array(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_expression_escapes_quotes() {
        let locator = Locator::css(r#"img[src*="olxcdn"]"#);
        assert_eq!(
            locator.element_expression(),
            r#"document.querySelector("img[src*=\"olxcdn\"]")"#
        );
    }

    #[test]
    fn test_text_locator_lowercases_needles() {
        let locator = Locator::text(&["a"], &["Zdjęcia", "PHOTOS"]);
        match &locator {
            Locator::Text { needles, tags } => {
                assert_eq!(needles, &vec!["zdjęcia".to_string(), "photos".to_string()]);
                assert_eq!(tags, &vec!["a".to_string()]);
            }
            other => panic!("unexpected locator {:?}", other),
        }
        assert!(locator.element_expression().contains(r#"["zdjęcia","photos"]"#));
    }

    #[test]
    fn test_click_script_scrolls_before_click() {
        let script = Locator::xpath("//button").click_script();
        let scroll = script.find("scrollIntoView").unwrap();
        let click = script.find("el.click()").unwrap();
        assert!(scroll < click);
        assert!(script.contains("XPathResult.FIRST_ORDERED_NODE_TYPE"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Locator::css("div.x").to_string(), "css `div.x`");
        assert_eq!(
            Locator::text(&["a", "span"], &["photos"]).to_string(),
            r#"text ["photos"] in <a|span>"#
        );
    }
}
