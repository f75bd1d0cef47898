use scraper::{Html, Selector};

/// Text of every `<p>` element, in document order, joined by single spaces.
///
/// Whitespace inside a paragraph is collapsed and empty paragraphs are dropped.
///
/// ```
/// let html = "<html><body><h1>Title</h1><p>First\n  paragraph.</p><p></p><p>Second.</p></body></html>";
/// assert_eq!(scholar_web::extract::paragraph_text(html), "First paragraph. Second.");
/// ```
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };

    document
        .select(&selector)
        .map(|p| {
            p.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_scripts_and_headings() {
        let html = r#"<html><head><script>var p = "<p>no</p>";</script></head>
            <body><h2>Abstract</h2><p>We study <b>integrals</b> &amp; sums.</p></body></html>"#;
        assert_eq!(paragraph_text(html), "We study integrals & sums.");
    }

    #[test]
    fn page_without_paragraphs_is_empty() {
        assert_eq!(paragraph_text("<div>only a div</div>"), "");
    }
}
