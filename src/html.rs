//! Small HTML building blocks shared by every generated page.

/// Escapes text for use in element content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escapes free text and keeps its line breaks
pub fn multiline(text: &str) -> String {
    text.trim()
        .lines()
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br>\n")
}

/// Wraps `body` in a complete document.
///
/// `to_site` is the relative path from the page to the site directory
/// ("" or "../"), used to reach the stylesheet and the index.
pub fn page(title: &str, to_site: &str, body: &str) -> String {
    let mut content = String::new();
    content.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    content.push_str("<meta charset=\"utf-8\">\n");
    content.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    content.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    content.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{to_site}style.css\">\n"
    ));
    content.push_str("</head>\n<body>\n");
    content.push_str(&format!(
        "<nav class=\"top\"><a href=\"{to_site}index.html\">Albums</a> \
         <a href=\"{to_site}tags/index.html\">Tags</a> \
         <a href=\"{to_site}favorites.html\">Favorites</a> \
         <a href=\"{to_site}popular.html\">Popular</a></nav>\n"
    ));
    content.push_str("<main>\n");
    content.push_str(body);
    content.push_str("</main>\n</body>\n</html>\n");
    content
}

/// One thumbnail tile linking to a page, with an optional note under the caption
pub fn tile(href: &str, src: Option<&str>, caption: &str, note: Option<&str>) -> String {
    let mut content = format!("<li><a href=\"{}\">", escape_html(href));
    match src {
        Some(src) => content.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            escape_html(src),
            escape_html(caption)
        )),
        None => content.push_str("<span class=\"no-image\"></span>"),
    }
    content.push_str(&format!(
        "<span class=\"caption\">{}</span>",
        escape_html(caption)
    ));
    if let Some(note) = note {
        content.push_str(&format!("<span class=\"count\">{}</span>", escape_html(note)));
    }
    content.push_str("</a></li>\n");
    content
}

pub const STYLE_CSS: &str = "\
body { font-family: -apple-system, Helvetica, Arial, sans-serif; margin: 0; color: #222; background: #fafafa; }
main { max-width: 1100px; margin: 0 auto; padding: 1em; }
nav.top { background: #222; padding: 0.6em 1em; }
nav.top a { color: #fff; margin-right: 1.2em; text-decoration: none; }
a { color: #0063dc; }
ul.grid { list-style: none; padding: 0; display: flex; flex-wrap: wrap; gap: 12px; }
ul.grid li { width: 180px; }
ul.grid img, ul.grid .no-image { display: block; width: 180px; height: 180px; object-fit: cover; background: #ddd; }
ul.grid .caption, ul.grid .count { display: block; font-size: 0.85em; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.count { color: #777; font-size: 0.85em; }
figure.photo { margin: 0; }
figure.photo img { max-width: 100%; height: auto; }
.placeholder { padding: 4em 1em; background: #eee; text-align: center; color: #777; }
.meta { color: #555; }
.favorite { color: #ff0084; }
ul.tags { list-style: none; padding: 0; }
ul.tags li { display: inline-block; margin: 0 0.5em 0.5em 0; }
ol.comments { list-style: none; padding: 0; }
ol.comments li { border-top: 1px solid #ddd; padding: 0.6em 0; }
.comment-meta { color: #777; font-size: 0.85em; }
table.exif { border-collapse: collapse; font-size: 0.85em; }
table.exif th { text-align: left; padding: 0.2em 1em 0.2em 0; color: #555; }
";
