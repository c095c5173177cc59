//! 用户输入清洗
//!
//! 去除自由文本中的 HTML 标记，并裁剪首尾空白。

/// 识别为标签的 HTML 元素名（小写）
const HTML_ELEMENTS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "center", "cite", "code", "col",
    "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt",
    "em", "embed", "fieldset", "figcaption", "figure", "font", "footer", "form", "frame",
    "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "i", "iframe",
    "img", "input", "ins", "kbd", "label", "legend", "li", "link", "main", "map", "mark", "marquee",
    "meta", "meter", "nav", "noscript", "object", "ol", "optgroup", "option", "output", "p",
    "param", "picture", "pre", "progress", "q", "rp", "rt", "ruby", "s", "samp", "script",
    "section", "select", "small", "source", "span", "strike", "strong", "style", "sub",
    "summary", "sup", "svg", "table", "tbody", "td", "template", "textarea", "tfoot", "th",
    "thead", "time", "title", "tr", "track", "tt", "u", "ul", "var", "video", "wbr",
];

/// 去掉所有标记标签，保留内部空白，裁剪首尾空白。
///
/// `<` 到下一个 `>` 之间的内容只有在构成完整标签时才会被去掉：
/// 注释、声明（`<!...>`、`<?...>`）或已知 HTML 元素的开闭标签。
/// 其余情况（未闭合、元素名未知、中途又出现 `<`）原样保留，
/// 因此 `if a<b then c`、`x<y and y>z` 这类文本不会丢内容。
pub fn strip_markup(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        result.push_str(&rest[..start]);
        let candidate = &rest[start..];

        match tag_len(candidate) {
            Some(len) => rest = &candidate[len..],
            None => {
                result.push('<');
                rest = &candidate[1..];
            }
        }
    }
    result.push_str(rest);

    result.trim().to_owned()
}

/// `candidate` 以 `<` 开头；构成完整标签时返回标签的字节长度
fn tag_len(candidate: &str) -> Option<usize> {
    let body = &candidate[1..];
    let end = body.find(|c: char| c == '>' || c == '<')?;
    if !body[end..].starts_with('>') {
        return None;
    }

    let inner = &body[..end];
    if is_tag(inner) {
        Some(end + 2)
    } else {
        None
    }
}

fn is_tag(inner: &str) -> bool {
    if inner.starts_with('!') || inner.starts_with('?') {
        return true;
    }

    let inner = inner.strip_prefix('/').unwrap_or(inner);
    let name_end = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    let (name, after) = inner.split_at(name_end);

    let delimited = after
        .chars()
        .next()
        .map_or(true, |c| c.is_whitespace() || c == '/');

    delimited && HTML_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_simple_tags() {
        assert_eq!(strip_markup("<b>Alice</b>"), "Alice");
        assert_eq!(strip_markup("<B>Alice</B>"), "Alice");
    }

    #[test]
    fn strips_tags_with_attributes_and_comments() {
        assert_eq!(
            strip_markup(r#"<a href="x">link</a><!-- note -->!"#),
            "link!"
        );
        assert_eq!(strip_markup("<script>alert(1)</script>"), "alert(1)");
        assert_eq!(strip_markup("line<br/>break<hr />"), "linebreak");
    }

    #[test]
    fn trims_outer_whitespace_and_keeps_inner() {
        assert_eq!(strip_markup("  hello   <i>big</i>  world \n"), "hello   big  world");
    }

    #[test]
    fn keeps_lone_angle_brackets() {
        assert_eq!(strip_markup("1 < 2 and 3 > 2"), "1 < 2 and 3 > 2");
    }

    #[test]
    fn keeps_comparisons_that_look_like_tags() {
        assert_eq!(strip_markup("if a<b then c"), "if a<b then c");
        assert_eq!(strip_markup("x<y and y>z ok"), "x<y and y>z ok");
        assert_eq!(strip_markup("a<b<i>c</i>"), "a<bc");
        assert_eq!(strip_markup("Vec<String>"), "Vec<String>");
    }

    #[test]
    fn unterminated_tag_is_kept_as_text() {
        assert_eq!(strip_markup("bob<img src=x"), "bob<img src=x");
    }

    #[test]
    fn empty_and_markup_only_inputs_become_empty() {
        assert_eq!(strip_markup(""), "");
        assert_eq!(strip_markup("   "), "");
        assert_eq!(strip_markup("<p></p>"), "");
    }
}
