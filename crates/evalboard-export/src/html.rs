//! 단독 HTML 문서 생성.

/// 외부 뷰어 자리에 넣는 안내 문구
pub const EMBED_PLACEHOLDER: &str =
    r#"<div class="embed-placeholder">이 콘텐츠는 인쇄 버전에서 표시되지 않습니다.</div>"#;

/// 외부 뷰어 태그 (닫는 태그가 있는 것과 없는 것)
const EMBED_TAGS: [(&str, bool); 4] = [
    ("iframe", true),
    ("object", true),
    ("video", true),
    ("embed", false),
];

/// 마크업과 스타일시트를 하나의 문서로 합침
pub fn standalone_document(title: &str, markup: &str, stylesheets: &[String]) -> String {
    let mut doc = String::with_capacity(markup.len() + 512);
    doc.push_str("<!DOCTYPE html>\n<html lang=\"ko\">\n<head>\n<meta charset=\"utf-8\">\n");
    doc.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    doc.push_str(&format!("<title>{}</title>\n", escape_text(title)));
    for css in stylesheets {
        doc.push_str("<style>\n");
        doc.push_str(css);
        doc.push_str("\n</style>\n");
    }
    doc.push_str("</head>\n<body>\n");
    doc.push_str(markup);
    doc.push_str("\n</body>\n</html>\n");
    doc
}

/// 인쇄용 마크업: 외부 뷰어 요소를 안내 문구로 교체
pub fn print_markup(markup: &str) -> String {
    EMBED_TAGS
        .iter()
        .fold(markup.to_string(), |acc, (tag, paired)| {
            replace_elements(&acc, tag, *paired)
        })
}

fn replace_elements(markup: &str, tag: &str, paired: bool) -> String {
    let lower = markup.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut out = String::with_capacity(markup.len());
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find(&open) {
        let start = cursor + found;
        // `<iframe`와 `<iframes` 같은 접두 일치 구분
        let boundary = lower[start + open.len()..].chars().next();
        if !matches!(boundary, Some(c) if c.is_whitespace() || c == '>' || c == '/') {
            out.push_str(&markup[cursor..start + open.len()]);
            cursor = start + open.len();
            continue;
        }

        let Some(tag_end) = lower[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let self_closing = lower[start..tag_end].ends_with("/>");
        let end = if paired && !self_closing {
            match lower[tag_end..].find(&close) {
                Some(i) => tag_end + i + close.len(),
                None => tag_end,
            }
        } else {
            tag_end
        };

        out.push_str(&markup[cursor..start]);
        out.push_str(EMBED_PLACEHOLDER);
        cursor = end;
    }
    out.push_str(&markup[cursor..]);
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
