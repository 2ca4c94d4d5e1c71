//! Tag-level HTML helpers
//!
//! Just enough to walk `<table>`/`<tr>`/`<td>` blocks of loosely formed
//! results pages. Matching is ASCII case-insensitive and byte offsets in the
//! lowered copy line up with the input because only ASCII is lowered.

/// Lowercase ASCII letters, leave everything else as is.
pub fn lower_ascii(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// Position of the next `<name` open tag at or after `from`, where the tag
/// name is followed by whitespace, `>` or `/` (so `<tr` never matches
/// `<track`).
fn find_open_tag(lowered: &str, name: &str, from: usize) -> Option<usize> {
    let needle = format!("<{name}");
    let mut pos = from;
    loop {
        let start = lowered.get(pos..)?.find(&needle)? + pos;
        let after = start + needle.len();
        match lowered.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(start),
            None => return None,
            _ => pos = after,
        }
    }
}

/// Byte range `(start, end)` of the next `<name ...>` block at or after
/// `from`. `end` points just past the closing tag, or at the tag that closes
/// the block implicitly for table cells and rows (`<td>a<td>b`). Nested
/// tables are skipped whole, so their rows and cells stay inside the
/// enclosing block.
pub fn next_element(s: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    next_element_in(s, &lower_ascii(s), name, from)
}

fn next_element_in(s: &str, lowered: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let start = find_open_tag(lowered, name, from)?;
    let open_end = s[start..].find('>')? + start + 1;

    let mut pos = open_end;
    while let Some(offset) = lowered[pos..].find('<') {
        let at = pos + offset;
        let Some((tag, closing)) = tag_at(lowered, at) else {
            pos = at + 1;
            continue;
        };
        if closing && tag == name {
            let end = lowered[at..].find('>').map_or(lowered.len(), |i| at + i + 1);
            return Some((start, end));
        }
        if !closing && tag == "table" {
            match next_element_in(s, lowered, "table", at) {
                Some((_, nested_end)) => {
                    pos = nested_end;
                    continue;
                }
                None => break,
            }
        }
        if ends_implicitly(name, tag, closing) {
            return Some((start, at));
        }
        pos = at + 1;
    }

    // End of input closes cells and rows, never a table.
    matches!(name, "td" | "th" | "tr").then_some((start, s.len()))
}

/// Name of the tag starting at `pos` and whether it is a closing tag.
fn tag_at(lowered: &str, pos: usize) -> Option<(&str, bool)> {
    let rest = lowered.get(pos + 1..)?;
    let (closing, rest) = match rest.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    let len = rest.bytes().take_while(u8::is_ascii_alphanumeric).count();
    (len > 0).then(|| (&rest[..len], closing))
}

/// Whether `tag` ends an open `name` block that has no closing tag of its
/// own.
fn ends_implicitly(name: &str, tag: &str, closing: bool) -> bool {
    const SECTIONS: [&str; 3] = ["tbody", "thead", "tfoot"];
    let section = SECTIONS.contains(&tag);
    match (name, closing) {
        ("td" | "th", false) => matches!(tag, "td" | "th" | "tr") || section,
        ("td" | "th", true) => matches!(tag, "tr" | "table") || section,
        ("tr", false) => tag == "tr" || section,
        ("tr", true) => tag == "table" || section,
        _ => false,
    }
}

/// All `<name>` blocks of `s`, in document order.
pub fn elements<'a>(s: &'a str, name: &str) -> Vec<&'a str> {
    let lowered = lower_ascii(s);
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some((start, end)) = next_element_in(s, &lowered, name, pos) {
        out.push(&s[start..end]);
        pos = end;
    }
    out
}

/// Every `<name>` block of `s` including nested ones, ordered by opening
/// tag.
pub fn all_elements<'a>(s: &'a str, name: &str) -> Vec<&'a str> {
    let lowered = lower_ascii(s);
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some((start, end)) = next_element_in(s, &lowered, name, pos) {
        out.push(&s[start..end]);
        pos = start + 1;
    }
    out
}

/// Content after the opening tag of `block`, without its closing tag when
/// it has one.
pub fn inner_html(block: &str) -> &str {
    let Some(open_end) = block.find('>') else {
        return "";
    };
    let name = tag_at(&lower_ascii(&block[..open_end]), 0)
        .map(|(name, _)| name.to_string())
        .unwrap_or_default();
    let body = &block[open_end + 1..];
    let close = format!("</{name}>");
    let trimmed = body.trim_end();
    let Some(at) = trimmed.len().checked_sub(close.len()) else {
        return body;
    };
    match trimmed.get(at..) {
        Some(tail) if tail.eq_ignore_ascii_case(&close) => &trimmed[..at],
        _ => body,
    }
}

/// Drop every `<...>` tag, keeping text content.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Decode the handful of entities results pages actually use.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse whitespace runs to a single space and trim.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of one cell block.
pub fn cell_text(block: &str) -> String {
    collapse_ws(&decode_entities(&strip_tags(inner_html(block))))
}
