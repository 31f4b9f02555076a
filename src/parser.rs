//! Markup scanning for the ranking page and item pages.
//!
//! The pages are old table layouts with stable class names, so a tag scanner
//! over a lowercase shadow of the document is enough. Lowercasing is ASCII
//! only, which keeps byte offsets identical between the shadow and the
//! original text.

use crate::error::{AppError, Result};
use crate::types::{Row, Trend};

/// Class of the cell holding an item's hits-per-day value and trend image.
const VALUE_CLASS: &str = "phr3";
/// Class of the cell holding the item's name link; directly precedes the value cell.
const NAME_CLASS: &str = "phr2";
/// Class of the item page cell that links to the screenshot.
const SCREENSHOT_CLASS: &str = "tablestitle";

/// Parse every ranking row from the front page, in table order.
pub fn parse_rows(html: &str, base_url: &str) -> Result<Vec<Row>> {
    let lc = html.to_ascii_lowercase();
    let mut rows = Vec::new();
    let mut prev_cell: Option<(usize, usize)> = None;
    let mut cursor = 0;

    while let Some((start, end)) = next_block(&lc, "td", cursor) {
        cursor = end;
        if !has_class(open_tag(&lc[start..end]), VALUE_CLASS) {
            prev_cell = Some((start, end));
            continue;
        }

        let index = rows.len();
        let name_cell = prev_cell
            .take()
            .filter(|&(s, e)| has_class(open_tag(&lc[s..e]), NAME_CLASS))
            .ok_or_else(|| {
                AppError::Parse(format!(
                    "td.{VALUE_CLASS} with index {index} is not preceded by td.{NAME_CLASS}"
                ))
            })?;

        rows.push(parse_row(index, html, &lc, name_cell, (start, end), base_url)?);
    }

    if rows.is_empty() {
        return Err(AppError::Parse(format!("there are no td.{VALUE_CLASS} cells")));
    }
    Ok(rows)
}

fn parse_row(
    index: usize,
    html: &str,
    lc: &str,
    (name_start, name_end): (usize, usize),
    (value_start, value_end): (usize, usize),
    base_url: &str,
) -> Result<Row> {
    let value_cell = &html[value_start..value_end];
    let value_lc = &lc[value_start..value_end];

    let img = find_open_tag(value_lc, "img")
        .map(|(s, e)| &value_cell[s..e])
        .ok_or_else(|| AppError::Parse(format!("td.{VALUE_CLASS} with index {index} has no img")))?;
    let alt = attr(img, "alt").ok_or_else(|| {
        AppError::Parse(format!("img in td.{VALUE_CLASS} with index {index} has no alt attribute"))
    })?;
    let trend = Trend::from_symbol(&alt).ok_or_else(|| {
        AppError::Parse(format!("unexpected alt {alt:?} in td.{VALUE_CLASS} with index {index}"))
    })?;

    let text = strip_tags(inner(value_cell));
    let value = text.parse::<u32>().map_err(|_| {
        AppError::Parse(format!("td.{VALUE_CLASS} with index {index} holds {text:?}, not a number"))
    })?;

    let name_cell = &html[name_start..name_end];
    let (a_start, a_end) = next_block(&lc[name_start..name_end], "a", 0).ok_or_else(|| {
        AppError::Parse(format!("td.{NAME_CLASS} before index {index} has no link"))
    })?;
    let anchor = &name_cell[a_start..a_end];
    let item_id = strip_tags(inner(anchor));
    if item_id.is_empty() {
        return Err(AppError::Parse(format!("link in td.{NAME_CLASS} before index {index} is empty")));
    }
    let href = attr(open_tag(anchor), "href").ok_or_else(|| {
        AppError::Parse(format!("link in td.{NAME_CLASS} before index {index} has no href"))
    })?;

    Ok(Row {
        item_id,
        item_url: resolve_url(base_url, &href),
        value,
        trend,
    })
}

/// Find the screenshot link on an item page and return it as an absolute URL.
pub fn parse_screenshot_url(html: &str, base_url: &str) -> Result<String> {
    let lc = html.to_ascii_lowercase();
    let mut cursor = 0;

    while let Some((start, end)) = next_block(&lc, "td", cursor) {
        cursor = end;
        if !has_class(open_tag(&lc[start..end]), SCREENSHOT_CLASS) {
            continue;
        }
        let cell = &html[start..end];
        if let Some((s, e)) = find_open_tag(&lc[start..end], "a") {
            if let Some(href) = attr(&cell[s..e], "href") {
                return Ok(resolve_url(base_url, &href));
            }
        }
    }
    Err(AppError::Parse("could not find a screenshot link".to_string()))
}

/// Prefix relative links with the site root. Absolute links pass through.
pub fn resolve_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        href.trim_start_matches('/')
    )
}

// ---------------------------------------------------------------------------
// Tag scanning
// ---------------------------------------------------------------------------

/// Locate the next `<name ...>...</name>` block at or after `from` in a
/// lowercase document. Returns byte offsets of the whole block.
///
/// A cell whose `</td>` is omitted ends where the next cell, row or table
/// boundary starts; the block then has no closing tag.
fn next_block(lc: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let (start, open_end) = find_open_tag(lc.get(from..)?, name)?;
    let (start, open_end) = (start + from, open_end + from);
    let rest = &lc[open_end..];

    let close = rest.find(&format!("</{name}"));
    let implied = implied_end(&rest[..close.unwrap_or(rest.len())], name);
    match (close, implied) {
        (_, Some(i)) => Some((start, open_end + i)),
        (Some(c), None) => Some((start, tag_end(lc, open_end + c)?)),
        (None, None) => None,
    }
}

/// Offset of the first tag in `rest` that implicitly closes an open `name`.
fn implied_end(rest: &str, name: &str) -> Option<usize> {
    if name != "td" {
        return None;
    }
    let opens = ["td", "th", "tr"]
        .iter()
        .filter_map(|t| find_open_tag(rest, t).map(|(s, _)| s));
    let closes = ["</tr", "</table"].iter().filter_map(|t| rest.find(t));
    opens.chain(closes).min()
}

/// Locate the first opening tag `<name` (followed by whitespace, `/` or `>`).
/// Returns offsets of the opening tag including its closing `>`.
fn find_open_tag(lc: &str, name: &str) -> Option<(usize, usize)> {
    let pat = format!("<{name}");
    let mut from = 0;
    while let Some(rel) = lc[from..].find(&pat) {
        let start = from + rel;
        let after = start + pat.len();
        match lc.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {
                return Some((start, tag_end(lc, after)?));
            }
            Some(_) => from = after,
            None => return None,
        }
    }
    None
}

/// Offset just past the `>` closing the tag that is open at `from`.
/// A `>` inside a quoted attribute value does not close the tag.
fn tag_end(s: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in s.as_bytes().iter().enumerate().skip(from) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn open_tag(block: &str) -> &str {
    match tag_end(block, 0) {
        Some(end) => &block[..end],
        None => block,
    }
}

/// Content between the opening tag and the trailing closing tag, if any.
fn inner(block: &str) -> &str {
    let Some(oe) = tag_end(block, 0) else {
        return "";
    };
    match block.rfind('<') {
        Some(cs) if cs >= oe && block[cs..].starts_with("</") && block.ends_with('>') => &block[oe..cs],
        _ => &block[oe..],
    }
}

fn has_class(tag: &str, class: &str) -> bool {
    attr(tag, "class").map_or(false, |v| {
        v.split_ascii_whitespace().any(|c| c.eq_ignore_ascii_case(class))
    })
}

/// Read an attribute value from an opening tag. Quoted or bare values;
/// entities in the value are decoded.
fn attr(tag: &str, name: &str) -> Option<String> {
    let lc = tag.to_ascii_lowercase();
    let bytes = lc.as_bytes();
    let mut from = 0;

    while let Some(rel) = lc[from..].find(name) {
        let start = from + rel;
        from = start + name.len();

        let boundary = start > 0 && bytes[start - 1].is_ascii_whitespace();
        let mut i = from;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if !boundary || bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let raw = match bytes.get(i) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let end = tag[i + 1..].find(q as char)? + i + 1;
                &tag[i + 1..end]
            }
            Some(_) => {
                let end = tag[i..]
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .map_or(tag.len(), |e| e + i);
                tag[i..end].trim_end_matches('/')
            }
            None => return None,
        };
        return Some(decode_entities(raw));
    }
    None
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    let mut quote: Option<char> = None;
    for ch in s.chars() {
        match (in_tag, quote, ch) {
            (true, Some(q), _) if ch == q => quote = None,
            (true, Some(_), _) => {}
            (true, None, '"' | '\'') => quote = Some(ch),
            (true, None, '>') => in_tag = false,
            (true, None, _) => {}
            (false, _, '<') => in_tag = true,
            (false, _, _) => out.push(ch),
        }
    }
    decode_entities(out.split_whitespace().collect::<Vec<_>>().join(" ").as_str())
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
