//! Minimal `multipart/form-data` parsing for the two upload routes
//! (`media` on post creation, `pfp` on profile update). Text parts become
//! fields, parts carrying a filename become files.

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;

#[derive(Debug)]
pub struct FilePart {
    pub name: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: Vec<FilePart>,
}

impl FormData {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FilePart> {
        self.files.iter().filter(move |f| f.name == name)
    }
}

pub fn boundary_from_content_type(content_type: &str) -> Option<&str> {
    let (kind, rest) = content_type.split_once(';')?;
    if !kind.trim().eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    rest.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

pub fn parse(boundary: &str, body: &[u8]) -> Result<FormData> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut starts = Vec::new();
    let mut at = 0;
    while let Some(idx) = find(&body[at..], &delimiter) {
        starts.push(at + idx);
        at += idx + delimiter.len();
    }
    if starts.len() < 2 {
        bail!("malformed multipart body: missing boundary");
    }

    let mut form = FormData::default();
    for pair in starts.windows(2) {
        let raw = &body[pair[0] + delimiter.len()..pair[1]];
        // The closing delimiter is "--boundary--"
        if raw.starts_with(b"--") {
            break;
        }
        let part = strip_crlf(raw);
        let header_end =
            find(part, b"\r\n\r\n").ok_or_else(|| anyhow!("multipart part without headers"))?;
        let (headers, data) = (&part[..header_end], &part[header_end + 4..]);
        parse_part(headers, data, &mut form)?;
    }
    Ok(form)
}

fn parse_part(headers: &[u8], data: &[u8], form: &mut FormData) -> Result<()> {
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in String::from_utf8_lossy(headers).lines() {
        let Some((header, value)) = line.split_once(':') else {
            continue;
        };
        if header.trim().eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';') {
                if let Some((key, val)) = param.split_once('=') {
                    let val = val.trim().trim_matches('"').to_string();
                    match key.trim() {
                        "name" => name = Some(val),
                        "filename" => filename = Some(val),
                        _ => {}
                    }
                }
            }
        } else if header.trim().eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    let name = name.ok_or_else(|| anyhow!("multipart part without a field name"))?;
    match filename {
        Some(filename) => form.files.push(FilePart {
            name,
            filename,
            content_type,
            data: data.to_vec(),
        }),
        None => {
            form.fields
                .insert(name, String::from_utf8_lossy(data).into_owned());
        }
    }
    Ok(())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn strip_crlf(part: &[u8]) -> &[u8] {
    let part = part.strip_prefix(b"\r\n").unwrap_or(part);
    part.strip_suffix(b"\r\n").unwrap_or(part)
}
