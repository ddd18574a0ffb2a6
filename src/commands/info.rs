use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::pdf::PdfDocument;

#[derive(Debug, Serialize)]
pub struct InfoOutcome {
    pub path: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
}

impl fmt::Display for InfoOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File: {}\nPages: {}", self.path, self.page_count)?;
        let fields = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                write!(f, "\n{}: {}", label, value)?;
            }
        }
        if let Some(date) = &self.creation_date {
            write!(f, "\nCreated: {}", format_pdf_date(date))?;
        }
        if let Some(date) = &self.mod_date {
            write!(f, "\nModified: {}", format_pdf_date(date))?;
        }
        Ok(())
    }
}

pub fn run<P: AsRef<Path>>(path: P) -> Result<InfoOutcome> {
    let doc = PdfDocument::open(&path)?;
    let info = doc.get_info();
    Ok(InfoOutcome {
        path: path.as_ref().display().to_string(),
        page_count: info.page_count,
        title: info.title,
        author: info.author,
        subject: info.subject,
        keywords: info.keywords,
        creator: info.creator,
        producer: info.producer,
        creation_date: info.creation_date,
        mod_date: info.mod_date,
    })
}

/// `D:YYYYMMDDHHmmSS...` as `YYYY-MM-DD HH:mm:SS`; anything else unchanged.
fn format_pdf_date(date: &str) -> String {
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    if d.len() < 8 || !d.as_bytes()[..8].iter().all(u8::is_ascii_digit) {
        return date.to_string();
    }
    let time = match d.get(8..14) {
        Some(t) if t.bytes().all(|b| b.is_ascii_digit()) => {
            format!(" {}:{}:{}", &t[0..2], &t[2..4], &t[4..6])
        }
        _ => String::new(),
    };
    format!("{}-{}-{}{}", &d[0..4], &d[4..6], &d[6..8], time)
}
