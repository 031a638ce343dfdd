//! Directory listing page

use crate::http::path::percent_encode_path;
use std::io;
use std::path::Path;
use tokio::fs;

struct ListingEntry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

/// Render an HTML listing of `dir`, titled with the decoded URL path
pub async fn render(dir: &Path, url_path: &str) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let file_type = entry.file_type().await?;
        // Follow symlinks for the directory check, as a browser would
        let is_dir = if file_type.is_symlink() {
            fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir())
        } else {
            file_type.is_dir()
        };
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink: file_type.is_symlink(),
        });
    }
    entries.sort_by_key(|e| e.name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(url_path));
    let mut html = String::new();
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{title}</title>\n</head>\n<body>\n"));
    html.push_str(&format!("<h1>{title}</h1>\n<hr>\n<ul>\n"));
    for entry in &entries {
        let (display, link) = if entry.is_dir {
            (format!("{}/", entry.name), format!("{}/", entry.name))
        } else if entry.is_symlink {
            (format!("{}@", entry.name), entry.name.clone())
        } else {
            (entry.name.clone(), entry.name.clone())
        };
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            percent_encode_path(&link),
            escape_html(&display)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
