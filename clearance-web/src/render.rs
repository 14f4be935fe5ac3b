//! Server-rendered HTML pages
//!
//! Every value taken from an upload passes through [`escape`] before it is
//! interpolated.

use axum::http::StatusCode;
use clearance_common::CandidateRecord;

use crate::verification::{ListingContext, VerificationContext};

const STYLE: &str = r#"
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            max-width: 1000px;
            margin: 40px auto;
            padding: 20px;
            line-height: 1.6;
            color: #222;
        }
        h1 {
            border-bottom: 2px solid #0a6e3c;
            padding-bottom: 10px;
        }
        .identity dt { font-weight: 600; }
        .identity dd { margin: 0 0 8px 0; }
        .count {
            font-size: 20px;
            background: #eef7f1;
            border-left: 4px solid #0a6e3c;
            padding: 8px 12px;
        }
        table { border-collapse: collapse; width: 100%; font-size: 14px; }
        th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }
        th { background: #f3f3f3; }
        .qr img { width: 220px; height: 220px; }
        .muted { color: #777; font-size: 13px; }
"#;

/// Escape text for HTML element and attribute content
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
        style = STYLE,
        body = body,
    )
}

fn identity(school_name: &str, school_code: &str, principal: &str) -> String {
    format!(
        r#"<dl class="identity">
    <dt>School name</dt><dd>{}</dd>
    <dt>School code</dt><dd>{}</dd>
    <dt>Name of principal</dt><dd>{}</dd>
</dl>"#,
        escape(school_name),
        escape(school_code),
        escape(principal)
    )
}

/// Column names across all rows, first-seen order
fn columns(rows: &[CandidateRecord]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for name in rows.iter().flat_map(CandidateRecord::names) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn rows_table(rows: &[CandidateRecord]) -> String {
    if rows.is_empty() {
        return "<p class=\"muted\">No candidate rows in this upload.</p>".to_string();
    }

    let names = columns(rows);
    let mut html = String::from("<table>\n<thead><tr><th>#</th>");
    for name in &names {
        html.push_str(&format!("<th>{}</th>", escape(name)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for (i, row) in rows.iter().enumerate() {
        html.push_str(&format!("<tr><td>{}</td>", i + 1));
        for name in &names {
            html.push_str(&format!("<td>{}</td>", escape(row.get(name).unwrap_or(""))));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

/// GET / upload form
pub fn upload_page() -> String {
    page(
        "Upload candidate roster",
        r#"<h1>Upload candidate roster</h1>
<p>Upload the WAEC candidate CSV, or any CSV with a header row.</p>
<form id="upload" action="/upload" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".csv,text/csv" required>
    <button type="submit">Upload</button>
</form>
<div id="result"></div>
<script>
document.getElementById('upload').addEventListener('submit', async (event) => {
    event.preventDefault();
    const result = document.getElementById('result');
    const response = await fetch('/upload', { method: 'POST', body: new FormData(event.target) });
    const data = await response.json();
    result.textContent = '';
    if (!response.ok) {
        result.textContent = data.error ? data.error.message : 'Upload failed';
        return;
    }
    for (const [label, href] of [['Clearance listing', data.index_url], ['Verification page', data.verify_url]]) {
        const p = document.createElement('p');
        const a = document.createElement('a');
        a.href = href;
        a.textContent = label;
        p.appendChild(a);
        result.appendChild(p);
    }
});
</script>"#,
    )
}

/// Clearance listing
pub fn listing_page(ctx: &ListingContext) -> String {
    let body = format!(
        r#"<h1>Candidate clearance</h1>
{identity}
<p class="count">Recommended candidates: <strong>{count}</strong> of {total}</p>
{table}
<p class="muted">Record {record_id}</p>"#,
        identity = identity(&ctx.school_name, &ctx.school_code, &ctx.principal),
        count = ctx.recommended_count,
        total = ctx.rows.len(),
        table = rows_table(&ctx.rows),
        record_id = escape(&ctx.record_id),
    );
    page(&format!("Clearance - {}", ctx.school_name), &body)
}

/// Public verification page with embedded QR code
pub fn verification_page(ctx: &VerificationContext) -> String {
    let body = format!(
        r#"<h1>Registration verification</h1>
{identity}
<p class="count">Recommended candidates: <strong>{count}</strong></p>
<div class="qr">
    <img src="data:image/png;base64,{qr}" alt="Verification QR code">
    <p class="muted">{url}</p>
</div>
<p class="muted">Record {record_id}</p>"#,
        identity = identity(&ctx.school_name, &ctx.school_code, &ctx.principal),
        count = ctx.recommended_count,
        qr = ctx.qr_code,
        url = escape(&ctx.verification_url),
        record_id = escape(&ctx.record_id),
    );
    page(&format!("Verification - {}", ctx.school_name), &body)
}

/// Error page
pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<h1>{} {}</h1>\n<p>{}</p>",
        status.as_u16(),
        escape(status.canonical_reason().unwrap_or("Error")),
        escape(message)
    );
    page(status.canonical_reason().unwrap_or("Error"), &body)
}
