//! services/api/src/adapters/html.rs
//!
//! Renders portfolio entries as HTML fragments and splices them into the
//! portfolio page.

use portfolio_copilot_core::domain::{PortfolioSection, ProjectEntry, UpdateRequest, WorkEntry};
use portfolio_copilot_core::ports::{PortError, PortResult};
use regex::Regex;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn render_project(entry: &ProjectEntry) -> String {
    let mut html = String::from("<div class=\"project-item\">\n");
    html.push_str(&format!("  <h3>{}</h3>\n", escape(entry.title.trim())));
    html.push_str(&format!("  <p>{}</p>\n", escape(entry.description.trim())));
    if let Some(tech) = non_blank(Some(&entry.technologies)) {
        html.push_str(&format!(
            "  <p class=\"technologies\"><strong>Technologies:</strong> {}</p>\n",
            escape(tech)
        ));
    }
    if let Some(link) = non_blank(entry.link.as_deref()).filter(|l| *l != "#") {
        html.push_str(&format!(
            "  <a href=\"{}\" target=\"_blank\" rel=\"noopener\">View Project</a>\n",
            escape(link)
        ));
    }
    html.push_str("</div>");
    html
}

pub fn render_work(entry: &WorkEntry) -> String {
    let company = match non_blank(entry.company_url.as_deref()).filter(|u| *u != "#") {
        Some(url) => format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
            escape(url),
            escape(entry.company.trim())
        ),
        None => escape(entry.company.trim()),
    };
    let mut html = String::from("<div class=\"experience-item\">\n");
    html.push_str(&format!("  <h3>{} at {}</h3>\n", escape(entry.title.trim()), company));
    if let Some(team) = non_blank(entry.team_name.as_deref()) {
        html.push_str(&format!("  <p class=\"team\">Team: {}</p>\n", escape(team)));
    }
    html.push_str(&format!("  <p class=\"years\">{}</p>\n", escape(entry.year_range.trim())));
    if let Some(description) = non_blank(entry.description.as_deref()) {
        html.push_str(&format!("  <p>{}</p>\n", escape(description)));
    }
    if let Some(tech) = non_blank(entry.technologies.as_deref()) {
        html.push_str(&format!(
            "  <p class=\"technologies\"><strong>Technologies:</strong> {}</p>\n",
            escape(tech)
        ));
    }
    html.push_str("</div>");
    html
}

pub fn render(update: &UpdateRequest) -> String {
    match update {
        UpdateRequest::Project(entry) => render_project(entry),
        UpdateRequest::Work(entry) => render_work(entry),
    }
}

/// Inserts `fragment` as the last child of the element whose `id` is the
/// section's anchor.
pub fn splice_into_section(document: &str, section: PortfolioSection, fragment: &str) -> PortResult<String> {
    let anchor = section.anchor_id();
    let opener = Regex::new(&format!(
        r#"(?i)<([a-z][a-z0-9]*)\b[^>]*\sid\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(anchor)
    ))
    .map_err(|e| PortError::Unexpected(e.to_string()))?;

    let not_found = || PortError::SectionNotFound(format!("no element with id=\"{}\"", anchor));
    let open = opener.captures(document).ok_or_else(not_found)?;
    let (Some(whole), Some(tag)) = (open.get(0), open.get(1)) else {
        return Err(not_found());
    };

    let tags = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(tag.as_str())))
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    let mut depth = 1usize;
    for found in tags.captures_iter(&document[whole.end()..]) {
        let Some(m) = found.get(0) else { continue };
        let closing = found.get(1).is_some_and(|slash| !slash.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                let at = whole.end() + m.start();
                let mut updated = String::with_capacity(document.len() + fragment.len() + 1);
                updated.push_str(&document[..at]);
                updated.push_str(fragment);
                updated.push('\n');
                updated.push_str(&document[at..]);
                return Ok(updated);
            }
        } else if !m.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    Err(PortError::SectionNotFound(format!(
        "element with id=\"{}\" is never closed",
        anchor
    )))
}
