//! `courses`: print the course catalog.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use bb_vault::CourseService;
use bb_vault::parser::{CoursesByTerm, TermCourses};
use tracing::info;

use super::build_auth_client;
use crate::config::Settings;

/// Options for the `courses` command.
#[derive(Debug, Clone, Default)]
pub struct CoursesArgs {
    pub terms: Vec<String>,
    pub announcements: bool,
    pub json: bool,
}

pub async fn run_courses_command(
    settings: &Settings,
    username: Option<String>,
    args: &CoursesArgs,
) -> Result<()> {
    let mut auth = build_auth_client(settings, username)?;
    auth.ensure_session().await.context("Login failed")?;

    let mut service = CourseService::new(auth.http_client(), settings.endpoints.clone());
    if let Some(dir) = &settings.debug_dump_dir {
        service = service.with_debug_dump(dir);
    }
    let catalog = service
        .list_courses()
        .await
        .context("Failed to fetch the course list")?;

    let selected = select_terms(&catalog, &args.terms)?;
    info!(terms = selected.len(), "Course catalog loaded");

    if args.json {
        let json = serde_json::to_string_pretty(&selected)?;
        println!("{json}");
    } else {
        print!("{}", render_listing(&selected, args.announcements));
    }
    Ok(())
}

fn select_terms<'a>(catalog: &'a CoursesByTerm, terms: &[String]) -> Result<Vec<&'a TermCourses>> {
    if terms.is_empty() {
        return Ok(catalog.iter().collect());
    }
    if let Some(missing) = terms.iter().find(|t| !catalog.contains(t)) {
        let known: Vec<&str> = catalog.term_ids().collect();
        bail!("Unknown term '{missing}'. Available terms: {}", known.join(", "));
    }
    Ok(catalog
        .iter()
        .filter(|term| terms.iter().any(|t| *t == term.id))
        .collect())
}

fn render_listing(terms: &[&TermCourses], announcements: bool) -> String {
    let mut out = String::new();
    for term in terms {
        let _ = writeln!(out, "{} ({})", term.id, term.heading);
        for course in &term.courses {
            let _ = writeln!(out, "  {}", course.name);
            if announcements && let Some(announcement) = &course.announcement {
                let first_line = announcement.content.lines().next().unwrap_or_default();
                let _ = writeln!(out, "    > {first_line}");
            }
        }
    }
    out
}
