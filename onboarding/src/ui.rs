//! Terminal display logic for the onboarding CLI.
//!
//! Human-readable output for each subcommand: colored status lines, the
//! spinner shown while remote lookups run, and the effective configuration.
//! JSON output is handled in `main.rs`.

use console::{pad_str, style, Alignment, Term};
use onboarding_lib::{Author, ClientConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::{ContactReport, DomainReport};

const LABEL_WIDTH: usize = 18;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message (e.g. "Looking up example.com...").
    ///
    /// Nothing is drawn when stderr is not a terminal.
    pub fn start(message: String) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let term = Term::stderr();

        if !term.is_term() {
            return Self {
                running,
                handle: None,
            };
        }

        let running_clone = running.clone();
        let handle = tokio::spawn(async move {
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Rows ─────────────────────────────────────────────────────────────────────

fn print_row(label: &str, value: impl std::fmt::Display) {
    println!(
        "  {}  {}",
        style(pad_str(label, LABEL_WIDTH, Alignment::Left, Some(".."))).dim(),
        value
    );
}

fn pass_fail(ok: bool) -> console::StyledObject<&'static str> {
    if ok {
        style("VALID").green().bold()
    } else {
        style("INVALID").red().bold()
    }
}

// ── Domain ───────────────────────────────────────────────────────────────────

/// Print the outcome of `onboarding domain`.
pub fn print_domain_report(report: &DomainReport) {
    println!("{}", style(&report.input).bold());

    print_row("Syntax", pass_fail(report.valid));
    if let Some(reason) = &report.reason {
        print_row("Reason", style(reason).red());
    }

    if let Some(domain) = &report.domain {
        print_row("Second-level", &domain.second_level_domain);
        print_row("Top-level", &domain.top_level_domain);
    }

    match report.available {
        Some(true) => print_row("Availability", style("AVAILABLE").green().bold()),
        Some(false) => print_row("Availability", style("UNAVAILABLE").red().bold()),
        None if report.valid => print_row("Availability", style("not checked").dim()),
        None => {}
    }

    if let Some(registrar) = report.whois.as_ref().and_then(|w| w.registrar.as_ref()) {
        print_row("Registrar", style(registrar).dim());
    }
    if let Some(expires) = report.whois.as_ref().and_then(|w| w.expiration_date.as_ref()) {
        print_row("Expires", style(expires).dim());
    }
}

// ── Contact ──────────────────────────────────────────────────────────────────

/// Print the outcome of `onboarding contact`.
pub fn print_contact_report(report: &ContactReport) {
    if let (Some(email), Some(valid)) = (&report.email, report.email_valid) {
        print_row(&format!("Email {}", email), pass_fail(valid));
    }
    if let (Some(phone), Some(valid)) = (&report.phone, report.phone_valid) {
        print_row(&format!("Phone {}", phone), pass_fail(valid));
    }
}

// ── Authors ──────────────────────────────────────────────────────────────────

/// Print the authors registered for a domain.
pub fn print_authors(domain: &str, authors: &[Author]) {
    println!(
        "{} {}",
        style(domain).bold(),
        style(format!(
            "({} author{})",
            authors.len(),
            if authors.len() == 1 { "" } else { "s" }
        ))
        .dim()
    );

    for author in authors {
        println!("  {}", style(&author.name).white().bold());
        if !author.bio.is_empty() {
            println!("    {}", style(&author.bio).dim());
        }
        println!(
            "    {}",
            style(format!(
                "{} articles, {} books, {} social links",
                author.articles.len(),
                author.books.len(),
                author.social_links.len()
            ))
            .dim()
        );
    }
}

// ── Config ───────────────────────────────────────────────────────────────────

/// Print the resolved configuration. Keys are masked.
pub fn print_config(config: &ClientConfig) {
    println!("{}", style("Effective configuration").yellow().bold());
    print_row("WHOIS", &config.whois_url);
    print_row("Author API", &config.author_api_url);
    print_row("Payment API", &config.payment_api_url);
    print_row(
        "Payment key",
        if config.payment_key.is_some() {
            style("set").green()
        } else {
            style("unset").dim()
        },
    );
    print_row("Price", config.price_id.as_deref().unwrap_or("unset"));
    print_row("Success URL", &config.success_url);
    print_row("Cancel URL", &config.cancel_url);
    print_row(
        "Request timeout",
        config
            .request_timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string()),
    );
    print_row("Countdown", format!("{}s", config.countdown.as_secs()));
}
