//! The onboarding wizard.
//!
//! [`OnboardingWizard`] sequences the four steps of the flow (domain,
//! contact, authors, subscription) and owns the values entered along the
//! way. Nothing is persisted; the session is dropped once checkout has been
//! created.
//!
//! The author step is edited through [`AuthorEditor`], built on two small
//! reducers: [`FormVisibility`] for the add/edit form and
//! [`reduce_authors`] for the list itself.

use crate::auth::{TokenProvider, TokenSession};
use crate::error::OnboardingError;
use crate::protocols::{AuthorClient, PaymentClient, WhoisClient};
use crate::types::{
    Author, CheckoutRequest, ClientConfig, ContactInformation, CustomerRequest, Domain,
    SubscriptionRequest,
};
use crate::utils::{is_valid_domain, is_valid_email, is_valid_phone, parse_domain, validate_domain};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Steps of the wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    Domain,
    Contact,
    Authors,
    Subscription,
    Complete,
}

impl WizardStep {
    /// The step after this one. `Complete` is terminal.
    pub fn next(self) -> Self {
        match self {
            WizardStep::Domain => WizardStep::Contact,
            WizardStep::Contact => WizardStep::Authors,
            WizardStep::Authors => WizardStep::Subscription,
            WizardStep::Subscription | WizardStep::Complete => WizardStep::Complete,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStep::Domain => write!(f, "domain"),
            WizardStep::Contact => write!(f, "contact"),
            WizardStep::Authors => write!(f, "authors"),
            WizardStep::Subscription => write!(f, "subscription"),
            WizardStep::Complete => write!(f, "complete"),
        }
    }
}

/// Whether the author form is open, and with what contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormVisibility {
    #[default]
    Hidden,
    ShowingForm(Author),
}

/// Transitions of [`FormVisibility`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// Open the form with the given contents (blank for a new author)
    Show(Author),
    /// Replace the contents of an open form; ignored while hidden
    Edit(Author),
    /// Close the form
    Hide,
}

impl FormVisibility {
    pub fn reduce(self, action: FormAction) -> Self {
        match (self, action) {
            (_, FormAction::Show(author)) => FormVisibility::ShowingForm(author),
            (FormVisibility::ShowingForm(_), FormAction::Edit(author)) => {
                FormVisibility::ShowingForm(author)
            }
            (FormVisibility::Hidden, FormAction::Edit(_)) => FormVisibility::Hidden,
            (_, FormAction::Hide) => FormVisibility::Hidden,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, FormVisibility::ShowingForm(_))
    }
}

/// Edits to the author list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorListAction {
    Add(Author),
    Replace(usize, Author),
    Remove(usize),
}

/// Apply one edit to the author list. Out-of-range indexes leave it unchanged.
pub fn reduce_authors(mut authors: Vec<Author>, action: AuthorListAction) -> Vec<Author> {
    match action {
        AuthorListAction::Add(author) => authors.push(author),
        AuthorListAction::Replace(index, author) => {
            if let Some(slot) = authors.get_mut(index) {
                *slot = author;
            }
        }
        AuthorListAction::Remove(index) => {
            if index < authors.len() {
                authors.remove(index);
            }
        }
    }
    authors
}

/// Author step editor: the list, the form, and which entry the form edits.
#[derive(Debug, Clone, Default)]
pub struct AuthorEditor {
    authors: Vec<Author>,
    form: FormVisibility,
    /// `None` while the form holds a new author
    editing: Option<usize>,
}

impl AuthorEditor {
    pub fn new(authors: Vec<Author>) -> Self {
        Self {
            authors,
            ..Self::default()
        }
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn form(&self) -> &FormVisibility {
        &self.form
    }

    /// Open a blank form for a new author.
    pub fn open_new(&mut self) {
        self.editing = None;
        self.dispatch_form(FormAction::Show(Author::default()));
    }

    /// Open the form on an existing author. Returns false for a bad index.
    pub fn open_existing(&mut self, index: usize) -> bool {
        match self.authors.get(index).cloned() {
            Some(author) => {
                self.editing = Some(index);
                self.dispatch_form(FormAction::Show(author));
                true
            }
            None => false,
        }
    }

    /// Replace the contents of the open form.
    pub fn edit(&mut self, author: Author) {
        self.dispatch_form(FormAction::Edit(author));
    }

    /// Store the form contents in the list and close the form.
    ///
    /// # Errors
    ///
    /// `InvalidAuthor` if the form is closed or the author has no name; the
    /// form stays open in the latter case.
    pub fn save(&mut self) -> Result<(), OnboardingError> {
        let author = match &self.form {
            FormVisibility::ShowingForm(author) => author.clone(),
            FormVisibility::Hidden => {
                return Err(OnboardingError::invalid_author("", "No author form is open"))
            }
        };

        validate_author(&author)?;

        let action = match self.editing.take() {
            Some(index) => AuthorListAction::Replace(index, author),
            None => AuthorListAction::Add(author),
        };
        self.authors = reduce_authors(std::mem::take(&mut self.authors), action);
        self.dispatch_form(FormAction::Hide);
        Ok(())
    }

    /// Close the form without saving.
    pub fn cancel(&mut self) {
        self.editing = None;
        self.dispatch_form(FormAction::Hide);
    }

    pub fn remove(&mut self, index: usize) {
        match self.editing {
            Some(editing) if editing == index => self.cancel(),
            // keep pointing at the same author once the list shifts
            Some(editing) if editing > index && index < self.authors.len() => {
                self.editing = Some(editing - 1)
            }
            _ => {}
        }
        self.authors = reduce_authors(
            std::mem::take(&mut self.authors),
            AuthorListAction::Remove(index),
        );
    }

    pub fn into_authors(self) -> Vec<Author> {
        self.authors
    }

    fn dispatch_form(&mut self, action: FormAction) {
        self.form = std::mem::take(&mut self.form).reduce(action);
    }
}

fn validate_author(author: &Author) -> Result<(), OnboardingError> {
    if author.name.trim().is_empty() {
        return Err(OnboardingError::invalid_author(
            &author.name,
            "Author name is required",
        ));
    }

    if let Some(link) = author.social_links.iter().find(|l| l.url.trim().is_empty()) {
        return Err(OnboardingError::invalid_author(
            &author.name,
            format!("Social link '{}' has no URL", link.platform),
        ));
    }

    Ok(())
}

/// Values collected during one wizard run.
#[derive(Debug, Clone, Default)]
pub struct WizardSession {
    pub step: WizardStep,
    pub domain: Domain,
    pub contact: ContactInformation,
    pub authors: Vec<Author>,
}

/// Outcome of the domain step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainSubmission {
    /// Syntax check failed; no lookup was made
    InvalidSyntax { reason: String },
    /// WHOIS could not confirm the domain is free
    Unavailable { domain: String },
    /// Domain stored; the wizard moved on to the contact step
    Accepted(Domain),
}

/// Result of a finished wizard run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub subscription_id: String,
    pub checkout_url: String,
    /// How long to show the countdown before redirecting to checkout
    pub redirect_after: Duration,
}

/// Drives the onboarding flow against the configured services.
pub struct OnboardingWizard {
    config: ClientConfig,
    whois: WhoisClient,
    authors: AuthorClient,
    payments: PaymentClient,
    tokens: TokenSession,
    session: WizardSession,
}

impl OnboardingWizard {
    /// Create a wizard from resolved settings, an initial bearer token and
    /// the provider used to renew it.
    pub fn new<S: Into<String>>(
        config: ClientConfig,
        token: S,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, OnboardingError> {
        let whois = WhoisClient::with_config(config.whois_url.clone(), config.request_timeout)?;
        let authors = AuthorClient::with_config(&config.author_api_url, config.request_timeout)?;
        let payments = PaymentClient::with_config(
            &config.payment_api_url,
            config.payment_key.clone(),
            config.request_timeout,
        )?;

        Ok(Self {
            config,
            whois,
            authors,
            payments,
            tokens: TokenSession::new(token, provider),
            session: WizardSession::default(),
        })
    }

    pub fn step(&self) -> WizardStep {
        self.session.step
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    /// Current bearer token, including any refresh that happened.
    pub fn token(&self) -> String {
        self.tokens.token()
    }

    fn ensure_step(&self, submitted: WizardStep) -> Result<(), OnboardingError> {
        if self.session.step == submitted {
            Ok(())
        } else {
            Err(OnboardingError::invalid_step(
                self.session.step.to_string(),
                submitted.to_string(),
            ))
        }
    }

    fn advance(&mut self) {
        let next = self.session.step.next();
        tracing::info!(from = %self.session.step, to = %next, "wizard step completed");
        self.session.step = next;
    }

    /// Domain step: syntax check, WHOIS availability, then decomposition.
    ///
    /// Rejections are reported in the returned [`DomainSubmission`] and leave
    /// the wizard on the domain step so the user can try again.
    pub async fn submit_domain(&mut self, input: &str) -> Result<DomainSubmission, OnboardingError> {
        self.ensure_step(WizardStep::Domain)?;

        let candidate = input.trim();
        if !is_valid_domain(candidate) {
            let reason = match validate_domain(candidate) {
                Err(OnboardingError::InvalidDomain { reason, .. }) => reason,
                _ => "Invalid domain".to_string(),
            };
            return Ok(DomainSubmission::InvalidSyntax { reason });
        }

        if !self.whois.is_available(candidate).await {
            return Ok(DomainSubmission::Unavailable {
                domain: candidate.to_string(),
            });
        }

        let domain = parse_domain(candidate);
        self.session.domain = domain.clone();
        self.advance();
        Ok(DomainSubmission::Accepted(domain))
    }

    /// Contact step: required fields, email and phone syntax.
    pub fn submit_contact(&mut self, contact: ContactInformation) -> Result<(), OnboardingError> {
        self.ensure_step(WizardStep::Contact)?;

        if let Some(field) = contact.missing_required_fields().first() {
            return Err(OnboardingError::invalid_contact(*field, "This field is required"));
        }
        if !is_valid_email(contact.email.trim()) {
            return Err(OnboardingError::invalid_contact(
                "email",
                format!("'{}' is not a valid email address", contact.email),
            ));
        }
        if !is_valid_phone(contact.telephone.trim()) {
            return Err(OnboardingError::invalid_contact(
                "telephone",
                format!("'{}' is not a valid phone number", contact.telephone),
            ));
        }

        self.session.contact = contact;
        self.advance();
        Ok(())
    }

    /// Authors already registered for the chosen domain.
    ///
    /// # Errors
    ///
    /// `InvalidStep` while no domain has been accepted, including after the
    /// flow completed and the session was cleared.
    pub async fn existing_authors(&self) -> Result<Vec<Author>, OnboardingError> {
        if self.session.domain.is_empty() {
            return Err(OnboardingError::invalid_step(
                self.session.step.to_string(),
                WizardStep::Authors.to_string(),
            ));
        }

        let client = &self.authors;
        let domain = &self.session.domain;
        self.tokens
            .run(|token| async move { client.fetch_authors(&token, domain).await })
            .await
    }

    /// Authors step: validate and register every author under the domain.
    ///
    /// Registration stops at the first failure. Authors registered before it
    /// are kept in the session (matched by name), so re-submitting the step
    /// only registers the rest.
    pub async fn submit_authors(&mut self, authors: Vec<Author>) -> Result<Vec<Author>, OnboardingError> {
        self.ensure_step(WizardStep::Authors)?;

        if authors.is_empty() {
            return Err(OnboardingError::invalid_author(
                "",
                "At least one author is required",
            ));
        }
        authors.iter().try_for_each(validate_author)?;

        let mut registered = Vec::with_capacity(authors.len());
        for author in &authors {
            if let Some(done) = self.session.authors.iter().find(|a| a.name == author.name) {
                tracing::debug!(author = %author.name, "already registered, skipping");
                registered.push(done.clone());
                continue;
            }

            let client = &self.authors;
            let domain = &self.session.domain;
            let stored = self
                .tokens
                .run(|token| async move { client.register_author(&token, domain, author).await })
                .await?;
            self.session.authors.push(stored.clone());
            registered.push(stored);
        }

        self.session.authors = registered.clone();
        self.advance();
        Ok(registered)
    }

    /// Subscription step: customer, subscription, then hosted checkout.
    ///
    /// On success the session values are discarded and the wizard is
    /// `Complete`.
    pub async fn submit_subscription(&mut self) -> Result<Completion, OnboardingError> {
        self.ensure_step(WizardStep::Subscription)?;

        let price_id = self
            .config
            .price_id
            .clone()
            .ok_or_else(|| OnboardingError::config("No subscription price configured"))?;

        let customer = self
            .payments
            .create_customer(&CustomerRequest::from(&self.session.contact))
            .await?;

        let subscription = self
            .payments
            .create_subscription(&SubscriptionRequest {
                customer_id: customer.id.clone(),
                price_id: price_id.clone(),
                domain: Some(self.session.domain.to_string()),
            })
            .await?;

        let checkout = self
            .payments
            .create_checkout_session(&CheckoutRequest {
                customer_id: customer.id,
                price_id,
                success_url: self.config.success_url.clone(),
                cancel_url: self.config.cancel_url.clone(),
            })
            .await?;

        self.session = WizardSession {
            step: WizardStep::Complete,
            ..WizardSession::default()
        };
        tracing::info!(subscription = %subscription.id, "onboarding complete");

        Ok(Completion {
            subscription_id: subscription.id,
            checkout_url: checkout.url,
            redirect_after: self.config.countdown,
        })
    }
}
