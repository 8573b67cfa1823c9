//! HTTP clients for the services the onboarding flow talks to.

/// WHOIS availability lookups
pub mod whois;

/// Domain-scoped author API
pub mod authors;

/// Payment processor customers, subscriptions and checkout
pub mod payments;

pub use authors::AuthorClient;
pub use payments::PaymentClient;
pub use whois::WhoisClient;
