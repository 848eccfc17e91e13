//! Record types produced by the scrapers.
//!
//! Each data domain has one flat, serde-serializable record type. Field
//! names are the column names of the CSV output and the keys of the JSON
//! output:
//! - [`Product`]: an e-commerce search result
//! - [`Headline`]: a news headline
//! - [`JobListing`]: a job portal listing
//! - [`Property`]: a real estate listing
//!
//! Records are built once per listing container and then pass through
//! [`Record::sanitize`] and a validator before they are written.

use crate::validators::sanitize_text;
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Behaviour shared by every record kind.
pub trait Record: Serialize {
    /// Clean every string field in place (control characters, NUL bytes,
    /// whitespace runs). Required fields that end up empty become `""`,
    /// optional ones become `None`.
    fn sanitize(&mut self);
}

/// Local time in RFC 3339 form, stamped on every record at creation.
pub fn now_timestamp() -> String {
    Local::now().to_rfc3339()
}

fn clean_required(field: &mut String) {
    *field = sanitize_text(field.as_str()).unwrap_or_default();
}

fn clean_optional(field: &mut Option<String>) {
    *field = field.as_deref().and_then(sanitize_text);
}

/// A product search result from an e-commerce platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Platform name, e.g. `"Amazon"`.
    pub platform: String,
    pub title: String,
    /// Price as produced by [`clean_price`](crate::utils::clean_price).
    pub price: Option<i64>,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    /// Absolute product URL.
    pub url: String,
    pub image_url: Option<String>,
    /// `"In Stock"` or `"Out of Stock"`.
    pub availability: String,
    pub timestamp: String,
}

impl Record for Product {
    fn sanitize(&mut self) {
        clean_required(&mut self.platform);
        clean_required(&mut self.title);
        clean_optional(&mut self.rating);
        clean_optional(&mut self.reviews);
        clean_required(&mut self.url);
        clean_optional(&mut self.image_url);
        clean_required(&mut self.availability);
        clean_required(&mut self.timestamp);
    }
}

/// A headline from a news source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    /// Human-readable source name, e.g. `"The Hindu"`.
    pub source: String,
    pub headline: String,
    pub link: String,
    pub timestamp: String,
}

impl Record for Headline {
    fn sanitize(&mut self) {
        clean_required(&mut self.source);
        clean_required(&mut self.headline);
        clean_required(&mut self.link);
        clean_required(&mut self.timestamp);
    }
}

/// A job portal listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub experience: String,
    pub salary: String,
    pub location: String,
    /// Listing URL; empty when the listing had no link.
    pub link: String,
    pub timestamp: String,
}

impl Record for JobListing {
    fn sanitize(&mut self) {
        clean_required(&mut self.title);
        clean_required(&mut self.company);
        clean_required(&mut self.experience);
        clean_required(&mut self.salary);
        clean_required(&mut self.location);
        clean_required(&mut self.link);
        clean_required(&mut self.timestamp);
    }
}

/// A real estate listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub title: String,
    /// Display price as shown on the site, e.g. `"₹1.2 Cr"`.
    pub price: String,
    pub location: String,
    pub link: String,
    pub timestamp: String,
}

impl Record for Property {
    fn sanitize(&mut self) {
        clean_required(&mut self.title);
        clean_required(&mut self.price);
        clean_required(&mut self.location);
        clean_required(&mut self.link);
        clean_required(&mut self.timestamp);
    }
}
