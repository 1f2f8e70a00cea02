//! Submission payloads and required-field validation
//!
//! Every flow submits a flat mapping of named string fields. Field names on
//! the wire are camelCase, matching the form input names on the site.
//!
//! Validation is presence-only: a field counts as filled when it is
//! non-empty after trimming. Format checks (email syntax, URL shape) are left
//! to the browser's input types and are not repeated here.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named submission flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Contact section form
    Contact,
    /// Newsletter subscription
    Newsletter,
    /// Lead capture popup
    LeadCapture,
    /// Free-website offer wizard
    Offer,
    /// Consent-gated page view ping
    Visitor,
}

impl Flow {
    pub const ALL: [Flow; 5] = [
        Flow::Contact,
        Flow::Newsletter,
        Flow::LeadCapture,
        Flow::Offer,
        Flow::Visitor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Contact => "contact",
            Flow::Newsletter => "newsletter",
            Flow::LeadCapture => "lead_capture",
            Flow::Offer => "offer",
            Flow::Visitor => "visitor",
        }
    }

    /// Number of form steps the flow's UI collects input over
    pub fn step_count(&self) -> u8 {
        match self {
            Flow::Offer => 3,
            _ => 1,
        }
    }

    /// Fields the form marks mandatory for `step` (empty for unknown steps)
    pub fn required_fields(&self, step: u8) -> &'static [&'static str] {
        match (self, step) {
            (Flow::Contact, 1) => &["name", "email", "subject", "message"],
            (Flow::Newsletter, 1) => &["email", "source"],
            (Flow::LeadCapture, 1) => &["email", "page"],
            (Flow::Visitor, 1) => &["page"],
            (Flow::Offer, 1) => &["fullName", "email", "phone"],
            (Flow::Offer, 2) => &["address", "socialMediaProfile"],
            (Flow::Offer, 3) => &["shortDescription", "professionalSummary"],
            _ => &[],
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named-field access shared by all payload shapes
pub trait FormFields {
    fn flow(&self) -> Flow;

    /// Field value by wire name, `None` for names the payload does not have
    fn field(&self, name: &str) -> Option<&str>;

    /// All fields in form order
    fn fields(&self) -> Vec<(&'static str, &str)>;
}

/// Current time in the RFC 3339 form the site sends (`2024-01-01T00:00:00.000Z`)
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn referrer_or_direct(referrer: String) -> String {
    if referrer.trim().is_empty() {
        "Direct".to_string()
    } else {
        referrer
    }
}

/// Contact section form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl FormFields for ContactPayload {
    fn flow(&self) -> Flow {
        Flow::Contact
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(self.name.as_str()),
            "email" => Some(self.email.as_str()),
            "subject" => Some(self.subject.as_str()),
            "message" => Some(self.message.as_str()),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("subject", self.subject.as_str()),
            ("message", self.message.as_str()),
        ]
    }
}

/// Newsletter subscription
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterPayload {
    pub email: String,
    pub source: String,
    pub timestamp: String,
}

impl NewsletterPayload {
    pub fn now(email: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            source: source.into(),
            timestamp: timestamp_now(),
        }
    }
}

impl FormFields for NewsletterPayload {
    fn flow(&self) -> Flow {
        Flow::Newsletter
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "email" => Some(self.email.as_str()),
            "source" => Some(self.source.as_str()),
            "timestamp" => Some(self.timestamp.as_str()),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("email", self.email.as_str()),
            ("source", self.source.as_str()),
            ("timestamp", self.timestamp.as_str()),
        ]
    }
}

/// Lead capture popup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCapturePayload {
    pub email: String,
    pub page: String,
    pub referrer: String,
    pub timestamp: String,
}

impl LeadCapturePayload {
    pub fn now(email: impl Into<String>, page: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            page: page.into(),
            referrer: referrer_or_direct(referrer.into()),
            timestamp: timestamp_now(),
        }
    }
}

impl FormFields for LeadCapturePayload {
    fn flow(&self) -> Flow {
        Flow::LeadCapture
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "email" => Some(self.email.as_str()),
            "page" => Some(self.page.as_str()),
            "referrer" => Some(self.referrer.as_str()),
            "timestamp" => Some(self.timestamp.as_str()),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("email", self.email.as_str()),
            ("page", self.page.as_str()),
            ("referrer", self.referrer.as_str()),
            ("timestamp", self.timestamp.as_str()),
        ]
    }
}

/// Free-website offer request, collected over three wizard steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPayload {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub social_media_profile: String,
    pub short_description: String,
    pub professional_summary: String,
}

impl OfferPayload {
    /// Mutable slot by wire name (used by the wizard's input handling)
    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "fullName" => Some(&mut self.full_name),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "address" => Some(&mut self.address),
            "socialMediaProfile" => Some(&mut self.social_media_profile),
            "shortDescription" => Some(&mut self.short_description),
            "professionalSummary" => Some(&mut self.professional_summary),
            _ => None,
        }
    }
}

impl FormFields for OfferPayload {
    fn flow(&self) -> Flow {
        Flow::Offer
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "fullName" => Some(self.full_name.as_str()),
            "email" => Some(self.email.as_str()),
            "phone" => Some(self.phone.as_str()),
            "address" => Some(self.address.as_str()),
            "socialMediaProfile" => Some(self.social_media_profile.as_str()),
            "shortDescription" => Some(self.short_description.as_str()),
            "professionalSummary" => Some(self.professional_summary.as_str()),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("fullName", self.full_name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("address", self.address.as_str()),
            ("socialMediaProfile", self.social_media_profile.as_str()),
            ("shortDescription", self.short_description.as_str()),
            ("professionalSummary", self.professional_summary.as_str()),
        ]
    }
}

/// Page view ping, sent only with analytics consent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorPayload {
    pub timestamp: String,
    pub page: String,
    pub referrer: String,
    pub user_agent: String,
    pub screen_resolution: String,
    pub time_zone: String,
    pub language: String,
}

impl VisitorPayload {
    /// Build a ping for `page`; empty referrer becomes `"Direct"`
    pub fn now(page: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp_now(),
            page: page.into(),
            referrer: referrer_or_direct(referrer.into()),
            ..Default::default()
        }
    }
}

impl FormFields for VisitorPayload {
    fn flow(&self) -> Flow {
        Flow::Visitor
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "timestamp" => Some(self.timestamp.as_str()),
            "page" => Some(self.page.as_str()),
            "referrer" => Some(self.referrer.as_str()),
            "userAgent" => Some(self.user_agent.as_str()),
            "screenResolution" => Some(self.screen_resolution.as_str()),
            "timeZone" => Some(self.time_zone.as_str()),
            "language" => Some(self.language.as_str()),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("timestamp", self.timestamp.as_str()),
            ("page", self.page.as_str()),
            ("referrer", self.referrer.as_str()),
            ("userAgent", self.user_agent.as_str()),
            ("screenResolution", self.screen_resolution.as_str()),
            ("timeZone", self.time_zone.as_str()),
            ("language", self.language.as_str()),
        ]
    }
}

/// Payload for any flow, consumed once by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SubmissionPayload {
    Contact(ContactPayload),
    Newsletter(NewsletterPayload),
    LeadCapture(LeadCapturePayload),
    Offer(OfferPayload),
    Visitor(VisitorPayload),
}

impl SubmissionPayload {
    fn inner(&self) -> &dyn FormFields {
        match self {
            SubmissionPayload::Contact(p) => p as &dyn FormFields,
            SubmissionPayload::Newsletter(p) => p as &dyn FormFields,
            SubmissionPayload::LeadCapture(p) => p as &dyn FormFields,
            SubmissionPayload::Offer(p) => p as &dyn FormFields,
            SubmissionPayload::Visitor(p) => p as &dyn FormFields,
        }
    }

    /// Flat `(name, value)` mapping, used as email template parameters
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        self.fields()
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect()
    }
}

impl FormFields for SubmissionPayload {
    fn flow(&self) -> Flow {
        self.inner().flow()
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.inner().field(name)
    }

    fn fields(&self) -> Vec<(&'static str, &str)> {
        self.inner().fields()
    }
}

impl From<ContactPayload> for SubmissionPayload {
    fn from(p: ContactPayload) -> Self {
        SubmissionPayload::Contact(p)
    }
}

impl From<NewsletterPayload> for SubmissionPayload {
    fn from(p: NewsletterPayload) -> Self {
        SubmissionPayload::Newsletter(p)
    }
}

impl From<LeadCapturePayload> for SubmissionPayload {
    fn from(p: LeadCapturePayload) -> Self {
        SubmissionPayload::LeadCapture(p)
    }
}

impl From<OfferPayload> for SubmissionPayload {
    fn from(p: OfferPayload) -> Self {
        SubmissionPayload::Offer(p)
    }
}

impl From<VisitorPayload> for SubmissionPayload {
    fn from(p: VisitorPayload) -> Self {
        SubmissionPayload::Visitor(p)
    }
}

/// Fields the form requires for `step` that are empty or missing
pub fn missing_fields<P: FormFields + ?Sized>(payload: &P, step: u8) -> Vec<&'static str> {
    payload
        .flow()
        .required_fields(step)
        .iter()
        .copied()
        .filter(|name| {
            payload
                .field(name)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .collect()
}

/// True iff every field mandatory for `step` is non-empty
///
/// Unknown steps are never complete.
pub fn is_complete<P: FormFields + ?Sized>(payload: &P, step: u8) -> bool {
    let required = payload.flow().required_fields(step);
    !required.is_empty() && missing_fields(payload, step).is_empty()
}

/// True iff every step of the payload's flow is complete
pub fn is_fully_complete<P: FormFields + ?Sized>(payload: &P) -> bool {
    (1..=payload.flow().step_count()).all(|step| is_complete(payload, step))
}
