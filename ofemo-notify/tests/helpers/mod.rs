//! Test Helper Utilities
//!
//! Shared utilities for testing ofemo-notify

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_channel;
pub mod stub_server;

pub use mock_channel::{call_log, CallLog, MockChannel};
pub use stub_server::{spawn_stub, unused_base_url, StubReply, StubServer};

use ofemo_notify::payload::{ContactPayload, OfferPayload};

/// Complete offer request used across tests
pub fn ada_offer() -> OfferPayload {
    OfferPayload {
        full_name: "Ada".to_string(),
        email: "a@x.io".to_string(),
        phone: "123".to_string(),
        address: "1 Road".to_string(),
        social_media_profile: "https://x.com/ada".to_string(),
        short_description: "Portfolio site".to_string(),
        professional_summary: "Mathematician".to_string(),
    }
}

pub fn sample_contact() -> ContactPayload {
    ContactPayload {
        name: "Ada".to_string(),
        email: "a@x.io".to_string(),
        subject: "Hello".to_string(),
        message: "Looking for a website".to_string(),
    }
}
