//! Tests for notification value types.

use crate::notification::domain::{
    Channel, ChannelOutcome, ContactSummary, DeliveryStatus, LedgerEntry, LedgerEntryId,
    LedgerReference, NotificationDomainError, OutboundMessage, normalize_phone,
};
use chrono::{Duration, TimeZone, Utc};
use rstest::rstest;

#[rstest]
#[case("20304050", "+4520304050")]
#[case("0020 30 40 50", "+4520304050")]
#[case("+45 20 30 40 50", "+4520304050")]
#[case("+4670123456", "+4670123456")]
fn phone_numbers_are_normalised(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(normalize_phone(raw), expected);
}

#[rstest]
fn blank_recipients_are_rejected() {
    assert_eq!(
        OutboundMessage::sms("  ", "hello"),
        Err(NotificationDomainError::EmptyRecipient(Channel::Sms))
    );
    assert_eq!(
        OutboundMessage::email("not-an-address", "subject", "<p>hi</p>"),
        Err(NotificationDomainError::InvalidEmail("not-an-address".to_owned()))
    );
}

#[rstest]
fn outcome_labels_describe_each_case() {
    let sent = ChannelOutcome::Sent {
        to: "+4520304050".to_owned(),
        provider_id: None,
    };
    let failed = ChannelOutcome::Failed {
        to: "kunde@example.com".to_owned(),
        error: "boom".to_owned(),
    };
    assert_eq!(sent.label(), "sent to +4520304050");
    assert_eq!(failed.label(), "failed: boom");
    assert_eq!(ChannelOutcome::skipped("no email").label(), "no email");
}

fn entry(channel: Channel, status: DeliveryStatus, minutes: i64) -> LedgerEntry {
    let base = Utc
        .with_ymd_and_hms(2026, 4, 1, 8, 0, 0)
        .single()
        .expect("valid timestamp");
    LedgerEntry {
        id: LedgerEntryId::new(),
        channel,
        to: "x".to_owned(),
        status,
        error: None,
        provider_id: None,
        summary: String::new(),
        reference: LedgerReference::default(),
        created_at: base + Duration::minutes(minutes),
        sent_at: None,
    }
}

#[rstest]
fn contact_summary_ignores_failed_attempts() {
    let entries = vec![
        entry(Channel::Sms, DeliveryStatus::Sent, 5),
        entry(Channel::Email, DeliveryStatus::Failed, 30),
        entry(Channel::Sms, DeliveryStatus::Sent, 10),
    ];
    let summary = ContactSummary::from_entries(&entries);

    assert!(summary.sms_sent);
    assert!(!summary.email_sent);
    assert_eq!(
        summary.last_contact_at,
        entries.get(2).map(|latest| latest.created_at)
    );
}
