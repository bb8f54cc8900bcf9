//! Lifecycle assertions over a server's usage records.
//!
//! Every check reports all offending fields at once rather than stopping at
//! the first one.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{EventAssertionError, FieldMismatch};
use crate::types::{EventKind, LaunchEntry, ServerEvents};

/// Values a launch record must carry, taken from the server document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedLaunch {
    pub instance: String,
    pub flavor_id: String,
    /// Checked only when the compute API reports it.
    pub tenant_id: Option<String>,
    /// Checked only when the compute API reports it.
    pub launched_at: Option<DateTime<Utc>>,
}

/// Attributes every launch record must have set.
pub const LAUNCH_ATTRIBUTES: &[&str] = &[
    "id",
    "request_id",
    "instance",
    "instance_type_id",
    "instance_flavor_id",
    "launched_at",
    "tenant",
    "os_architecture",
    "os_distro",
    "os_version",
    "rax_options",
];

fn missing_launch_attributes(entry: &LaunchEntry) -> Vec<&'static str> {
    let present = [
        entry.id.is_some(),
        entry.request_id.as_deref().is_some_and(|v| !v.is_empty()),
        !entry.instance.is_empty(),
        entry.instance_type_id.as_deref().is_some_and(|v| !v.is_empty()),
        entry.instance_flavor_id.as_deref().is_some_and(|v| !v.is_empty()),
        entry.launched_at.is_some(),
        entry.tenant.as_deref().is_some_and(|v| !v.is_empty()),
        entry.os_architecture.is_some(),
        entry.os_distro.is_some(),
        entry.os_version.is_some(),
        entry.rax_options.is_some(),
    ];

    LAUNCH_ATTRIBUTES
        .iter()
        .zip(present)
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| *name)
        .collect()
}

fn single_launch(events: &ServerEvents) -> Result<&LaunchEntry, EventAssertionError> {
    match events.launches.as_slice() {
        [entry] => Ok(entry),
        other => Err(EventAssertionError::Count {
            kind: EventKind::Launch.label(),
            instance: events.instance.clone(),
            expected: 1,
            actual: other.len(),
        }),
    }
}

/// Exactly one launch record exists and all of its attributes are set.
pub fn validate_attributes_in_launch_response(
    events: &ServerEvents,
) -> Result<(), EventAssertionError> {
    let entry = single_launch(events)?;
    let missing = missing_launch_attributes(entry);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EventAssertionError::MissingAttributes {
            kind: EventKind::Launch.label(),
            instance: events.instance.clone(),
            missing,
        })
    }
}

/// The launch record's values agree with the server.
///
/// `launched_at` may differ from the server's by up to `tolerance`, since
/// the two are stamped by different services.
pub fn validate_launch_entry_field_values(
    events: &ServerEvents,
    expected: &ExpectedLaunch,
    tolerance: Duration,
) -> Result<(), EventAssertionError> {
    let entry = single_launch(events)?;
    let mut mismatches = Vec::new();

    let mut check = |field: &'static str, actual: Option<&str>, want: &str| {
        if actual != Some(want) {
            mismatches.push(FieldMismatch {
                field,
                expected: want.to_string(),
                actual: actual.unwrap_or("<none>").to_string(),
            });
        }
    };

    check("instance", Some(entry.instance.as_str()), &expected.instance);
    check(
        "instance_type_id",
        entry.instance_type_id.as_deref(),
        &expected.flavor_id,
    );
    check(
        "instance_flavor_id",
        entry.instance_flavor_id.as_deref(),
        &expected.flavor_id,
    );
    if let Some(tenant) = &expected.tenant_id {
        check("tenant", entry.tenant.as_deref(), tenant);
    }

    if let Some(want) = expected.launched_at {
        let within = entry.launched_at.is_some_and(|actual| {
            (actual - want)
                .abs()
                .to_std()
                .is_ok_and(|drift| drift <= tolerance)
        });
        if !within {
            mismatches.push(FieldMismatch {
                field: "launched_at",
                expected: format!("{} (±{}s)", want.to_rfc3339(), tolerance.as_secs()),
                actual: entry
                    .launched_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "<none>".to_string()),
            });
        }
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(EventAssertionError::Mismatch {
            kind: EventKind::Launch.label(),
            instance: events.instance.clone(),
            mismatches,
        })
    }
}

fn expect_none(
    kind: EventKind,
    instance: &str,
    count: usize,
) -> Result<(), EventAssertionError> {
    if count == 0 {
        Ok(())
    } else {
        Err(EventAssertionError::Count {
            kind: kind.label(),
            instance: instance.to_string(),
            expected: 0,
            actual: count,
        })
    }
}

/// No delete record exists.
pub fn validate_no_deletes_entry_returned(events: &ServerEvents) -> Result<(), EventAssertionError> {
    expect_none(EventKind::Delete, &events.instance, events.deletes.len())
}

/// No exists record exists.
pub fn validate_no_exists_entry_returned(events: &ServerEvents) -> Result<(), EventAssertionError> {
    expect_none(EventKind::Exists, &events.instance, events.exists.len())
}
