//! Metric instrument factories for mnemo-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Instruments are created lazily from the `"mnemo-rs"` meter.

use opentelemetry::metrics::{Counter, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("mnemo-rs")
}

/// Counter: store operations executed.
/// Labels: `operation` ("create" | "fetch" | "search" | "update" |
/// "delete" | "relate" | "related").
pub fn store_operations() -> Counter<u64> {
    meter()
        .u64_counter("mnemo.store.operations")
        .with_description("Number of memory store operations")
        .build()
}

/// Counter: result rows dropped because they failed to normalize.
/// Labels: `operation`.
pub fn rows_skipped() -> Counter<u64> {
    meter()
        .u64_counter("mnemo.store.rows_skipped")
        .with_description("Result rows dropped during normalization")
        .build()
}

/// Counter: stored metadata that failed to parse and degraded to `{}`.
pub fn metadata_degraded() -> Counter<u64> {
    meter()
        .u64_counter("mnemo.store.metadata_degraded")
        .with_description("Stored metadata values that degraded to an empty map")
        .build()
}

/// Counter: relation creations that matched no endpoints and produced
/// zero edges.
pub fn relations_without_effect() -> Counter<u64> {
    meter()
        .u64_counter("mnemo.store.relations_without_effect")
        .with_description("Relation creations that produced no edges")
        .build()
}
