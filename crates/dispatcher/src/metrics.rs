use metrics::counter;

use allocator_core::models::DispatchOutcome;

pub const OUTCOMES_TOTAL: &str = "allocator_dispatch_outcomes_total";
pub const CAPACITY_WAIT_POLLS_TOTAL: &str = "allocator_capacity_wait_polls_total";
pub const REQUESTS_DECODED_TOTAL: &str = "allocator_requests_decoded_total";
pub const DECODE_ERRORS_TOTAL: &str = "allocator_decode_errors_total";

pub fn record_outcome(outcome: &DispatchOutcome) {
    counter!(OUTCOMES_TOTAL, "outcome" => outcome.kind()).increment(1);
}

pub fn record_capacity_poll() {
    counter!(CAPACITY_WAIT_POLLS_TOTAL).increment(1);
}

pub fn record_decoded() {
    counter!(REQUESTS_DECODED_TOTAL).increment(1);
}

pub fn record_decode_error() {
    counter!(DECODE_ERRORS_TOTAL).increment(1);
}
