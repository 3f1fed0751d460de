// src/verify/speed.rs
//! Speed trap: a survey answered faster than a human can read it.

use crate::config::VerifyConfig;
use crate::verify::SubmissionContext;

/// Pure check, no I/O. The minimum plausible duration scales with the
/// question count; a missing duration passes, since absent instrumentation
/// is not evidence of fraud.
pub fn check(ctx: &SubmissionContext<'_>, cfg: &VerifyConfig) -> bool {
    match ctx.response_duration_ms {
        Some(duration_ms) => duration_ms >= u64::from(ctx.question_count) * cfg.ms_per_question,
        None => true,
    }
}
