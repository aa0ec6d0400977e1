//! Check-in / check-out state machine for a single user-day.
//!
//! Every function here is pure: it takes the current record (if any), the
//! resolved [`WorkSchedule`] and the wall-clock `now`, and returns the record to
//! persist or the conflict that prevents it. The repository layer is in charge
//! of writing the result atomically.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::AttendanceError;
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, CaptureEvent, CaptureMethod, EventKind,
};
use crate::model::department::WorkSchedule;

/// Confidence assigned to manual and QR captures.
pub const FULL_CONFIDENCE: f64 = 100.0;

/// Auto-verification rule for captures, on the 0-100 confidence scale.
#[derive(Debug, Clone, Copy)]
pub struct VerificationPolicy {
    pub threshold: f64,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self { threshold: 80.0 }
    }
}

impl VerificationPolicy {
    pub fn auto_verifies(&self, confidence: f64) -> bool {
        confidence >= self.threshold
    }
}

/// What the client captured for a check-in or check-out.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub method: CaptureMethod,
    pub confidence: f64,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub qr_code: Option<String>,
}

impl Capture {
    pub fn manual(location: Option<String>) -> Self {
        Self {
            method: CaptureMethod::Manual,
            confidence: FULL_CONFIDENCE,
            location,
            image_url: None,
            qr_code: None,
        }
    }

    fn into_event(self, time: NaiveDateTime, policy: &VerificationPolicy) -> CaptureEvent {
        CaptureEvent {
            time,
            verified: policy.auto_verifies(self.confidence),
            image_url: self.image_url,
            qr_code: self.qr_code,
            confidence: self.confidence,
            method: self.method,
            location: self.location,
        }
    }
}

/// Rejects confidences outside `[0, 100]`.
pub fn validate_confidence(confidence: f64) -> Result<f64, AttendanceError> {
    if confidence.is_finite() && (0.0..=FULL_CONFIDENCE).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(AttendanceError::validation(
            "Confidence must be a percentage between 0 and 100",
        ))
    }
}

/// Elapsed hours between two timestamps, rounded to 2 decimals.
pub fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let millis = (end - start).num_milliseconds().max(0) as f64;
    round2(millis / 3_600_000.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Status a fresh check-in gets: late strictly after the start cutoff.
pub fn arrival_status(time: NaiveTime, schedule: &WorkSchedule) -> AttendanceStatus {
    if time > schedule.start {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// Leaving strictly before the end cutoff counts as an early checkout.
pub fn is_early_departure(time: NaiveTime, schedule: &WorkSchedule) -> bool {
    time < schedule.end
}

pub fn ensure_can_check_in(existing: Option<&AttendanceRecord>) -> Result<(), AttendanceError> {
    match existing {
        Some(record) if record.check_in.is_some() => {
            Err(AttendanceError::AlreadyCheckedIn(Box::new(record.clone())))
        }
        _ => Ok(()),
    }
}

pub fn ensure_can_check_out(existing: Option<&AttendanceRecord>) -> Result<(), AttendanceError> {
    match existing {
        None => Err(AttendanceError::NotCheckedIn(None)),
        Some(record) if record.check_in.is_none() => Err(AttendanceError::NotCheckedIn(Some(
            Box::new(record.clone()),
        ))),
        Some(record) if record.check_out.is_some() => {
            Err(AttendanceError::AlreadyCheckedOut(Box::new(record.clone())))
        }
        Some(_) => Ok(()),
    }
}

/// Applies a check-in to today's record, creating it when absent.
pub fn check_in(
    existing: Option<AttendanceRecord>,
    user_id: u64,
    now: NaiveDateTime,
    capture: Capture,
    schedule: &WorkSchedule,
    policy: &VerificationPolicy,
) -> Result<AttendanceRecord, AttendanceError> {
    ensure_can_check_in(existing.as_ref())?;

    let status = arrival_status(now.time(), schedule);
    let mut record =
        existing.unwrap_or_else(|| AttendanceRecord::new(user_id, now.date(), status));
    record.status = status;
    record.check_in = Some(capture.into_event(now, policy));

    Ok(record)
}

/// Applies a check-out to a record that has a check-in.
pub fn check_out(
    existing: Option<AttendanceRecord>,
    now: NaiveDateTime,
    capture: Capture,
    schedule: &WorkSchedule,
    policy: &VerificationPolicy,
) -> Result<AttendanceRecord, AttendanceError> {
    ensure_can_check_out(existing.as_ref())?;
    let Some(mut record) = existing else {
        return Err(AttendanceError::NotCheckedIn(None));
    };
    let Some(check_in_time) = record.check_in.as_ref().map(|e| e.time) else {
        return Err(AttendanceError::NotCheckedIn(Some(Box::new(record))));
    };

    if is_early_departure(now.time(), schedule) {
        record.early_checkout = true;
        record.status = record.status.with_early_checkout();
    }
    record.hours_worked = hours_between(check_in_time, now);
    record.check_out = Some(capture.into_event(now, policy));

    Ok(record)
}

/// Marks one half of the record as verified by `admin_id`.
pub fn verify(
    record: &mut AttendanceRecord,
    kind: EventKind,
    admin_id: u64,
) -> Result<(), AttendanceError> {
    match record.event_mut(kind) {
        Some(event) => event.verified = true,
        None => return Err(AttendanceError::EventMissing(kind, "verify")),
    }
    record.verified_by = Some(admin_id);
    Ok(())
}

/// Clears one half of the record.
///
/// A check-out cannot outlive its check-in, so rejecting the check-in clears
/// both and leaves the day `absent`.
pub fn reject(
    record: &mut AttendanceRecord,
    kind: EventKind,
    admin_id: u64,
) -> Result<(), AttendanceError> {
    if record.event(kind).is_none() {
        return Err(AttendanceError::EventMissing(kind, "reject"));
    }

    match kind {
        EventKind::CheckIn => {
            record.check_in = None;
            record.check_out = None;
        }
        EventKind::CheckOut => {
            record.check_out = None;
        }
    }

    record.hours_worked = 0.0;
    record.early_checkout = false;
    record.status = if record.check_in.is_none() && record.check_out.is_none() {
        AttendanceStatus::Absent
    } else {
        record.status.without_early_checkout()
    };
    record.verified_by = Some(admin_id);
    Ok(())
}

/// Field overwrite requested by an admin. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ManualUpdate {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
    pub check_in_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
    pub check_in_verified: Option<bool>,
    pub check_out_verified: Option<bool>,
}

fn manual_event(time: NaiveDateTime) -> CaptureEvent {
    CaptureEvent {
        time,
        image_url: None,
        qr_code: None,
        confidence: FULL_CONFIDENCE,
        method: CaptureMethod::Manual,
        location: None,
        verified: false,
    }
}

fn set_event_time(slot: &mut Option<CaptureEvent>, time: NaiveDateTime) {
    match slot {
        Some(event) => event.time = time,
        None => *slot = Some(manual_event(time)),
    }
}

/// Applies an admin overwrite. The record is left untouched on error.
pub fn apply_update(
    record: &mut AttendanceRecord,
    update: ManualUpdate,
    admin_id: u64,
) -> Result<(), AttendanceError> {
    let mut next = record.clone();

    if let Some(time) = update.check_in_time {
        set_event_time(&mut next.check_in, time);
    }
    if let Some(time) = update.check_out_time {
        if next.check_in.is_none() {
            return Err(AttendanceError::validation(
                "Cannot set a check-out time without a check-in time",
            ));
        }
        set_event_time(&mut next.check_out, time);
    }

    for (kind, flag) in [
        (EventKind::CheckIn, update.check_in_verified),
        (EventKind::CheckOut, update.check_out_verified),
    ] {
        let Some(flag) = flag else { continue };
        match next.event_mut(kind) {
            Some(event) => event.verified = flag,
            None => return Err(AttendanceError::EventMissing(kind, "update")),
        }
        next.verified_by = Some(admin_id);
    }

    if let Some(status) = update.status {
        next.status = status;
    }
    if let Some(notes) = update.notes {
        next.notes = Some(notes);
    }

    if let (Some(check_in), Some(check_out)) = (&next.check_in, &next.check_out) {
        if check_out.time <= check_in.time {
            return Err(AttendanceError::validation(
                "Check-out time must be after check-in time",
            ));
        }
        next.hours_worked = hours_between(check_in.time, check_out.time);
    }

    *record = next;
    Ok(())
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, AttendanceError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AttendanceError::validation(format!("Invalid time of day '{raw}'")))
}

/// Admin-created record for a day without self-reported attendance.
pub fn backfill(
    user_id: u64,
    date: NaiveDate,
    status: AttendanceStatus,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    admin_id: u64,
) -> Result<AttendanceRecord, AttendanceError> {
    let mut record = AttendanceRecord::new(user_id, date, status);
    record.verified_by = Some(admin_id);

    let verified = |time: NaiveTime| CaptureEvent {
        verified: true,
        ..manual_event(date.and_time(time))
    };

    match (check_in, check_out) {
        (None, Some(_)) => {
            return Err(AttendanceError::validation(
                "A check-out time requires a check-in time",
            ));
        }
        (Some(start), Some(end)) => {
            if end <= start {
                return Err(AttendanceError::validation(
                    "Check-out time must be after check-in time",
                ));
            }
            record.check_in = Some(verified(start));
            record.check_out = Some(verified(end));
            record.hours_worked = hours_between(date.and_time(start), date.and_time(end));
        }
        (Some(start), None) => record.check_in = Some(verified(start)),
        (None, None) => {}
    }

    Ok(record)
}

/// Per-item tally of a bulk verification.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<BulkItemError>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct BulkItemError {
    pub id: u64,
    pub message: String,
}

impl BulkOutcome {
    pub fn succeeded(&mut self) {
        self.success_count += 1;
    }

    pub fn failed(&mut self, id: u64, error: &AttendanceError) {
        self.error_count += 1;
        self.errors.push(BulkItemError {
            id,
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const USER: u64 = 42;
    const ADMIN: u64 = 1;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    #[fixture]
    fn schedule() -> WorkSchedule {
        WorkSchedule::office_hours()
    }

    #[fixture]
    fn policy() -> VerificationPolicy {
        VerificationPolicy::default()
    }

    fn face(confidence: f64) -> Capture {
        Capture {
            method: CaptureMethod::FaceRecognition,
            confidence,
            location: Some("Gate A".to_string()),
            image_url: Some("https://cdn.example/face.jpg".to_string()),
            qr_code: None,
        }
    }

    fn checked_in(at_time: NaiveDateTime) -> AttendanceRecord {
        check_in(
            None,
            USER,
            at_time,
            Capture::manual(None),
            &schedule(),
            &policy(),
        )
        .unwrap()
    }

    fn checked_out(in_time: NaiveDateTime, out_time: NaiveDateTime) -> AttendanceRecord {
        check_out(
            Some(checked_in(in_time)),
            out_time,
            Capture::manual(None),
            &schedule(),
            &policy(),
        )
        .unwrap()
    }

    #[rstest]
    #[case(at(8, 45), AttendanceStatus::Present)]
    #[case(at(9, 0), AttendanceStatus::Present)]
    #[case(day().and_hms_opt(9, 0, 1).unwrap(), AttendanceStatus::Late)]
    #[case(at(9, 15), AttendanceStatus::Late)]
    fn check_in_status_depends_on_start_cutoff(
        schedule: WorkSchedule,
        policy: VerificationPolicy,
        #[case] now: NaiveDateTime,
        #[case] expected: AttendanceStatus,
    ) {
        let record = check_in(None, USER, now, Capture::manual(None), &schedule, &policy).unwrap();

        assert_eq!(record.status, expected);
        assert_eq!(record.date, day());
        assert_eq!(record.check_in.unwrap().time, now);
    }

    #[rstest]
    fn department_cutoff_replaces_default(policy: VerificationPolicy) {
        let early_department = WorkSchedule {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        };

        let record = check_in(
            None,
            USER,
            at(8, 30),
            Capture::manual(None),
            &early_department,
            &policy,
        )
        .unwrap();
        assert_eq!(record.status, AttendanceStatus::Late);
    }

    #[rstest]
    fn second_check_in_conflicts_and_keeps_original(
        schedule: WorkSchedule,
        policy: VerificationPolicy,
    ) {
        let first = checked_in(at(8, 55));

        let err = check_in(
            Some(first.clone()),
            USER,
            at(10, 0),
            face(95.0),
            &schedule,
            &policy,
        )
        .unwrap_err();

        match err {
            AttendanceError::AlreadyCheckedIn(existing) => {
                assert_eq!(*existing, first);
                assert_eq!(existing.check_in.unwrap().time, at(8, 55));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    fn check_in_fills_an_admin_created_shell(schedule: WorkSchedule, policy: VerificationPolicy) {
        let mut shell = AttendanceRecord::new(USER, day(), AttendanceStatus::Absent);
        shell.id = 9;

        let record =
            check_in(Some(shell), USER, at(8, 50), face(90.0), &schedule, &policy).unwrap();

        assert_eq!(record.id, 9);
        assert_eq!(record.status, AttendanceStatus::Present);
    }

    #[rstest]
    #[case(79.99, false)]
    #[case(80.0, true)]
    #[case(100.0, true)]
    fn check_in_auto_verifies_at_threshold(
        schedule: WorkSchedule,
        policy: VerificationPolicy,
        #[case] confidence: f64,
        #[case] verified: bool,
    ) {
        let record =
            check_in(None, USER, at(8, 0), face(confidence), &schedule, &policy).unwrap();
        let event = record.check_in.unwrap();

        assert_eq!(event.verified, verified);
        assert_eq!(event.method, CaptureMethod::FaceRecognition);
        assert_eq!(event.image_url.as_deref(), Some("https://cdn.example/face.jpg"));
    }

    #[rstest]
    fn manual_capture_always_auto_verifies(policy: VerificationPolicy) {
        assert!(policy.auto_verifies(Capture::manual(None).confidence));
    }

    #[rstest]
    fn check_out_without_check_in_is_rejected(schedule: WorkSchedule, policy: VerificationPolicy) {
        let err = check_out(None, at(17, 0), Capture::manual(None), &schedule, &policy)
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NotCheckedIn(None)));

        let shell = AttendanceRecord::new(USER, day(), AttendanceStatus::Absent);
        let err = check_out(Some(shell), at(17, 0), Capture::manual(None), &schedule, &policy)
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NotCheckedIn(Some(_))));
    }

    #[rstest]
    fn check_out_is_accepted_exactly_once(schedule: WorkSchedule, policy: VerificationPolicy) {
        let done = checked_out(at(9, 0), at(17, 30));
        assert!(done.check_out.is_some());

        let err = check_out(
            Some(done),
            at(18, 0),
            Capture::manual(None),
            &schedule,
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyCheckedOut(_)));
    }

    #[test]
    fn late_arrival_and_early_departure_example() {
        let record = checked_out(at(9, 15), at(16, 30));

        assert!(record.early_checkout);
        assert_eq!(record.hours_worked, 7.25);
        assert_eq!(record.status, AttendanceStatus::LateEarlyCheckout);
    }

    #[rstest]
    #[case(at(16, 59), true)]
    #[case(at(17, 0), false)]
    #[case(at(18, 10), false)]
    fn early_checkout_is_strictly_before_end_cutoff(
        #[case] out: NaiveDateTime,
        #[case] early: bool,
    ) {
        let record = checked_out(at(8, 30), out);

        assert_eq!(record.early_checkout, early);
        let expected_status = if early {
            AttendanceStatus::EarlyCheckout
        } else {
            AttendanceStatus::Present
        };
        assert_eq!(record.status, expected_status);
    }

    #[rstest]
    #[case(at(9, 0), at(17, 0), 8.0)]
    #[case(at(9, 0), day().and_hms_opt(9, 20, 0).unwrap(), 0.33)]
    #[case(at(8, 1), at(17, 2), 9.02)]
    fn hours_are_rounded_to_two_decimals(
        #[case] start: NaiveDateTime,
        #[case] end: NaiveDateTime,
        #[case] expected: f64,
    ) {
        assert_eq!(hours_between(start, end), expected);
    }

    #[test]
    fn hours_never_go_negative() {
        assert_eq!(hours_between(at(10, 0), at(9, 0)), 0.0);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(100.5)]
    #[case(f64::NAN)]
    fn confidence_outside_percentage_range_is_invalid(#[case] confidence: f64) {
        assert!(matches!(
            validate_confidence(confidence),
            Err(AttendanceError::Validation(_))
        ));
    }

    #[test]
    fn confidence_bounds_are_inclusive() {
        assert_eq!(validate_confidence(0.0).unwrap(), 0.0);
        assert_eq!(validate_confidence(100.0).unwrap(), 100.0);
    }

    #[test]
    fn verify_sets_flag_and_admin() {
        let mut record = checked_in(at(9, 0));
        record.check_in.as_mut().unwrap().verified = false;

        verify(&mut record, EventKind::CheckIn, ADMIN).unwrap();

        assert!(record.check_in.unwrap().verified);
        assert_eq!(record.verified_by, Some(ADMIN));
    }

    #[test]
    fn verify_missing_half_leaves_record_untouched() {
        let mut record = checked_in(at(9, 0));
        let before = record.clone();

        let err = verify(&mut record, EventKind::CheckOut, ADMIN).unwrap_err();

        assert!(matches!(err, AttendanceError::EventMissing(EventKind::CheckOut, _)));
        assert_eq!(record, before);
    }

    #[test]
    fn rejecting_check_in_clears_both_halves() {
        let mut record = checked_out(at(9, 15), at(16, 30));

        reject(&mut record, EventKind::CheckIn, ADMIN).unwrap();

        assert!(record.check_in.is_none());
        assert!(record.check_out.is_none());
        assert_eq!(record.status, AttendanceStatus::Absent);
        assert_eq!(record.hours_worked, 0.0);
        assert!(!record.early_checkout);
        assert_eq!(record.verified_by, Some(ADMIN));
    }

    #[test]
    fn rejecting_check_out_restores_arrival_status() {
        let mut record = checked_out(at(9, 15), at(16, 30));

        reject(&mut record, EventKind::CheckOut, ADMIN).unwrap();

        assert!(record.check_in.is_some());
        assert!(record.check_out.is_none());
        assert_eq!(record.status, AttendanceStatus::Late);
        assert_eq!(record.hours_worked, 0.0);
    }

    #[test]
    fn rejecting_missing_half_is_not_found() {
        let mut record = checked_in(at(9, 0));
        let err = reject(&mut record, EventKind::CheckOut, ADMIN).unwrap_err();
        assert!(matches!(err, AttendanceError::EventMissing(..)));
    }

    #[test]
    fn update_recomputes_hours_when_both_times_exist() {
        let mut record = checked_out(at(9, 0), at(17, 0));

        apply_update(
            &mut record,
            ManualUpdate {
                check_out_time: Some(at(18, 30)),
                status: Some(AttendanceStatus::Present),
                notes: Some("stayed late for lab".to_string()),
                ..Default::default()
            },
            ADMIN,
        )
        .unwrap();

        assert_eq!(record.hours_worked, 9.5);
        assert_eq!(record.notes.as_deref(), Some("stayed late for lab"));
    }

    #[test]
    fn update_creates_missing_check_in_as_manual() {
        let mut record = AttendanceRecord::new(USER, day(), AttendanceStatus::Absent);

        apply_update(
            &mut record,
            ManualUpdate {
                check_in_time: Some(at(9, 0)),
                check_in_verified: Some(true),
                status: Some(AttendanceStatus::Present),
                ..Default::default()
            },
            ADMIN,
        )
        .unwrap();

        let event = record.check_in.unwrap();
        assert_eq!(event.method, CaptureMethod::Manual);
        assert!(event.verified);
        assert_eq!(record.verified_by, Some(ADMIN));
        assert_eq!(record.hours_worked, 0.0);
    }

    #[test]
    fn update_rejects_check_out_before_check_in() {
        let mut record = checked_out(at(9, 0), at(17, 0));
        let before = record.clone();

        let err = apply_update(
            &mut record,
            ManualUpdate {
                check_out_time: Some(at(8, 0)),
                ..Default::default()
            },
            ADMIN,
        )
        .unwrap_err();

        assert!(matches!(err, AttendanceError::Validation(_)));
        assert_eq!(record, before);
    }

    #[test]
    fn update_rejects_check_out_without_check_in() {
        let mut record = AttendanceRecord::new(USER, day(), AttendanceStatus::Absent);
        let err = apply_update(
            &mut record,
            ManualUpdate {
                check_out_time: Some(at(17, 0)),
                ..Default::default()
            },
            ADMIN,
        )
        .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }

    #[rstest]
    #[case("09:30", NaiveTime::from_hms_opt(9, 30, 0).unwrap())]
    #[case(" 17:05:30 ", NaiveTime::from_hms_opt(17, 5, 30).unwrap())]
    fn parses_time_of_day(#[case] raw: &str, #[case] expected: NaiveTime) {
        assert_eq!(parse_time_of_day(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("9.30")]
    #[case("25:00")]
    #[case("")]
    fn rejects_bad_time_of_day(#[case] raw: &str) {
        assert!(parse_time_of_day(raw).is_err());
    }

    #[test]
    fn backfill_combines_date_and_times() {
        let record = backfill(
            USER,
            day(),
            AttendanceStatus::Present,
            Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
            Some(NaiveTime::from_hms_opt(13, 0, 0).unwrap()),
            ADMIN,
        )
        .unwrap();

        assert_eq!(record.check_in.as_ref().unwrap().time, at(9, 0));
        assert_eq!(record.check_out.as_ref().unwrap().time, at(13, 0));
        assert!(record.check_in.unwrap().verified);
        assert_eq!(record.hours_worked, 4.0);
        assert_eq!(record.verified_by, Some(ADMIN));
    }

    #[test]
    fn backfill_without_times_is_a_bare_status() {
        let record = backfill(USER, day(), AttendanceStatus::Absent, None, None, ADMIN).unwrap();

        assert!(record.check_in.is_none());
        assert_eq!(record.status, AttendanceStatus::Absent);
    }

    #[test]
    fn backfill_check_out_alone_is_invalid() {
        let err = backfill(
            USER,
            day(),
            AttendanceStatus::Present,
            None,
            Some(NaiveTime::from_hms_opt(17, 0, 0).unwrap()),
            ADMIN,
        )
        .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }

    #[test]
    fn bulk_outcome_tallies_mixed_results() {
        let mut outcome = BulkOutcome::default();
        outcome.succeeded();
        outcome.succeeded();
        outcome.failed(7, &AttendanceError::NotFound);

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.error_count, 1);
        assert_eq!(outcome.errors[0].id, 7);
    }
}
