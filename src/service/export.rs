use crate::model::attendance::{AttendanceWithUser, CaptureEvent};

const HEADER: [&str; 14] = [
    "Date",
    "Username",
    "Full Name",
    "Department",
    "Status",
    "Check In",
    "Check In Method",
    "Check In Verified",
    "Check Out",
    "Check Out Method",
    "Check Out Verified",
    "Hours Worked",
    "Early Checkout",
    "Notes",
];

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn event_columns(event: Option<&CaptureEvent>) -> [String; 3] {
    match event {
        Some(e) => [
            e.time.format("%H:%M:%S").to_string(),
            e.method.to_string(),
            if e.verified { "Yes" } else { "No" }.to_string(),
        ],
        None => [String::new(), String::new(), String::new()],
    }
}

/// Renders records as CSV, one line per record.
pub fn to_csv(rows: &[AttendanceWithUser]) -> String {
    let mut out = HEADER.join(",");
    out.push('\n');

    for row in rows {
        let a = &row.attendance;
        let [in_time, in_method, in_verified] = event_columns(a.check_in.as_ref());
        let [out_time, out_method, out_verified] = event_columns(a.check_out.as_ref());

        let fields = [
            a.date.format("%Y-%m-%d").to_string(),
            row.username.clone(),
            row.full_name.clone().unwrap_or_default(),
            row.department.clone().unwrap_or_default(),
            a.status.to_string(),
            in_time,
            in_method,
            in_verified,
            out_time,
            out_method,
            out_verified,
            format!("{:.2}", a.hours_worked),
            if a.early_checkout { "Yes" } else { "No" }.to_string(),
            a.notes.clone().unwrap_or_default(),
        ];

        let line = fields
            .iter()
            .map(|f| escape(f))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }

    out
}
