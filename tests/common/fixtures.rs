//! Progress payloads and SSE bodies shaped like the real backend's output

use serde_json::{Value, json};

/// One SSE frame carrying `payload` as its data
pub fn sse_frame(payload: &Value) -> String {
    format!("data: {}\n\n", payload)
}

/// SSE body made of the given payloads, in order
pub fn sse_body(payloads: &[Value]) -> String {
    payloads.iter().map(sse_frame).collect()
}

/// Snapshot as the backend serialises it: every display field present, unset ones empty
pub fn snapshot(status: &str, percent: f64, message: &str) -> Value {
    json!({
        "status": status,
        "percent": percent,
        "speed": "",
        "eta": "",
        "size": "",
        "message": message,
    })
}

/// In-flight snapshot with transfer details filled in
pub fn transfer_snapshot(percent: f64, speed: &str, eta: &str, size: &str, message: &str) -> Value {
    json!({
        "status": "processing",
        "percent": percent,
        "speed": speed,
        "eta": eta,
        "size": size,
        "message": message,
    })
}

/// The sentinel sent for an unknown download id
pub fn not_found() -> Value {
    json!({ "status": "not_found" })
}

/// A realistic run: start, two progress lines, a repeated line, completion
pub fn completed_run() -> Vec<Value> {
    vec![
        snapshot("starting", 0.0, "Starting download..."),
        transfer_snapshot(
            12.5,
            "2.10MiB/s",
            "00:19",
            "48.30MiB",
            "[download]  12.5% of 48.30MiB at 2.10MiB/s ETA 00:19",
        ),
        transfer_snapshot(
            12.5,
            "2.10MiB/s",
            "00:19",
            "48.30MiB",
            "[download]  12.5% of 48.30MiB at 2.10MiB/s ETA 00:19",
        ),
        transfer_snapshot(
            100.0,
            "3.00MiB/s",
            "00:00",
            "48.30MiB",
            "[download] 100% of 48.30MiB",
        ),
        snapshot("completed", 100.0, "Download completed successfully!"),
    ]
}
