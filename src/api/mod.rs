//! Attendance server API module.
//!
//! Wraps the server's JSON endpoints behind the [`RecognitionClient`] and
//! [`AttendanceRecordsQuery`] traits so the capture workflow never depends on
//! HTTP details. Wire shapes match the server and must stay stable.

mod client;

pub use client::{
    image_payload, ApiClient, ApiError, AttendanceRecord, AttendanceRecordsQuery,
    RecognitionClient, RecognizeReply, DEFAULT_SERVER_URL, RECOGNITION_PATH, RECORDS_PATH,
    SERVER_URL_ENV,
};
