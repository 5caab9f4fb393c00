use serde::Serialize;

use crate::error::ShellError;

/// Script message handler the page calls to start a scan.
pub const SCAN_BARCODE_HANDLER: &str = "jpScanBarcode";
/// Script message handler mirroring page local storage writes.
pub const LOCAL_STORAGE_CHANGED_HANDLER: &str = "jpLocalStorageChanged";
/// DOM event dispatched on `window` to deliver scan results to the page.
pub const SCAN_RESULT_EVENT: &str = "jp-native-scan-result";

// Product copy shown by the page on failed scans, hr-HR.
pub const MSG_UNTRUSTED_ORIGIN: &str = "Nepouzdan izvor.";
pub const MSG_SCAN_IN_PROGRESS: &str = "Skeniranje je već aktivno.";
pub const MSG_PERMISSION_DENIED: &str = "Dozvola za kameru je odbijena.";
pub const MSG_CAMERA_UNAVAILABLE: &str = "Kamera nije dostupna.";
pub const MSG_UNRECOGNIZED_BARCODE: &str = "Barkod nije prepoznat.";
pub const MSG_SCAN_FAILED: &str = "Skeniranje nije uspjelo.";

/// Terminal outcome category carried on the result event.
#[derive(uniffi::Enum, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Cancelled,
    Error,
}

/// Payload of the scan result event, serialized into the event's `detail`.
#[derive(uniffi::Record, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanResultEvent {
    /// Correlation id supplied by the page in the scan request.
    pub request_id: String,
    pub status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScanResultEvent {
    pub fn success(request_id: String, bar_code: String) -> Self {
        Self {
            request_id,
            status: ScanStatus::Success,
            bar_code: Some(bar_code),
            message: None,
        }
    }

    pub fn cancelled(request_id: String) -> Self {
        Self {
            request_id,
            status: ScanStatus::Cancelled,
            bar_code: None,
            message: None,
        }
    }

    pub fn error(request_id: String, message: String) -> Self {
        Self {
            request_id,
            status: ScanStatus::Error,
            bar_code: None,
            message: Some(message),
        }
    }

    /// Script delivering this event to the page. The payload is embedded as
    /// an object literal, the same shape page code would construct itself.
    pub fn dispatch_script(&self) -> Result<String, ShellError> {
        let detail = serde_json::to_string(self)?;
        Ok(format!(
            "window.dispatchEvent(new CustomEvent('{SCAN_RESULT_EVENT}', {{ detail: {detail} }}));"
        ))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn success_payload_shape() {
        let event = ScanResultEvent::success("req-7".into(), "4006381333931".into());
        let json = serde_json::to_string(&event).expect("serialize");
        assert_eq!(
            json,
            r#"{"requestId":"req-7","status":"success","barCode":"4006381333931"}"#
        );
    }

    #[test]
    fn error_payload_shape() {
        let event = ScanResultEvent::error("req-1".into(), MSG_UNTRUSTED_ORIGIN.into());
        let json = serde_json::to_string(&event).expect("serialize");
        assert_eq!(
            json,
            r#"{"requestId":"req-1","status":"error","message":"Nepouzdan izvor."}"#
        );
    }

    #[test]
    fn cancelled_payload_omits_optionals() {
        let event = ScanResultEvent::cancelled("req-2".into());
        let json = serde_json::to_string(&event).expect("serialize");
        assert_eq!(json, r#"{"requestId":"req-2","status":"cancelled"}"#);
    }

    #[test]
    fn dispatch_script_wraps_payload_in_custom_event() {
        let script = ScanResultEvent::cancelled("req-3".into())
            .dispatch_script()
            .expect("script");
        assert_eq!(
            script,
            "window.dispatchEvent(new CustomEvent('jp-native-scan-result', \
             { detail: {\"requestId\":\"req-3\",\"status\":\"cancelled\"} }));"
        );
    }
}
