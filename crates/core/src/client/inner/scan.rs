use crate::{
    callbacks::CameraAuthorization,
    protocol::{
        ScanResultEvent, MSG_CAMERA_UNAVAILABLE, MSG_PERMISSION_DENIED, MSG_SCAN_FAILED,
        MSG_UNRECOGNIZED_BARCODE,
    },
};

/// Where a scan currently stands. There is no idle variant; an idle scanner
/// is the absence of a [`ScanFlow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Waiting for the user to answer the camera permission prompt.
    PermissionPending,
    /// The scanner modal is up (or going up) and may decode at any moment.
    Scanning,
    Succeeded,
    Cancelled,
    Failed,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Cancelled | Self::Failed)
    }
}

/// Host callback reports feeding the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    PermissionResolved { granted: bool },
    /// The scanner modal finished its presentation animation.
    Presented,
    Decoded { value: String },
    /// The user closed the scanner before anything was decoded.
    CloseRequested,
    SetupFailed { message: String },
}

/// What the host has to do next. Commands are executed in order, after the
/// client releases its state lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCommand {
    RequestPermission,
    Present,
    Dismiss,
    /// Deliver the terminal result event to the page.
    Finish(ScanResultEvent),
}

/// One barcode scan from request to terminal outcome.
///
/// The flow is a pure state machine: it never calls the host itself, it only
/// returns commands. Exactly one `Finish` is emitted per flow, and a flow
/// whose modal is still mid-presentation holds its outcome back until the
/// host reports `Presented`.
#[derive(Debug)]
pub struct ScanFlow {
    request_id: String,
    state: ScanState,
    present_issued: bool,
    presented: bool,
    deferred: Option<ScanResultEvent>,
}

impl ScanFlow {
    /// Starts a flow for `request_id` given the camera facts the host
    /// reported. Missing hardware and already-settled denials fail without
    /// ever prompting.
    pub fn start(
        request_id: String,
        camera_available: bool,
        authorization: CameraAuthorization,
    ) -> (Self, Vec<ScanCommand>) {
        let mut flow = Self {
            request_id,
            state: ScanState::PermissionPending,
            present_issued: false,
            presented: false,
            deferred: None,
        };

        if !camera_available {
            let commands = flow.finish(
                ScanState::Failed,
                ScanResultEvent::error(flow.request_id.clone(), MSG_CAMERA_UNAVAILABLE.into()),
            );
            return (flow, commands);
        }

        let commands = match authorization {
            CameraAuthorization::Authorized => flow.begin_scanning(),
            CameraAuthorization::Undetermined => vec![ScanCommand::RequestPermission],
            CameraAuthorization::Denied | CameraAuthorization::Restricted => flow.finish(
                ScanState::Failed,
                ScanResultEvent::error(flow.request_id.clone(), MSG_PERMISSION_DENIED.into()),
            ),
        };

        (flow, commands)
    }

    /// True while the flow still owes the page its terminal event. The
    /// single-flight slot stays occupied exactly as long as this holds.
    pub fn outcome_pending(&self) -> bool {
        !self.state.is_terminal() || self.deferred.is_some()
    }

    pub fn on_event(&mut self, event: ScanEvent) -> Vec<ScanCommand> {
        if let ScanEvent::Presented = event {
            self.presented = true;
            return match self.deferred.take() {
                Some(result) => vec![ScanCommand::Dismiss, ScanCommand::Finish(result)],
                None => Vec::new(),
            };
        }

        // A settled flow ignores everything else; stray callbacks from a
        // dismissed scanner must not produce a second terminal event.
        if self.state.is_terminal() {
            return Vec::new();
        }

        match (self.state, event) {
            (ScanState::PermissionPending, ScanEvent::PermissionResolved { granted: true }) => {
                self.begin_scanning()
            }
            (ScanState::PermissionPending, ScanEvent::PermissionResolved { granted: false }) => {
                self.finish(
                    ScanState::Failed,
                    ScanResultEvent::error(self.request_id.clone(), MSG_PERMISSION_DENIED.into()),
                )
            }
            (ScanState::Scanning, ScanEvent::Decoded { value }) => {
                if value.trim().is_empty() {
                    self.finish(
                        ScanState::Failed,
                        ScanResultEvent::error(
                            self.request_id.clone(),
                            MSG_UNRECOGNIZED_BARCODE.into(),
                        ),
                    )
                } else {
                    self.finish(
                        ScanState::Succeeded,
                        ScanResultEvent::success(self.request_id.clone(), value),
                    )
                }
            }
            (ScanState::Scanning, ScanEvent::CloseRequested) => self.finish(
                ScanState::Cancelled,
                ScanResultEvent::cancelled(self.request_id.clone()),
            ),
            (_, ScanEvent::SetupFailed { message }) => {
                let message = if message.trim().is_empty() {
                    MSG_SCAN_FAILED.to_owned()
                } else {
                    message
                };
                self.finish(
                    ScanState::Failed,
                    ScanResultEvent::error(self.request_id.clone(), message),
                )
            }
            _ => Vec::new(),
        }
    }

    fn begin_scanning(&mut self) -> Vec<ScanCommand> {
        self.state = ScanState::Scanning;
        self.present_issued = true;
        vec![ScanCommand::Present]
    }

    fn finish(&mut self, terminal: ScanState, result: ScanResultEvent) -> Vec<ScanCommand> {
        self.state = terminal;

        // Dismissing mid-presentation wedges the modal on some hosts; hold
        // the outcome until the host reports the presentation finished.
        if self.present_issued && !self.presented {
            self.deferred = Some(result);
            return Vec::new();
        }

        let mut commands = Vec::new();
        if self.present_issued {
            commands.push(ScanCommand::Dismiss);
        }
        commands.push(ScanCommand::Finish(result));
        commands
    }
}
