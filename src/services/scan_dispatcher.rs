use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::check_in::{ClaimGreenCertificateModel, ModelFetchResult, TicketingCheckIn};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No route from {from:?} for {kind:?}")]
    NoRoute { from: Screen, kind: PayloadKind },
}

/// Screens the scan flow navigates between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    CodeReader,
    ModelFetcher,
    ClaimCertificate,
    BookingSystemConsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    ScannedText,
    ClaimGreenCertificate,
    TicketingCheckIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    Aztec,
    QrCode,
}

/// Symbologies the decoder is restricted to
pub const SUPPORTED_FORMATS: [BarcodeFormat; 2] = [BarcodeFormat::Aztec, BarcodeFormat::QrCode];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Argument carried to the next screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NavigationPayload {
    ScannedText(String),
    ClaimGreenCertificate(ClaimGreenCertificateModel),
    TicketingCheckIn(TicketingCheckIn),
}

impl NavigationPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            NavigationPayload::ScannedText(_) => PayloadKind::ScannedText,
            NavigationPayload::ClaimGreenCertificate(_) => PayloadKind::ClaimGreenCertificate,
            NavigationPayload::TicketingCheckIn(_) => PayloadKind::TicketingCheckIn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub destination: Screen,
    pub payload: NavigationPayload,
}

/// Explicit replacement for navigation-graph actions:
/// `(current screen, payload kind) -> destination`
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: HashMap<(Screen, PayloadKind), Screen>,
}

impl RoutingTable {
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    pub fn with_route(mut self, from: Screen, kind: PayloadKind, to: Screen) -> Self {
        self.routes.insert((from, kind), to);
        self
    }

    pub fn route(&self, from: Screen, kind: PayloadKind) -> Option<Screen> {
        self.routes.get(&(from, kind)).copied()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::empty()
            .with_route(Screen::CodeReader, PayloadKind::ScannedText, Screen::ModelFetcher)
            .with_route(
                Screen::CodeReader,
                PayloadKind::ClaimGreenCertificate,
                Screen::ClaimCertificate,
            )
            .with_route(
                Screen::CodeReader,
                PayloadKind::TicketingCheckIn,
                Screen::BookingSystemConsent,
            )
    }
}

/// Inputs delivered to the dispatcher by the scanner, the fetch step and the
/// screen lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    ViewCreated { camera_permission: PermissionStatus },
    CameraPermissionGranted,
    Decoded { text: Option<String> },
    ModelFetched { result: ModelFetchResult },
    Resumed,
    Paused,
    DestinationChanged { destination: Screen },
}

/// Side effects the owner of the dispatcher must carry out, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEffect {
    RequestCameraPermission,
    StartDecoding { formats: Vec<BarcodeFormat> },
    PauseScanner,
    ResumeScanner,
    BeepAndVibrate,
    Navigate { navigation: Navigation },
    NavigateUp,
}

impl ScanEffect {
    /// Text to fetch a model for, when this effect opens the fetch step
    pub fn fetch_request(&self) -> Option<&str> {
        match self {
            ScanEffect::Navigate {
                navigation:
                    Navigation {
                        destination: Screen::ModelFetcher,
                        payload: NavigationPayload::ScannedText(text),
                    },
            } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DispatcherState {
    Idle,
    Processing { text: String },
}

/// State machine behind the code-reader screen
///
/// De-duplicates continuous decoder output against the last accepted text and
/// routes fetched models to the claim or consent screen.
#[derive(Debug, Clone)]
pub struct ScanDispatcher {
    routes: RoutingTable,
    screen: Screen,
    state: DispatcherState,
    last_text: Option<String>,
    camera_permission: PermissionStatus,
    decoding_started: bool,
    scanner_running: bool,
}

impl Default for ScanDispatcher {
    fn default() -> Self {
        Self::new(RoutingTable::default())
    }
}

impl ScanDispatcher {
    pub fn new(routes: RoutingTable) -> Self {
        Self {
            routes,
            screen: Screen::CodeReader,
            state: DispatcherState::Idle,
            last_text: None,
            camera_permission: PermissionStatus::Denied,
            decoding_started: false,
            scanner_running: false,
        }
    }

    pub fn state(&self) -> &DispatcherState {
        &self.state
    }

    pub fn last_text(&self) -> Option<&str> {
        self.last_text.as_deref()
    }

    pub fn is_scanner_running(&self) -> bool {
        self.scanner_running
    }

    pub fn camera_permission(&self) -> PermissionStatus {
        self.camera_permission
    }

    #[tracing::instrument(skip(self), fields(state = ?self.state))]
    pub fn handle(&mut self, event: ScanEvent) -> Result<Vec<ScanEffect>, DispatchError> {
        let effects = match event {
            ScanEvent::ViewCreated { camera_permission } => {
                self.camera_permission = camera_permission;
                match camera_permission {
                    PermissionStatus::Granted => self.start_decoding(),
                    PermissionStatus::Denied => {
                        tracing::info!("Camera permission missing, requesting it");
                        vec![ScanEffect::RequestCameraPermission]
                    }
                }
            }
            ScanEvent::CameraPermissionGranted => {
                self.camera_permission = PermissionStatus::Granted;
                if self.decoding_started {
                    Vec::new()
                } else {
                    self.start_decoding()
                }
            }
            ScanEvent::Decoded { text } => self.on_decoded(text)?,
            ScanEvent::ModelFetched { result } => self.on_model_fetched(result)?,
            ScanEvent::Resumed => self.on_active(),
            ScanEvent::DestinationChanged { destination } if destination == self.screen => {
                self.on_active()
            }
            ScanEvent::DestinationChanged { .. } => Vec::new(),
            ScanEvent::Paused => {
                self.scanner_running = false;
                vec![ScanEffect::PauseScanner]
            }
        };

        Ok(effects)
    }

    fn start_decoding(&mut self) -> Vec<ScanEffect> {
        self.decoding_started = true;
        self.scanner_running = true;
        vec![ScanEffect::StartDecoding {
            formats: SUPPORTED_FORMATS.to_vec(),
        }]
    }

    fn on_decoded(&mut self, text: Option<String>) -> Result<Vec<ScanEffect>, DispatchError> {
        if self.camera_permission != PermissionStatus::Granted {
            tracing::warn!("Decoded text received without camera permission, ignoring");
            return Ok(Vec::new());
        }

        // Halted scanners may still flush a frame; nothing is accepted until resume
        if !self.scanner_running {
            tracing::trace!("Scanner halted, ignoring decoded text");
            return Ok(Vec::new());
        }

        let text = match text {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(Vec::new()),
        };

        // Continuous decoding keeps reporting the code in front of the camera
        if self.last_text.as_deref() == Some(text.as_str()) {
            tracing::trace!("Duplicate scan suppressed");
            return Ok(Vec::new());
        }

        let navigation = self.navigation(NavigationPayload::ScannedText(text.clone()))?;

        tracing::info!(text_len = text.len(), "Accepted scanned code");

        self.scanner_running = false;
        self.last_text = Some(text.clone());
        self.state = DispatcherState::Processing { text };

        Ok(vec![
            ScanEffect::PauseScanner,
            ScanEffect::BeepAndVibrate,
            ScanEffect::Navigate { navigation },
        ])
    }

    fn on_model_fetched(
        &mut self,
        result: ModelFetchResult,
    ) -> Result<Vec<ScanEffect>, DispatchError> {
        let mut effects = vec![ScanEffect::NavigateUp];

        let payload = if let Some(claim) = result.claim_green_certificate {
            Some(NavigationPayload::ClaimGreenCertificate(claim))
        } else {
            result.booking_check_in.map(NavigationPayload::TicketingCheckIn)
        };

        match payload {
            Some(payload) => {
                let navigation = match self.navigation(payload) {
                    Ok(navigation) => navigation,
                    Err(e) => {
                        self.state = DispatcherState::Idle;
                        return Err(e);
                    }
                };
                tracing::info!(destination = ?navigation.destination, "Routing fetched model");
                self.scanner_running = false;
                effects.push(ScanEffect::PauseScanner);
                effects.push(ScanEffect::Navigate { navigation });
            }
            None => {
                tracing::debug!("Fetch result carried no model, staying on scanner");
                // The last accepted text is kept so the same code is not fetched again
                if self.can_resume() && !self.scanner_running {
                    self.scanner_running = true;
                    effects.push(ScanEffect::ResumeScanner);
                }
            }
        }

        self.state = DispatcherState::Idle;
        Ok(effects)
    }

    fn on_active(&mut self) -> Vec<ScanEffect> {
        self.last_text = None;
        self.state = DispatcherState::Idle;

        if self.can_resume() {
            self.scanner_running = true;
            vec![ScanEffect::ResumeScanner]
        } else {
            Vec::new()
        }
    }

    fn can_resume(&self) -> bool {
        self.camera_permission == PermissionStatus::Granted && self.decoding_started
    }

    fn navigation(&self, payload: NavigationPayload) -> Result<Navigation, DispatchError> {
        let kind = payload.kind();
        let destination = self
            .routes
            .route(self.screen, kind)
            .ok_or(DispatchError::NoRoute {
                from: self.screen,
                kind,
            })?;

        Ok(Navigation {
            destination,
            payload,
        })
    }
}
