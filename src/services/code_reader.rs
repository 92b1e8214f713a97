use crate::services::scan_dispatcher::{
    BarcodeFormat, DispatchError, Navigation, ScanDispatcher, ScanEffect, ScanEvent,
};

/// Camera-backed decoder owned by the visible code-reader screen
pub trait Scanner {
    fn start_decoding(&mut self, formats: &[BarcodeFormat]);
    fn pause(&mut self);
    fn resume(&mut self);
    fn request_camera_permission(&mut self);
}

/// Acoustic / haptic confirmation of an accepted scan
pub trait ScanFeedback {
    fn beep_and_vibrate(&mut self);
}

pub trait Navigator {
    fn navigate(&mut self, navigation: Navigation);
    fn navigate_up(&mut self);
}

/// Code-reader screen controller
///
/// Feeds events into a [`ScanDispatcher`] and carries out the returned effects
/// with the injected collaborators. The scanner is paused when the controller
/// is dropped while it is still running.
pub struct CodeReader<S: Scanner, F: ScanFeedback, N: Navigator> {
    dispatcher: ScanDispatcher,
    scanner: S,
    feedback: F,
    navigator: N,
}

impl<S: Scanner, F: ScanFeedback, N: Navigator> CodeReader<S, F, N> {
    pub fn new(dispatcher: ScanDispatcher, scanner: S, feedback: F, navigator: N) -> Self {
        Self {
            dispatcher,
            scanner,
            feedback,
            navigator,
        }
    }

    pub fn dispatcher(&self) -> &ScanDispatcher {
        &self.dispatcher
    }

    pub fn scanner(&self) -> &S {
        &self.scanner
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn handle(&mut self, event: ScanEvent) -> Result<(), DispatchError> {
        let effects = self.dispatcher.handle(event)?;
        for effect in effects {
            self.apply(effect);
        }
        Ok(())
    }

    fn apply(&mut self, effect: ScanEffect) {
        match effect {
            ScanEffect::RequestCameraPermission => self.scanner.request_camera_permission(),
            ScanEffect::StartDecoding { formats } => self.scanner.start_decoding(&formats),
            ScanEffect::PauseScanner => self.scanner.pause(),
            ScanEffect::ResumeScanner => self.scanner.resume(),
            ScanEffect::BeepAndVibrate => self.feedback.beep_and_vibrate(),
            ScanEffect::Navigate { navigation } => self.navigator.navigate(navigation),
            ScanEffect::NavigateUp => self.navigator.navigate_up(),
        }
    }
}

impl<S: Scanner, F: ScanFeedback, N: Navigator> Drop for CodeReader<S, F, N> {
    fn drop(&mut self) {
        if self.dispatcher.is_scanner_running() {
            tracing::debug!("Code reader dropped with scanner running, pausing");
            self.scanner.pause();
        }
    }
}
