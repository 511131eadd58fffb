//! Shared test doubles for the coordinator unit tests.
//!
//! Single-threaded by design: unit tests drive one coordinator at a time,
//! so plain `Rc<RefCell<_>>` handles are enough to observe what a
//! coordinator did to its collaborators after ownership moved into it.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use core::time::Duration;

use crate::bus::EventSink;
use crate::errors::{LocationError, ModemError, TransportError};
use crate::events::{Event, FixMethod, LocationSample};
use crate::traits::{
    CloudTransport, LedDriver, LedEffect, LocationService, ModemControl, SampleTimer,
};

/// Event sink capturing every publish in order.
pub struct Recorder {
    events: RefCell<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
        }
    }

    /// Drain everything published so far.
    pub fn take(&self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl EventSink for Recorder {
    fn publish(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

/// Sampling timer that records every arm call.
pub struct RecordingTimer {
    arms: Rc<RefCell<Vec<Duration>>>,
}

impl RecordingTimer {
    pub fn new() -> Self {
        Self {
            arms: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn arms(&self) -> Vec<Duration> {
        self.arms.borrow().clone()
    }
}

impl SampleTimer for RecordingTimer {
    fn arm(&mut self, period: Duration) {
        self.arms.borrow_mut().push(period);
    }
}

/// Modem driver double counting attach attempts.
pub struct StubModem {
    result: Result<(), ModemError>,
    attempts: Rc<RefCell<u32>>,
}

impl StubModem {
    pub fn ok() -> Self {
        Self {
            result: Ok(()),
            attempts: Rc::new(RefCell::new(0)),
        }
    }

    pub fn failing(err: ModemError) -> Self {
        Self {
            result: Err(err),
            ..Self::ok()
        }
    }

    pub fn attempts(&self) -> Rc<RefCell<u32>> {
        Rc::clone(&self.attempts)
    }
}

impl ModemControl for StubModem {
    fn attach(&mut self) -> Result<(), ModemError> {
        *self.attempts.borrow_mut() += 1;
        self.result
    }
}

/// Positioning service double recording request deadlines.
pub struct StubLocation {
    start_result: Result<(), LocationError>,
    request_result: Result<(), LocationError>,
    deadlines: Rc<RefCell<Vec<Duration>>>,
}

impl StubLocation {
    pub fn ok() -> Self {
        Self {
            start_result: Ok(()),
            request_result: Ok(()),
            deadlines: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn failing_start(err: LocationError) -> Self {
        Self {
            start_result: Err(err),
            ..Self::ok()
        }
    }

    pub fn failing_request(err: LocationError) -> Self {
        Self {
            request_result: Err(err),
            ..Self::ok()
        }
    }

    /// Clear injected failures, e.g. to test a retry path.
    pub fn recover(&mut self) {
        self.start_result = Ok(());
        self.request_result = Ok(());
    }

    pub fn deadlines(&self) -> Vec<Duration> {
        self.deadlines.borrow().clone()
    }
}

impl LocationService for StubLocation {
    fn start(&mut self) -> Result<(), LocationError> {
        self.start_result
    }

    fn request(&mut self, deadline: Duration, _methods: &[FixMethod]) -> Result<(), LocationError> {
        self.request_result?;
        self.deadlines.borrow_mut().push(deadline);
        Ok(())
    }
}

/// Server transport double with scriptable config responses.
pub struct StubTransport {
    connect_result: Result<(), TransportError>,
    send_result: Result<(), TransportError>,
    config_response: Option<Vec<u8>>,
    sent: Rc<RefCell<Vec<Vec<u8>>>>,
    fetches: Rc<RefCell<u32>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            connect_result: Ok(()),
            send_result: Ok(()),
            config_response: None,
            sent: Rc::new(RefCell::new(Vec::new())),
            fetches: Rc::new(RefCell::new(0)),
        }
    }

    pub fn with_config(mut self, raw: &[u8]) -> Self {
        self.config_response = Some(raw.to_vec());
        self
    }

    pub fn failing_connect(mut self, err: TransportError) -> Self {
        self.connect_result = Err(err);
        self
    }

    pub fn failing_send(mut self, err: TransportError) -> Self {
        self.send_result = Err(err);
        self
    }

    pub fn sent(&self) -> Rc<RefCell<Vec<Vec<u8>>>> {
        Rc::clone(&self.sent)
    }

    pub fn fetches(&self) -> Rc<RefCell<u32>> {
        Rc::clone(&self.fetches)
    }
}

impl CloudTransport for StubTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.connect_result
    }

    fn send_telemetry(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.send_result?;
        self.sent.borrow_mut().push(payload.to_vec());
        Ok(())
    }

    fn fetch_config(&mut self) -> Result<Vec<u8>, TransportError> {
        *self.fetches.borrow_mut() += 1;
        self.config_response
            .clone()
            .ok_or(TransportError::ReceiveTimeout)
    }
}

/// LED driver double recording effect selections in order.
pub struct StubLed {
    shown: RefCell<Vec<LedEffect>>,
}

impl StubLed {
    pub fn new() -> Self {
        Self {
            shown: RefCell::new(Vec::new()),
        }
    }

    pub fn shown(&self) -> Vec<LedEffect> {
        self.shown.borrow().clone()
    }
}

impl LedDriver for StubLed {
    fn show(&mut self, effect: LedEffect) {
        self.shown.borrow_mut().push(effect);
    }
}

/// A plausible fix for payload and event tests.
pub fn sample() -> LocationSample {
    LocationSample {
        latitude: 63.430_493,
        longitude: 10.395_053,
        altitude: 12.5,
        accuracy: 6.2,
        speed: 1.1,
        heading: 90.0,
        method: FixMethod::Gnss,
        satellites_tracked: 6,
        search_time_ms: 21_330,
        timestamp: 1_204_000,
        datetime: None,
    }
}
