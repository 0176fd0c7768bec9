//! In-memory simulator for tests and demos
//!
//! [`InMemorySimulator`] implements [`SimConnector`] without any native
//! library. It keeps a call log, answers data requests from a table of
//! current values, and lets tests arm failures on individual calls.
//!
//! ```rust,ignore
//! use sim_api::memory::InMemorySimulator;
//!
//! let sim = InMemorySimulator::running();
//! sim.set_value(PropertyId::new(4), 3500.0);
//!
//! let mut conn = sim.open("test", HostWindow::NONE, 0x0402)?;
//! conn.declare_data_layout(PropertyId::new(4), "PLANE ALTITUDE", "feet", DataType::Float64)?;
//! conn.bind_decoder(PropertyId::new(4), DataType::Float64)?;
//! conn.request_data_on_sim_object_type(PropertyId::new(4), PropertyId::new(4), ObjectSelector::user())?;
//!
//! // Open handshake followed by the data response
//! assert_eq!(conn.drain_messages()?.len(), 2);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::connection::{SimConnection, SimConnector};
use crate::error::{ApiError, Result};
use crate::message::{InboundMessage, OpenInfo};
use crate::types::{DataType, HostWindow, ObjectSelector, PropertyId};

/// Exception code sent for requests against an undeclared definition.
pub const EXCEPTION_UNRECOGNIZED_ID: u32 = 3;

/// Native code reported for armed failures.
pub const INJECTED_FAILURE_CODE: u32 = 0x8000_4005;

/// A call made against the simulator, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
    Open {
        name: String,
        host_window: HostWindow,
        notification_code: u32,
    },
    DeclareDataLayout {
        definition: PropertyId,
        field_name: String,
        unit: String,
        data_type: DataType,
    },
    BindDecoder {
        definition: PropertyId,
        data_type: DataType,
    },
    Request {
        definition: PropertyId,
        request: PropertyId,
        selector: ObjectSelector,
    },
    Drain,
    Close,
}

/// Connection operations that can be armed to fail.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum SimOperation {
    DeclareDataLayout,
    BindDecoder,
    Request,
    Drain,
}

impl SimOperation {
    fn name(self) -> &'static str {
        match self {
            SimOperation::DeclareDataLayout => "AddToDataDefinition",
            SimOperation::BindDecoder => "RegisterDataDefineStruct",
            SimOperation::Request => "RequestDataOnSimObjectType",
            SimOperation::Drain => "ReceiveMessage",
        }
    }
}

#[derive(Debug, Default)]
struct SimulatorState {
    running: bool,
    /// Generation of the current session; bumped on every successful open
    session: u64,
    session_open: bool,
    values: HashMap<PropertyId, f64>,
    inbox: VecDeque<InboundMessage>,
    calls: Vec<SimCall>,
    /// Armed failures: operation -> successful calls still allowed
    armed: HashMap<SimOperation, usize>,
    next_send_id: u32,
}

impl SimulatorState {
    fn take_failure(&mut self, op: SimOperation) -> Result<()> {
        match self.armed.get_mut(&op) {
            Some(0) => {
                self.armed.remove(&op);
                Err(ApiError::call(op.name(), INJECTED_FAILURE_CODE))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn send_id(&mut self) -> u32 {
        self.next_send_id += 1;
        self.next_send_id
    }
}

/// Simulator double shared between a test and the connections it hands out.
///
/// Cloning is cheap and every clone observes the same simulator.
#[derive(Debug, Clone, Default)]
pub struct InMemorySimulator {
    state: Arc<Mutex<SimulatorState>>,
}

impl InMemorySimulator {
    /// A simulator that is not running; every `open` is refused.
    pub fn new() -> Self {
        Self::default()
    }

    /// A simulator that accepts connections.
    pub fn running() -> Self {
        let sim = Self::new();
        sim.set_running(true);
        sim
    }

    /// Start or stop accepting connections.
    pub fn set_running(&self, running: bool) {
        self.state.lock().running = running;
    }

    /// Set the current value reported for a definition.
    pub fn set_value(&self, definition: PropertyId, value: f64) {
        self.state.lock().values.insert(definition, value);
    }

    /// Queue an arbitrary inbound message on the current session.
    pub fn push_message(&self, message: InboundMessage) {
        self.state.lock().inbox.push_back(message);
    }

    /// Shut the simulator down.
    ///
    /// Queues a `Quit` for the open session. Once it is drained every further
    /// call on that connection fails with [`ApiError::Closed`]. New
    /// connections are refused until `set_running(true)`.
    pub fn quit(&self) {
        let mut state = self.state.lock();
        state.running = false;
        if state.session_open {
            state.inbox.push_back(InboundMessage::Quit);
        }
    }

    /// Make the call of kind `op` fail after `after` more successful calls.
    pub fn fail_after(&self, op: SimOperation, after: usize) {
        self.state.lock().armed.insert(op, after);
    }

    /// Make the next call of kind `op` fail.
    pub fn fail_next(&self, op: SimOperation) {
        self.fail_after(op, 0);
    }

    /// Whether a session is currently open.
    pub fn is_session_open(&self) -> bool {
        self.state.lock().session_open
    }

    /// Number of successful handshakes so far.
    pub fn session_count(&self) -> u64 {
        self.state.lock().session
    }

    /// Snapshot of every call made so far.
    pub fn calls(&self) -> Vec<SimCall> {
        self.state.lock().calls.clone()
    }

    /// Forget the call log.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Number of `open` attempts, including refused ones.
    pub fn open_attempts(&self) -> usize {
        self.count_calls(|call| matches!(call, SimCall::Open { .. }))
    }

    /// Request ids in the order they were issued.
    pub fn requested_ids(&self) -> Vec<PropertyId> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SimCall::Request { request, .. } => Some(*request),
                _ => None,
            })
            .collect()
    }

    /// Definitions declared so far, in order.
    pub fn declared_ids(&self) -> Vec<PropertyId> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SimCall::DeclareDataLayout { definition, .. } => Some(*definition),
                _ => None,
            })
            .collect()
    }

    fn count_calls(&self, predicate: impl Fn(&SimCall) -> bool) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| predicate(c))
            .count()
    }
}

impl SimConnector for InMemorySimulator {
    type Connection = InMemoryConnection;

    fn open(
        &self,
        name: &str,
        host_window: HostWindow,
        notification_code: u32,
    ) -> Result<InMemoryConnection> {
        let mut state = self.state.lock();
        state.calls.push(SimCall::Open {
            name: name.to_string(),
            host_window,
            notification_code,
        });

        if !state.running {
            return Err(ApiError::Refused("simulator is not running".to_string()));
        }

        state.session += 1;
        state.session_open = true;
        state.inbox.clear();
        state.inbox.push_back(InboundMessage::Open(OpenInfo {
            application_name: "InMemorySimulator".to_string(),
            application_version: (1, 0),
            api_version: (1, 0),
        }));

        Ok(InMemoryConnection {
            sim: self.clone(),
            session: state.session,
            definitions: HashMap::new(),
            closed: false,
        })
    }
}

#[derive(Debug, Default)]
struct Definition {
    fields: usize,
    decoder: Option<DataType>,
}

/// A connection handed out by [`InMemorySimulator`].
///
/// Definitions live on the connection, so a reconnect starts from nothing.
#[derive(Debug)]
pub struct InMemoryConnection {
    sim: InMemorySimulator,
    session: u64,
    definitions: HashMap<PropertyId, Definition>,
    closed: bool,
}

impl InMemoryConnection {
    fn ensure_open(&self, state: &SimulatorState) -> Result<()> {
        if self.closed || state.session != self.session || !state.session_open {
            return Err(ApiError::Closed);
        }
        Ok(())
    }
}

impl SimConnection for InMemoryConnection {
    fn declare_data_layout(
        &mut self,
        definition: PropertyId,
        field_name: &str,
        unit: &str,
        data_type: DataType,
    ) -> Result<()> {
        let mut state = self.sim.state.lock();
        state.calls.push(SimCall::DeclareDataLayout {
            definition,
            field_name: field_name.to_string(),
            unit: unit.to_string(),
            data_type,
        });
        self.ensure_open(&state)?;
        state.take_failure(SimOperation::DeclareDataLayout)?;

        self.definitions.entry(definition).or_default().fields += 1;
        Ok(())
    }

    fn bind_decoder(&mut self, definition: PropertyId, data_type: DataType) -> Result<()> {
        let mut state = self.sim.state.lock();
        state.calls.push(SimCall::BindDecoder {
            definition,
            data_type,
        });
        self.ensure_open(&state)?;
        state.take_failure(SimOperation::BindDecoder)?;

        self.definitions.entry(definition).or_default().decoder = Some(data_type);
        Ok(())
    }

    fn request_data_on_sim_object_type(
        &mut self,
        definition: PropertyId,
        request: PropertyId,
        selector: ObjectSelector,
    ) -> Result<()> {
        let mut state = self.sim.state.lock();
        state.calls.push(SimCall::Request {
            definition,
            request,
            selector,
        });
        self.ensure_open(&state)?;
        state.take_failure(SimOperation::Request)?;
        let send_id = state.send_id();

        let declared = self.definitions.get(&definition).filter(|d| d.fields > 0);
        let Some(declared) = declared else {
            state.inbox.push_back(InboundMessage::Exception {
                exception: EXCEPTION_UNRECOGNIZED_ID,
                send_id,
                index: 1,
            });
            return Ok(());
        };

        if let Some(value) = state.values.get(&definition).copied() {
            // Without a bound decoder the simulator only sends a raw word
            let encoding = declared.decoder.unwrap_or(DataType::Int32);
            state.inbox.push_back(InboundMessage::SimObjectDataByType {
                request_id: request,
                object_id: 1,
                define_id: definition,
                payload: encoding.encode(value),
            });
        }
        Ok(())
    }

    fn drain_messages(&mut self) -> Result<Vec<InboundMessage>> {
        let mut state = self.sim.state.lock();
        state.calls.push(SimCall::Drain);
        if self.closed || state.session != self.session {
            return Err(ApiError::Closed);
        }
        if !state.session_open && state.inbox.is_empty() {
            return Err(ApiError::Closed);
        }
        state.take_failure(SimOperation::Drain)?;

        let messages: Vec<InboundMessage> = state.inbox.drain(..).collect();
        if messages.iter().any(|m| matches!(m, InboundMessage::Quit)) {
            state.session_open = false;
        }
        Ok(messages)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut state = self.sim.state.lock();
        state.calls.push(SimCall::Close);
        if state.session == self.session {
            state.session_open = false;
            state.inbox.clear();
        }
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}
