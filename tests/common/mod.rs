//! Shared test doubles: a scripted DAW model, an in-memory endpoint over it,
//! and the same model served over loopback UDP.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use bitwig_osc_bridge::protocol::{decode, encode};
use bitwig_osc_bridge::{
    AddressPattern, BridgeConfig, Controller, Error, Message, NavigatorOptions, OscEndpoint,
    OscType, Result, address,
};

// ============================================================================
// Logging
// ============================================================================

/// Installs a test subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Navigator options with short timeouts and no settle delay.
pub fn fast_options() -> NavigatorOptions {
    NavigatorOptions::new()
        .with_open_timeout(Duration::from_millis(200))
        .with_step_timeout(Duration::from_millis(100))
        .with_settle(Duration::ZERO)
}

// ============================================================================
// DawModel
// ============================================================================

/// One filter column of the model.
#[derive(Debug, Clone)]
pub struct ModelColumn {
    pub name: String,
    pub items: Vec<String>,
    pub selected: Option<usize>,
}

impl ModelColumn {
    pub fn new(name: &str, items: &[&str], selected: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            items: items.iter().map(|item| (*item).to_string()).collect(),
            selected,
        }
    }
}

/// Scripted DAW state that, like the real controller script, reports only
/// values that changed since they were last reported.
#[derive(Debug, Clone)]
pub struct DawModel {
    pub tabs: Vec<String>,
    pub tab: usize,
    pub columns: Vec<ModelColumn>,
    pub results: Vec<String>,
    /// 1-based positions in the result list shown as empty slots.
    pub holes: Vec<usize>,
    pub page: usize,
    pub active: bool,
    /// Every page step shows a new window.
    pub infinite: bool,
    /// Open commands are ignored.
    pub ignore_open: bool,
    /// Plain values reported on `/refresh` (tracks, transport, devices).
    pub values: Vec<(String, OscType)>,
    reported: FxHashMap<String, OscType>,
}

impl Default for DawModel {
    fn default() -> Self {
        Self {
            tabs: vec!["Everything".to_string()],
            tab: 0,
            columns: Vec::new(),
            results: Vec::new(),
            holes: Vec::new(),
            page: 0,
            active: false,
            infinite: false,
            ignore_open: false,
            values: Vec::new(),
            reported: FxHashMap::default(),
        }
    }
}

impl DawModel {
    pub fn with_tabs(mut self, tabs: &[&str]) -> Self {
        self.tabs = tabs.iter().map(|tab| (*tab).to_string()).collect();
        self
    }

    pub fn with_results(mut self, count: usize) -> Self {
        self.results = (1..=count).map(|n| format!("Result {n:02}")).collect();
        self
    }

    /// Shows empty slots at `positions` (1-based over the whole list); the
    /// results after each hole move down one slot.
    pub fn with_holes(mut self, positions: &[usize]) -> Self {
        self.holes = positions.to_vec();
        self
    }

    pub fn with_column(mut self, column: ModelColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_value(mut self, address: &str, value: impl Into<OscType>) -> Self {
        self.values.push((address.to_string(), value.into()));
        self
    }

    pub fn infinite(mut self) -> Self {
        self.infinite = true;
        self
    }

    pub fn ignoring_open(mut self) -> Self {
        self.ignore_open = true;
        self
    }

    /// Applies one command and returns the messages the DAW would send.
    pub fn apply(&mut self, message: &Message) -> Vec<Message> {
        let address = message.address();
        let mut force = false;

        match address {
            address::BROWSER_OPEN_DEVICE
            | address::BROWSER_OPEN_DEVICE_BEFORE
            | address::BROWSER_OPEN_PRESET => {
                if !self.ignore_open {
                    self.active = true;
                    self.page = 0;
                }
            }
            address::BROWSER_TAB_NEXT if self.active => {
                self.tab = (self.tab + 1) % self.tabs.len();
                self.page = 0;
            }
            address::BROWSER_TAB_PREVIOUS if self.active => {
                self.tab = (self.tab + self.tabs.len() - 1) % self.tabs.len();
                self.page = 0;
            }
            address::BROWSER_RESULT_PAGE_NEXT if self.active => {
                if self.infinite || (self.page + 1) * address::BROWSER_WINDOW_SIZE < self.listed_len()
                {
                    self.page += 1;
                }
            }
            address::BROWSER_COMMIT | address::BROWSER_CANCEL => self.active = false,
            address::REFRESH => force = true,
            other => {
                if let Some((column, forward)) = parse_filter_step(other) {
                    self.step_filter(column, forward);
                }
            }
        }

        self.report(force)
    }

    fn step_filter(&mut self, column: usize, forward: bool) {
        let Some(model) = self.columns.get_mut(column - 1) else {
            return;
        };
        let current = model.selected.unwrap_or(0);
        let next = if forward {
            (current + 1).min(model.items.len().saturating_sub(1))
        } else {
            current.saturating_sub(1)
        };
        model.selected = Some(next);
        self.page = 0;
    }

    fn snapshot(&self) -> Vec<(String, OscType)> {
        let mut values = self.values.clone();
        values.push((address::BROWSER_ACTIVE.to_string(), OscType::Int(i32::from(self.active))));
        if !self.active {
            return values;
        }

        values.push((address::BROWSER_TAB.to_string(), OscType::from(self.tabs[self.tab].as_str())));

        for (index, column) in self.columns.iter().enumerate() {
            let c = index + 1;
            values.push((address::browser_filter(c, "exists"), OscType::Int(1)));
            values.push((address::browser_filter(c, "name"), OscType::from(column.name.as_str())));
            for slot in 1..=address::BROWSER_WINDOW_SIZE {
                let item = column.items.get(slot - 1);
                values.push((
                    address::browser_filter_item(c, slot, "name"),
                    OscType::from(item.map_or("", String::as_str)),
                ));
                values.push((
                    address::browser_filter_item(c, slot, "exists"),
                    OscType::Int(i32::from(item.is_some())),
                ));
                values.push((
                    address::browser_filter_item(c, slot, "isSelected"),
                    OscType::Int(i32::from(column.selected == Some(slot - 1))),
                ));
            }
        }

        let first = self.page * address::BROWSER_WINDOW_SIZE;
        for slot in 1..=address::BROWSER_WINDOW_SIZE {
            let name = if self.infinite {
                Some(format!("Endless {}", first + slot))
            } else {
                self.listed(first + slot)
            };
            values.push((
                address::browser_result(slot, "exists"),
                OscType::Int(i32::from(name.is_some())),
            ));
            values.push((
                address::browser_result(slot, "name"),
                OscType::from(name.unwrap_or_default()),
            ));
        }

        values
    }

    /// Length of the result list including holes.
    fn listed_len(&self) -> usize {
        self.results.len() + self.holes.len()
    }

    /// Entry at 1-based `position` of the result list; `None` for a hole or
    /// past the end.
    fn listed(&self, position: usize) -> Option<String> {
        if self.holes.contains(&position) {
            return None;
        }
        let before = self.holes.iter().filter(|&&hole| hole < position).count();
        self.results.get(position - 1 - before).cloned()
    }

    fn report(&mut self, force: bool) -> Vec<Message> {
        let mut out = Vec::new();
        for (address, value) in self.snapshot() {
            if force || self.reported.get(&address) != Some(&value) {
                self.reported.insert(address.clone(), value.clone());
                out.push(Message::with_value(address, value));
            }
        }
        out
    }
}

fn parse_filter_step(address: &str) -> Option<(usize, bool)> {
    let rest = address.strip_prefix("/browser/filter/")?;
    let (column, direction) = rest.split_once('/')?;
    let forward = match direction {
        "+" => true,
        "-" => false,
        _ => return None,
    };
    Some((column.parse().ok()?, forward))
}

// ============================================================================
// FakeDaw
// ============================================================================

#[derive(Debug, Default)]
struct FakeState {
    model: DawModel,
    cache: FxHashMap<String, Message>,
    sent: Vec<Message>,
}

/// In-memory [`OscEndpoint`] over a [`DawModel`].
///
/// Replies are immediate; a request whose expectation matches nothing the
/// model emitted fails at once with `ResponseTimeout`.
#[derive(Debug, Clone, Default)]
pub struct FakeDaw {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDaw {
    pub fn new(model: DawModel) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                model,
                ..FakeState::default()
            })),
        }
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<Message> {
        self.state.lock().sent.clone()
    }

    /// Number of sent messages with `address`.
    pub fn sent_count(&self, address: &str) -> usize {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|message| message.address() == address)
            .count()
    }

    /// Runs `f` against the model.
    pub fn with_model<R>(&self, f: impl FnOnce(&mut DawModel) -> R) -> R {
        f(&mut self.state.lock().model)
    }

    fn exchange(&self, message: Message) -> Vec<Message> {
        let mut state = self.state.lock();
        let emitted = state.model.apply(&message);
        for reply in &emitted {
            state.cache.insert(reply.address().to_string(), reply.clone());
        }
        state.sent.push(message);
        emitted
    }
}

#[async_trait]
impl OscEndpoint for FakeDaw {
    async fn fire_and_forget(&self, message: Message) -> Result<()> {
        self.exchange(message);
        Ok(())
    }

    async fn send_and_wait(
        &self,
        message: Message,
        expect: AddressPattern,
        timeout: Duration,
    ) -> Result<Message> {
        self.exchange(message)
            .into_iter()
            .find(|reply| expect.matches(reply.address()))
            .ok_or_else(|| Error::response_timeout(expect.to_string(), timeout.as_millis() as u64))
    }

    fn get_cached(&self, address: &str) -> Option<Message> {
        self.state.lock().cache.get(address).cloned()
    }
}

// ============================================================================
// UdpDaw
// ============================================================================

/// A [`DawModel`] served over loopback UDP.
pub struct UdpDaw {
    addr: SocketAddr,
    model: Arc<Mutex<DawModel>>,
    task: JoinHandle<()>,
}

impl UdpDaw {
    /// Binds a loopback socket and serves `model`, replying to `reply_to`
    /// once it is set by [`UdpDaw::controller`].
    pub async fn spawn(model: DawModel) -> (Self, Arc<Mutex<Option<SocketAddr>>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind daw");
        let addr = socket.local_addr().expect("daw addr");
        let model = Arc::new(Mutex::new(model));
        let reply_to = Arc::new(Mutex::new(None::<SocketAddr>));

        let task = {
            let model = Arc::clone(&model);
            let reply_to = Arc::clone(&reply_to);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 65_536];
                loop {
                    let Ok((len, _)) = socket.recv_from(&mut buf).await else {
                        continue;
                    };
                    let Ok(message) = decode(&buf[..len]) else {
                        continue;
                    };
                    let replies = model.lock().apply(&message);
                    let target = *reply_to.lock();
                    if let Some(target) = target {
                        for reply in replies {
                            let _ = socket.send_to(&encode(&reply), target).await;
                        }
                    }
                }
            })
        };

        (Self { addr, model, task }, reply_to)
    }

    /// Starts a model and a controller wired to it.
    pub async fn controller(model: DawModel) -> (Self, Controller) {
        let (daw, reply_to) = Self::spawn(model).await;
        let config = BridgeConfig::new()
            .with_send_port(daw.addr.port())
            .with_receive_port(0)
            .with_response_timeout(Duration::from_millis(500));
        let controller = Controller::connect(config).await.expect("connect");
        *reply_to.lock() = Some(controller.listen_addr());
        (daw, controller)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn with_model<R>(&self, f: impl FnOnce(&mut DawModel) -> R) -> R {
        f(&mut self.model.lock())
    }
}

impl Drop for UdpDaw {
    fn drop(&mut self) {
        self.task.abort();
    }
}
