//! In-memory fakes of the ports, shared by the unit tests of this crate.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use meshbridge_domain::command::DetailedCommand;
use meshbridge_domain::device::{Device, DeviceKind, DeviceSet};
use meshbridge_domain::error::BridgeError;
use meshbridge_domain::id::{DeviceId, SceneId, SiteId};
use meshbridge_domain::site::{CryptoKey, Site};

use crate::ports::{BusClient, CloudApi, MeshConnector, MeshEventSender, MeshParams, MeshTransport};

#[derive(Debug, Clone, PartialEq)]
pub enum MeshCall {
    Init,
    TriggerScene(DeviceId),
    TurnOn(DeviceId, DetailedCommand),
    TurnOff(DeviceId, DetailedCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BusCall {
    Start,
    /// Number of announced devices.
    Discover(usize),
    UpdateState(DeviceId, serde_json::Value),
    SceneTriggered(SceneId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CloudCall {
    Login,
    GetSites,
    GetSite(SiteId),
    GetDevices,
    /// The mesh connector built a transport for this many devices.
    Connect(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Mesh(MeshCall),
    Bus(BusCall),
    Cloud(CloudCall),
}

/// Ordered record of every call made on any fake sharing the log.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }
}

/// Devices used across tests: a dimmable light, a second light, a switch
/// and a scene.
pub fn site_devices() -> DeviceSet {
    let device = |id: u32, name: &str, kind: DeviceKind| {
        Device::builder()
            .id(DeviceId::new(id))
            .name(name)
            .kind(kind)
            .build()
            .unwrap()
    };
    DeviceSet::new([
        device(1, "Hallway", DeviceKind::Light),
        device(2, "Kitchen", DeviceKind::Light),
        device(4, "Porch switch", DeviceKind::Switch),
        device(5, "Evening", DeviceKind::Scene),
    ])
    .unwrap()
}

// ── Mesh ───────────────────────────────────────────────────────

pub struct SpyMesh {
    log: CallLog,
    init_times: Mutex<Vec<Instant>>,
    fail_init: AtomicBool,
    fail_commands: AtomicBool,
}

impl SpyMesh {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            init_times: Mutex::new(Vec::new()),
            fail_init: AtomicBool::new(false),
            fail_commands: AtomicBool::new(false),
        }
    }

    pub fn fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commands(&self) {
        self.fail_commands.store(true, Ordering::SeqCst);
    }

    pub fn init_count(&self) -> usize {
        self.init_times.lock().unwrap().len()
    }

    pub fn init_times(&self) -> Vec<Instant> {
        self.init_times.lock().unwrap().clone()
    }

    fn command_result(&self) -> Result<(), BridgeError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(BridgeError::Mesh("link down".into()));
        }
        Ok(())
    }
}

impl MeshTransport for SpyMesh {
    fn init(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.log.push(Call::Mesh(MeshCall::Init));
        self.init_times.lock().unwrap().push(Instant::now());
        let result = if self.fail_init.load(Ordering::SeqCst) {
            Err(BridgeError::Mesh("no adapter".into()))
        } else {
            Ok(())
        };
        async { result }
    }

    fn trigger_scene(&self, device_id: DeviceId) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.log.push(Call::Mesh(MeshCall::TriggerScene(device_id)));
        let result = self.command_result();
        async { result }
    }

    fn turn_on(
        &self,
        device_id: DeviceId,
        command: &DetailedCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.log
            .push(Call::Mesh(MeshCall::TurnOn(device_id, command.clone())));
        let result = self.command_result();
        async { result }
    }

    fn turn_off(
        &self,
        device_id: DeviceId,
        command: &DetailedCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.log
            .push(Call::Mesh(MeshCall::TurnOff(device_id, command.clone())));
        let result = self.command_result();
        async { result }
    }
}

/// Connector handing out a shared [`SpyMesh`] and keeping what it was given.
pub struct SpyConnector {
    log: CallLog,
    pub mesh: Arc<SpyMesh>,
    pub params: Mutex<Option<MeshParams>>,
    pub events: Mutex<Option<MeshEventSender>>,
}

impl SpyConnector {
    pub fn new(log: CallLog) -> Self {
        Self {
            mesh: Arc::new(SpyMesh::new(log.clone())),
            log,
            params: Mutex::new(None),
            events: Mutex::new(None),
        }
    }
}

impl MeshConnector for SpyConnector {
    type Transport = Arc<SpyMesh>;

    fn connect(
        &self,
        params: MeshParams,
        events: MeshEventSender,
    ) -> Result<Self::Transport, BridgeError> {
        self.log
            .push(Call::Cloud(CloudCall::Connect(params.devices.len())));
        *self.params.lock().unwrap() = Some(params);
        *self.events.lock().unwrap() = Some(events);
        Ok(Arc::clone(&self.mesh))
    }
}

// ── Bus ────────────────────────────────────────────────────────

pub struct SpyBus {
    log: CallLog,
    fail_start: AtomicBool,
}

impl SpyBus {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_start: AtomicBool::new(false),
        }
    }

    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }
}

impl BusClient for SpyBus {
    fn start(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.log.push(Call::Bus(BusCall::Start));
        let result = if self.fail_start.load(Ordering::SeqCst) {
            Err(BridgeError::Bus("broker unreachable".into()))
        } else {
            Ok(())
        };
        async { result }
    }

    fn discover(&self, devices: &DeviceSet) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.log.push(Call::Bus(BusCall::Discover(devices.len())));
        async { Ok(()) }
    }

    fn update_state(
        &self,
        device_id: DeviceId,
        state: serde_json::Value,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.log.push(Call::Bus(BusCall::UpdateState(device_id, state)));
        async { Ok(()) }
    }

    fn scene_triggered(&self, scene_id: SceneId) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.log.push(Call::Bus(BusCall::SceneTriggered(scene_id)));
        async { Ok(()) }
    }
}

// ── Cloud ──────────────────────────────────────────────────────

pub struct FakeCloud {
    log: CallLog,
    pub sites: Vec<Site>,
    pub key: CryptoKey,
    pub devices: Vec<Device>,
    /// Number of upcoming `login()` calls that fail.
    pub failing_logins: AtomicU32,
    pub fail_get_site: bool,
}

impl FakeCloud {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            sites: vec![
                Site {
                    id: SiteId::new(),
                    title: "Cabin".to_string(),
                },
                Site {
                    id: SiteId::new(),
                    title: "Home".to_string(),
                },
            ],
            key: CryptoKey::new("0123456789abcdef0123456789abcdef"),
            devices: site_devices().iter().cloned().collect(),
            failing_logins: AtomicU32::new(0),
            fail_get_site: false,
        }
    }

    pub fn home_id(&self) -> SiteId {
        self.sites[1].id
    }
}

impl CloudApi for FakeCloud {
    async fn login(&mut self) -> Result<(), BridgeError> {
        self.log.push(Call::Cloud(CloudCall::Login));
        let remaining = self.failing_logins.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_logins.store(remaining - 1, Ordering::SeqCst);
            return Err(BridgeError::Cloud("invalid session".into()));
        }
        Ok(())
    }

    async fn get_sites(&mut self) -> Result<Vec<Site>, BridgeError> {
        self.log.push(Call::Cloud(CloudCall::GetSites));
        Ok(self.sites.clone())
    }

    async fn get_site(&mut self, site_id: SiteId) -> Result<CryptoKey, BridgeError> {
        self.log.push(Call::Cloud(CloudCall::GetSite(site_id)));
        if self.fail_get_site {
            return Err(BridgeError::Cloud("site unavailable".into()));
        }
        Ok(self.key.clone())
    }

    fn get_devices(&self) -> Vec<Device> {
        self.log.push(Call::Cloud(CloudCall::GetDevices));
        self.devices.clone()
    }
}
