//! BLE remote-control adapter.
//!
//! Implements [`RadioPort`]: the hexagonal boundary between the remote link
//! and the Bluetooth Low Energy stack.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATT server via raw `esp_idf_svc::sys` calls.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT layout
//!
//! | Service / characteristic | UUID                         | Perms              |
//! |--------------------------|------------------------------|--------------------|
//! | Floower service          | `28e17913-…-86b5242f4c00`    |                    |
//! | ├ State                  | `…4c01`                      | Read+Write+Notify  |
//! | ├ Name                   | `…4c02`                      | Read+Write         |
//! | ├ Color scheme           | `…4c03`                      | Read+Write         |
//! | └ Personification        | `…4c04`                      | Read+Write         |
//! | Battery `0x180F`         |                              |                    |
//! | └ Level `0x2A19`         |                              | Read+Notify        |
//! | Device info `0x180A`     |                              |                    |
//! | ├ Model `0x2A24`         |                              | Read               |
//! | ├ Serial `0x2A25`        |                              | Read               |
//! | └ Firmware `0x2A26`      |                              | Read               |
//!
//! GATT callbacks never touch the domain: a write is decoded here and
//! handed to the main loop as [`Event::RemoteWrite`](crate::events::Event),
//! a malformed one is answered with an ATT error and dropped.  A valid write
//! that finds the event queue full is answered [`ATT_BUSY`].

use log::{info, warn};

use crate::app::ports::RadioPort;
use crate::config::DeviceName;
use crate::events::{Event, EventQueue};
use crate::remote::protocol::{
    self, CharacteristicId, MAX_SCHEME_BYTES, MODEL_NUMBER, FIRMWARE_REVISION, RemoteWrite,
    WriteError,
};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

/// Largest characteristic value served (full colour scheme).
pub const MAX_VALUE_LEN: usize = MAX_SCHEME_BYTES;

/// Local MTU offered to peers so a full colour scheme fits one write.
pub const LOCAL_MTU: u16 = 100;

pub type CharValue = heapless::Vec<u8, MAX_VALUE_LEN>;

// ATT error codes (Core Spec Vol 3 Part F 3.4.1.1)
pub const ATT_OK: u8 = 0x00;
pub const ATT_WRITE_NOT_PERMITTED: u8 = 0x03;
pub const ATT_INVALID_ATTR_LEN: u8 = 0x0D;
pub const ATT_VALUE_NOT_ALLOWED: u8 = 0x13;
pub const ATT_OUT_OF_RANGE: u8 = 0xFF;
/// Bluedroid `ESP_GATT_BUSY`: valid write, but the main loop has no room.
pub const ATT_BUSY: u8 = 0x84;

/// ATT status answered for a rejected write.
pub fn att_status(err: &WriteError) -> u8 {
    match err {
        WriteError::InvalidLength => ATT_INVALID_ATTR_LEN,
        WriteError::OutOfRange(_) => ATT_OUT_OF_RANGE,
        WriteError::InvalidUtf8 => ATT_VALUE_NOT_ALLOWED,
        WriteError::ReadOnly => ATT_WRITE_NOT_PERMITTED,
    }
}

/// Validate a peer write to `characteristic`.
pub fn accept_write(characteristic: CharacteristicId, raw: &[u8]) -> Result<RemoteWrite, WriteError> {
    if !characteristic.is_writable() {
        return Err(WriteError::ReadOnly);
    }
    protocol::decode(characteristic, raw)
}

/// Validate a peer write and hand it to the main loop.  Returns the ATT
/// status the peer is answered with: a write is either queued or refused.
pub fn deliver_write(characteristic: CharacteristicId, raw: &[u8], queue: &EventQueue) -> u8 {
    match accept_write(characteristic, raw) {
        Ok(write) => {
            if queue.push(Event::RemoteWrite(write)) {
                ATT_OK
            } else {
                warn!("BLE GATTS: {:?} write refused, event queue full", characteristic);
                ATT_BUSY
            }
        }
        Err(e) => {
            warn!("BLE GATTS: rejected {:?} write: {}", characteristic, e);
            att_status(&e)
        }
    }
}

fn char_index(id: CharacteristicId) -> usize {
    CharacteristicId::ALL
        .iter()
        .position(|c| *c == id)
        .unwrap_or_default()
}

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    /// Stack not started yet.
    Off,
    Idle,
    Advertising,
    Failed,
}

// ── ESP-IDF BLE static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures.  These statics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONNECTED: AtomicBool = AtomicBool::new(false);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_STEP: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CHAR_HANDLES: [AtomicU32; CharacteristicId::ALL.len()] =
    [const { AtomicU32::new(0) }; CharacteristicId::ALL.len()];

// Values served to reads.  GATTS callbacks run in the Bluedroid task
// (not ISR), so std Mutex is safe.
#[cfg(target_os = "espidf")]
static BLE_VALUES: std::sync::Mutex<[CharValue; CharacteristicId::ALL.len()]> =
    std::sync::Mutex::new([const { heapless::Vec::new() }; CharacteristicId::ALL.len()]);

#[cfg(target_os = "espidf")]
static ADV_SERVICE_UUID: [u8; 16] = protocol::SERVICE_UUID.to_le_bytes();

#[cfg(target_os = "espidf")]
static CCCD_INIT: [u8; 2] = [0, 0];

#[cfg(target_os = "espidf")]
#[derive(Clone, Copy)]
enum Uuid {
    Long(u128),
    Short(u16),
}

/// Services in registration order with their handle budget.
#[cfg(target_os = "espidf")]
const SERVICES: [(Uuid, u16); 3] = [
    (Uuid::Long(protocol::SERVICE_UUID), 12),
    (Uuid::Short(protocol::BATTERY_SERVICE_UUID), 6),
    (Uuid::Short(protocol::DEVICE_INFO_SERVICE_UUID), 8),
];

#[cfg(target_os = "espidf")]
fn service_of(id: CharacteristicId) -> u32 {
    match id {
        CharacteristicId::State
        | CharacteristicId::Name
        | CharacteristicId::ColorScheme
        | CharacteristicId::Personification => 0,
        CharacteristicId::Battery => 1,
        CharacteristicId::ModelNumber
        | CharacteristicId::SerialNumber
        | CharacteristicId::FirmwareRevision => 2,
    }
}

#[cfg(target_os = "espidf")]
fn char_uuid(id: CharacteristicId) -> Uuid {
    match id {
        CharacteristicId::State => Uuid::Long(protocol::CHAR_STATE),
        CharacteristicId::Name => Uuid::Long(protocol::CHAR_NAME),
        CharacteristicId::ColorScheme => Uuid::Long(protocol::CHAR_COLOR_SCHEME),
        CharacteristicId::Personification => Uuid::Long(protocol::CHAR_PERSONIFICATION),
        CharacteristicId::Battery => Uuid::Short(protocol::CHAR_BATTERY_LEVEL),
        CharacteristicId::ModelNumber => Uuid::Short(protocol::CHAR_MODEL_NUMBER),
        CharacteristicId::SerialNumber => Uuid::Short(protocol::CHAR_SERIAL_NUMBER),
        CharacteristicId::FirmwareRevision => Uuid::Short(protocol::CHAR_FIRMWARE_REVISION),
    }
}

#[cfg(target_os = "espidf")]
fn uuid_to_esp(uuid: Uuid) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    match uuid {
        Uuid::Long(u) => {
            t.len = 16;
            t.uuid.uuid128 = u.to_le_bytes();
        }
        Uuid::Short(u) => {
            t.len = 2;
            t.uuid.uuid16 = u;
        }
    }
    t
}

#[cfg(target_os = "espidf")]
fn store_value(id: CharacteristicId, value: &[u8]) {
    if let Ok(mut values) = BLE_VALUES.lock() {
        let slot = &mut values[char_index(id)];
        slot.clear();
        let _ = slot.extend_from_slice(&value[..value.len().min(MAX_VALUE_LEN)]);
    }
}

#[cfg(target_os = "espidf")]
fn characteristic_for_handle(handle: u16) -> Option<CharacteristicId> {
    BLE_CHAR_HANDLES
        .iter()
        .position(|h| h.load(AtomicOrdering::Relaxed) == u32::from(handle))
        .map(|i| CharacteristicId::ALL[i])
}

#[cfg(target_os = "espidf")]
unsafe fn create_service(gatts_if: esp_idf_svc::sys::esp_gatt_if_t, step: u32) {
    use esp_idf_svc::sys::*;
    let (uuid, handles) = SERVICES[step as usize];
    let mut svc_id = esp_gatt_srvc_id_t {
        id: esp_gatt_id_t {
            uuid: uuid_to_esp(uuid),
            inst_id: 0,
        },
        is_primary: true,
    };
    unsafe {
        esp_ble_gatts_create_service(gatts_if, &mut svc_id, handles);
    }
}

#[cfg(target_os = "espidf")]
unsafe fn add_gatt_char(svc_handle: u16, id: CharacteristicId) {
    use esp_idf_svc::sys::*;
    let mut uuid = uuid_to_esp(char_uuid(id));
    let mut perm = ESP_GATT_PERM_READ;
    let mut prop = ESP_GATT_CHAR_PROP_BIT_READ;
    if id.is_writable() {
        perm |= ESP_GATT_PERM_WRITE;
        prop |= ESP_GATT_CHAR_PROP_BIT_WRITE;
    }
    if id.is_notifiable() {
        prop |= ESP_GATT_CHAR_PROP_BIT_NOTIFY;
    }
    // No control block: reads and writes are answered by the app.
    unsafe {
        esp_ble_gatts_add_char(
            svc_handle,
            &mut uuid,
            perm as esp_gatt_perm_t,
            prop as esp_gatt_char_prop_t,
            core::ptr::null_mut(),
            core::ptr::null_mut(),
        );
    }
}

#[cfg(target_os = "espidf")]
unsafe fn add_cccd(svc_handle: u16) {
    use esp_idf_svc::sys::*;
    let mut uuid = uuid_to_esp(Uuid::Short(ESP_GATT_UUID_CHAR_CLIENT_CONFIG as u16));
    let mut value = esp_attr_value_t {
        attr_max_len: 2,
        attr_len: 2,
        attr_value: CCCD_INIT.as_ptr() as *mut u8,
    };
    // The stack keeps the subscription bits itself.
    let mut control = esp_attr_control_t {
        auto_rsp: ESP_GATT_AUTO_RSP as u8,
    };
    unsafe {
        esp_ble_gatts_add_char_descr(
            svc_handle,
            &mut uuid,
            (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
            &mut value,
            &mut control,
        );
    }
}

/// Continue the registration chain after a characteristic (and its CCCD)
/// is in place: next characteristic of the same service, or next service.
#[cfg(target_os = "espidf")]
unsafe fn register_next(gatts_if: esp_idf_svc::sys::esp_gatt_if_t) {
    let step = BLE_CHAR_STEP.fetch_add(1, AtomicOrdering::Relaxed) + 1;
    let Some(next) = CharacteristicId::ALL.get(step as usize).copied() else {
        log::info!("BLE GATTS: all characteristics registered");
        return;
    };
    let svc_step = BLE_SVC_STEP.load(AtomicOrdering::Relaxed);
    if service_of(next) == svc_step {
        let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
        unsafe { add_gatt_char(svc_handle, next) };
    } else {
        BLE_SVC_STEP.store(svc_step + 1, AtomicOrdering::Relaxed);
        unsafe { create_service(gatts_if, svc_step + 1) };
    }
}

#[cfg(target_os = "espidf")]
unsafe fn send_status(
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    conn_id: u16,
    trans_id: u32,
    status: u8,
) {
    use esp_idf_svc::sys::*;
    unsafe {
        esp_ble_gatts_send_response(
            gatts_if,
            conn_id,
            trans_id,
            status as esp_gatt_status_t,
            core::ptr::null_mut(),
        );
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use crate::events::{EVENTS, push_event};
    use esp_idf_svc::sys::*;

    BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            BLE_SVC_STEP.store(0, AtomicOrdering::Relaxed);
            BLE_CHAR_STEP.store(0, AtomicOrdering::Relaxed);
            unsafe { create_service(gatts_if, 0) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(u32::from(svc_handle), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            let step = BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) as usize;
            unsafe {
                esp_ble_gatts_start_service(svc_handle);
                add_gatt_char(svc_handle, CharacteristicId::ALL[step]);
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = unsafe { (*param).add_char.attr_handle };
            let step = BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) as usize;
            let id = CharacteristicId::ALL[step];
            BLE_CHAR_HANDLES[step].store(u32::from(handle), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: {:?} char (handle={})", id, handle);
            if id.is_notifiable() {
                let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
                unsafe { add_cccd(svc_handle) };
            } else {
                unsafe { register_next(gatts_if) };
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            unsafe { register_next(gatts_if) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let p = unsafe { &(*param).connect };
            BLE_CONN_ID.store(u32::from(p.conn_id), AtomicOrdering::Relaxed);
            BLE_CONNECTED.store(true, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client connected (conn_id={})", p.conn_id);
            push_event(Event::RemoteConnected);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            BLE_CONNECTED.store(false, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client disconnected");
            // The remote link decides whether advertising resumes.
            push_event(Event::RemoteDisconnected);
        }
        esp_gatts_cb_event_t_ESP_GATTS_READ_EVT => {
            let p = unsafe { &(*param).read };
            if !p.need_rsp {
                return;
            }
            let mut rsp: esp_gatt_rsp_t = unsafe { core::mem::zeroed() };
            let attr = unsafe { &mut rsp.attr_value };
            attr.handle = p.handle;
            attr.offset = p.offset;
            if let (Some(id), Ok(values)) = (characteristic_for_handle(p.handle), BLE_VALUES.lock()) {
                let value = &values[char_index(id)];
                let start = usize::from(p.offset).min(value.len());
                let chunk = &value[start..];
                attr.value[..chunk.len()].copy_from_slice(chunk);
                attr.len = chunk.len() as u16;
            }
            unsafe {
                esp_ble_gatts_send_response(
                    gatts_if,
                    p.conn_id,
                    p.trans_id,
                    esp_gatt_status_t_ESP_GATT_OK,
                    &mut rsp,
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            let data = unsafe { core::slice::from_raw_parts(p.value, usize::from(p.len)) };

            let status = match characteristic_for_handle(p.handle) {
                // CCCD and other stack-owned attributes
                None => ATT_OK,
                Some(_) if p.is_prep => ATT_WRITE_NOT_PERMITTED,
                Some(id) => deliver_write(id, data, &EVENTS),
            };
            if p.need_rsp {
                unsafe { send_status(gatts_if, p.conn_id, p.trans_id, status) };
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_EXEC_WRITE_EVT => {
            let p = unsafe { &(*param).exec_write };
            unsafe { send_status(gatts_if, p.conn_id, p.trans_id, ATT_OK) };
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdapter {
    state: BleState,
    device_name: DeviceName,
    #[cfg(not(target_os = "espidf"))]
    values: [CharValue; CharacteristicId::ALL.len()],
    /// Simulation: a peer is connected.
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    /// Simulation: notifications sent to the peer.
    #[cfg(not(target_os = "espidf"))]
    sim_notified: heapless::Vec<CharacteristicId, 32>,
}

impl BleAdapter {
    /// Prepare the adapter.  The Bluedroid stack is brought up on the
    /// first advertising request.
    pub fn new(device_name: DeviceName, serial_number: &str) -> Self {
        let mut adapter = Self {
            state: BleState::Off,
            device_name,
            #[cfg(not(target_os = "espidf"))]
            values: [const { heapless::Vec::new() }; CharacteristicId::ALL.len()],
            #[cfg(not(target_os = "espidf"))]
            sim_connected: false,
            #[cfg(not(target_os = "espidf"))]
            sim_notified: heapless::Vec::new(),
        };
        adapter.set_value(CharacteristicId::ModelNumber, MODEL_NUMBER.as_bytes());
        adapter.set_value(CharacteristicId::SerialNumber, serial_number.as_bytes());
        adapter.set_value(CharacteristicId::FirmwareRevision, FIRMWARE_REVISION.as_bytes());
        adapter
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    pub fn device_name(&self) -> &str {
        self.device_name.as_str()
    }

    pub fn is_advertising(&self) -> bool {
        self.state == BleState::Advertising
    }

    fn rename(&mut self, raw: &[u8]) {
        let Ok(name) = core::str::from_utf8(raw) else {
            return;
        };
        let mut new_name = DeviceName::new();
        if new_name.push_str(name).is_ok() {
            info!("BLE: device name -> '{}'", name);
            self.device_name = new_name;
            if self.state != BleState::Off {
                self.platform_set_name();
                if self.state == BleState::Advertising {
                    self.platform_advertise();
                }
            }
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn set_value(&mut self, id: CharacteristicId, value: &[u8]) {
        store_value(id, value);
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_value(&mut self, id: CharacteristicId, value: &[u8]) {
        let slot = &mut self.values[char_index(id)];
        slot.clear();
        let _ = slot.extend_from_slice(&value[..value.len().min(MAX_VALUE_LEN)]);
    }

    #[cfg(target_os = "espidf")]
    fn platform_init(&mut self) -> bool {
        use esp_idf_svc::sys::*;
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK {
                log::error!("BLE: bt_controller_init failed ({})", ret);
                return false;
            }
            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK {
                log::error!("BLE: bt_controller_enable failed ({})", ret);
                return false;
            }
            let ret = esp_bluedroid_init();
            if ret != ESP_OK {
                log::error!("BLE: bluedroid_init failed ({})", ret);
                return false;
            }
            let ret = esp_bluedroid_enable();
            if ret != ESP_OK {
                log::error!("BLE: bluedroid_enable failed ({})", ret);
                return false;
            }

            esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
            esp_ble_gatts_app_register(0);
            esp_ble_gatt_set_local_mtu(LOCAL_MTU);
        }
        self.platform_set_name();
        info!("BLE(espidf): Bluedroid stack initialized");
        true
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_init(&mut self) -> bool {
        info!("BLE(sim): stack initialized");
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_set_name(&mut self) {
        // Bluedroid wants a NUL-terminated C string.
        let mut c_name = heapless::Vec::<u8, { crate::config::MAX_NAME_LEN + 1 }>::new();
        let _ = c_name.extend_from_slice(self.device_name.as_bytes());
        let _ = c_name.push(0);
        unsafe {
            esp_idf_svc::sys::esp_ble_gap_set_device_name(c_name.as_ptr() as *const _);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_set_name(&mut self) {}

    #[cfg(target_os = "espidf")]
    fn platform_advertise(&mut self) {
        use esp_idf_svc::sys::*;
        unsafe {
            // Service UUID in the advertisement, name in the scan response:
            // both together overflow the 31-byte payload.
            let mut adv_data: esp_ble_adv_data_t = core::mem::zeroed();
            adv_data.set_scan_rsp = false;
            adv_data.include_name = false;
            adv_data.service_uuid_len = ADV_SERVICE_UUID.len() as u16;
            adv_data.p_service_uuid = ADV_SERVICE_UUID.as_ptr() as *mut u8;
            adv_data.flag = (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8;
            esp_ble_gap_config_adv_data(&mut adv_data);

            let mut scan_rsp: esp_ble_adv_data_t = core::mem::zeroed();
            scan_rsp.set_scan_rsp = true;
            scan_rsp.include_name = true;
            esp_ble_gap_config_adv_data(&mut scan_rsp);

            let mut adv_params = esp_ble_adv_params_t {
                adv_int_min: 0x20,
                adv_int_max: 0x40,
                adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
                own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
                channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
                adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
                ..core::mem::zeroed()
            };
            esp_ble_gap_start_advertising(&mut adv_params);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_advertise(&mut self) {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name,
            protocol::SERVICE_UUID
        );
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop_advertising(&mut self) {
        unsafe {
            esp_idf_svc::sys::esp_ble_gap_stop_advertising();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop_advertising(&mut self) {
        info!("BLE(sim): advertising stopped");
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&mut self, id: CharacteristicId, value: &[u8]) {
        use esp_idf_svc::sys::*;
        if !BLE_CONNECTED.load(AtomicOrdering::Relaxed) {
            return;
        }
        let handle = BLE_CHAR_HANDLES[char_index(id)].load(AtomicOrdering::Relaxed);
        if handle == 0 {
            return;
        }
        unsafe {
            esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as esp_gatt_if_t,
                BLE_CONN_ID.load(AtomicOrdering::Relaxed) as u16,
                handle as u16,
                value.len() as u16,
                value.as_ptr() as *mut u8,
                false,
            );
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&mut self, id: CharacteristicId, _value: &[u8]) {
        if self.sim_connected {
            let _ = self.sim_notified.push(id);
        }
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Simulation: value a peer would read from `id`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_value(&self, id: CharacteristicId) -> &[u8] {
        &self.values[char_index(id)]
    }

    /// Simulation: a peer connects.  Advertising stops at the radio level
    /// as Bluedroid does on connection.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect(&mut self) {
        self.sim_connected = true;
        if self.state == BleState::Advertising {
            self.state = BleState::Idle;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_disconnect(&mut self) {
        self.sim_connected = false;
    }

    /// Simulation: notifications sent since the last call.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_take_notified(&mut self) -> heapless::Vec<CharacteristicId, 32> {
        core::mem::take(&mut self.sim_notified)
    }
}

// ───────────────────────────────────────────────────────────────
// RadioPort implementation
// ───────────────────────────────────────────────────────────────

impl RadioPort for BleAdapter {
    fn start_advertising(&mut self) {
        if self.state == BleState::Off {
            self.state = if self.platform_init() {
                BleState::Idle
            } else {
                BleState::Failed
            };
        }
        if self.state == BleState::Failed {
            warn!("BLE: stack unavailable, not advertising");
            return;
        }
        info!("BLE: starting advertising as '{}'", self.device_name);
        self.platform_advertise();
        self.state = BleState::Advertising;
    }

    fn stop_advertising(&mut self) {
        if self.state == BleState::Advertising {
            self.platform_stop_advertising();
            self.state = BleState::Idle;
        }
    }

    fn notify(&mut self, characteristic: CharacteristicId, value: &[u8]) {
        self.set_value(characteristic, value);
        if characteristic == CharacteristicId::Name {
            self.rename(value);
        }
        if characteristic.is_notifiable() {
            self.platform_notify(characteristic, value);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
