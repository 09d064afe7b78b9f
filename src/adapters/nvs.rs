//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the flower.  The whole [`DeviceConfig`] is
//! stored as a single postcard blob under `floower/devcfg`.
//!
//! - Validation: every field is range-checked before persistence and again
//!   after loading, so a blob from an older layout is reported as
//!   [`ConfigError::Corrupted`] instead of being half-applied.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::{self, DeviceConfig};
use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "floower";
#[cfg(target_os = "espidf")]
const CONFIG_KEY: &[u8] = b"devcfg\0";

/// Largest blob accepted from flash.  A full 16-colour palette with a
/// 25-byte name encodes well below this.
const MAX_BLOB_SIZE: usize = 256;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blob: std::cell::RefCell<Option<Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash and return the store.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised.  Returns `Err(ConfigError::IoError)` if
    /// that also fails.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blob: std::cell::RefCell::new(None),
        })
    }

    /// Load the stored config, falling back to defaults when nothing
    /// usable is stored.  Only a storage I/O failure is surfaced.
    pub fn load_or_default(&self) -> DeviceConfig {
        match self.load() {
            Ok(cfg) => cfg,
            Err(ConfigError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                DeviceConfig::default()
            }
            Err(e) => {
                warn!("NvsAdapter: {}, using defaults", e);
                DeviceConfig::default()
            }
        }
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns = CONFIG_NAMESPACE.as_bytes();
        ns_buf[..ns.len()].copy_from_slice(ns);

        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size: usize = 0;
            // First call: size only
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    CONFIG_KEY.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    CONFIG_KEY.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });

        match result {
            Ok(bytes) => Ok(bytes),
            // A fresh partition has no namespace yet either.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(ConfigError::NotFound),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(ConfigError::Corrupted),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        match self.blob.borrow().as_ref() {
            Some(bytes) if bytes.is_empty() || bytes.len() > MAX_BLOB_SIZE => {
                Err(ConfigError::Corrupted)
            }
            Some(bytes) => Ok(bytes.clone()),
            None => Err(ConfigError::NotFound),
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        let result = Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    CONFIG_KEY.as_ptr() as *const _,
                    bytes.as_ptr() as *const _,
                    bytes.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            ConfigError::IoError
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
        Ok(())
    }

    /// Simulation: overwrite the raw stored blob.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_raw(&self, bytes: &[u8]) {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<DeviceConfig, ConfigError> {
        let bytes = self.read_blob()?;
        let cfg: DeviceConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        config::validate(&cfg).map_err(|_| ConfigError::Corrupted)?;
        info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, cfg: &DeviceConfig) -> Result<(), ConfigError> {
        config::validate(cfg)?;
        let bytes = postcard::to_allocvec(cfg).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::IoError);
        }
        self.write_blob(&bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
