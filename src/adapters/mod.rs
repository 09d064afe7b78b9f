//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `ble`          | RadioPort          | Bluedroid GATT server         |
//! | `flower`       | FlowerPort         | Petal servo + RGB LED (LEDC)  |
//! | `log_sink`     | EventSink          | Serial log output             |
//! | `nvs`          | ConfigPort         | NVS / in-memory store         |
//! | `random`       | RandomSource       | ESP32 hardware RNG            |
//! | `time`         | -                  | ESP32 system timer            |
//! | `device_id`    | -                  | eFuse MAC                     |

pub mod ble;
pub mod device_id;
pub mod flower;
pub mod log_sink;
pub mod nvs;
pub mod random;
pub mod time;
