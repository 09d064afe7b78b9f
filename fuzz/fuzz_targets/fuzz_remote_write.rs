//! Fuzz target: characteristic write decoding
//!
//! The first byte selects the characteristic, the rest is the written
//! value.  Decoding must never panic, and every accepted value must
//! survive the readable encoding for its characteristic.
//!
//! cargo fuzz run fuzz_remote_write

#![no_main]

use floower::remote::protocol::{self, CharacteristicId, RemoteWrite};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((selector, raw)) = data.split_first() else {
        return;
    };
    let id = CharacteristicId::ALL[usize::from(*selector) % CharacteristicId::ALL.len()];

    match protocol::decode(id, raw) {
        Ok(RemoteWrite::State(p)) => {
            assert!(p.open_level <= 100);
            let rec = protocol::encode_state(p.open_level, p.color, p.mode.rainbow());
            assert_eq!(rec[0], p.open_level);
        }
        Ok(RemoteWrite::Name(name)) => {
            assert!(!name.is_empty());
            assert_eq!(name.as_bytes(), raw);
        }
        Ok(RemoteWrite::ColorScheme(scheme)) => {
            assert_eq!(protocol::encode_color_scheme(&scheme).as_slice(), raw);
        }
        Ok(RemoteWrite::Personification(p)) => {
            assert_eq!(protocol::encode_personification(&p).as_slice(), raw);
        }
        Err(_) => {}
    }
});
