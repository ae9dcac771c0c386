//! Binding to the vendor radar sensing library (`mtb_radar_sensing_*`).
//!
//! The library is a prebuilt archive brought in as the
//! `components/radar_sensing` ESP-IDF component; esp-idf-sys generates the
//! declarations below from its header into `sys::radar`. It owns the radar:
//! SPI transfers, FIFO handling, presence detection. Context memory is
//! provided by the caller and must not move once initialized, so it lives
//! on the heap.

use core::cell::UnsafeCell;
use core::ffi::c_void;
use core::mem::{size_of, MaybeUninit};
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};
use std::boxed::Box;

use esp_idf_svc::sys::radar;
use esp_idf_svc::sys::spi_device_handle_t;

use crate::config::VALUE_MAX_LEN;
use crate::engine::{EngineError, EventMask, PresenceEvent, PresenceListener, SensingEngine};

type Context = radar::mtb_radar_sensing_context_t;

// Layout generated for Rust must match what the library was compiled with
const _: () = assert!(size_of::<Context>() == radar::RADAR_CONTEXT_SIZE as usize);

const SENSING_OK: i32 = radar::RADAR_SENSING_OK as i32;
const EVENT_PRESENCE_IN: u32 = radar::RADAR_EVENT_PRESENCE_IN as u32;
const EVENT_PRESENCE_OUT: u32 = radar::RADAR_EVENT_PRESENCE_OUT as u32;

/// Bus handle and pin numbers handed to the library.
///
/// The drivers behind these stay owned by [`super::RadarBus`].
#[derive(Debug, Clone, Copy)]
pub struct RadarHwConfig {
    pub spi: spi_device_handle_t,
    pub spi_cs: i32,
    pub reset: i32,
    pub ldo_en: i32,
    pub irq: i32,
}

impl RadarHwConfig {
    fn to_vendor(self) -> radar::mtb_radar_sensing_hw_cfg_t {
        // SAFETY: plain C struct of a handle and pin numbers, all-zero is valid
        let mut cfg: radar::mtb_radar_sensing_hw_cfg_t = unsafe { core::mem::zeroed() };
        cfg.spi = self.spi as _;
        cfg.spi_cs = self.spi_cs as _;
        cfg.reset = self.reset as _;
        cfg.ldo_en = self.ldo_en as _;
        cfg.irq = self.irq as _;
        cfg
    }
}

/// Library mask bits for the event classes in `mask`.
fn vendor_mask(mask: EventMask) -> u32 {
    let mut bits = 0;
    if mask.contains(EventMask::PRESENCE) {
        bits |= radar::RADAR_MASK_PRESENCE as u32;
    }
    bits
}

struct Inner {
    ctx: UnsafeCell<MaybeUninit<Context>>,
    /// `*mut &mut dyn PresenceListener` while `process` runs, null otherwise.
    listener: AtomicPtr<c_void>,
}

/// The vendor engine behind [`SensingEngine`].
pub struct RadarSensing {
    inner: Box<Inner>,
}

// SAFETY: the library serializes parameter access against processing with
// its own lock; the listener slot is only dereferenced on the task that is
// inside `process`.
unsafe impl Sync for RadarSensing {}

impl RadarSensing {
    pub fn new() -> Self {
        // SAFETY: all-zero is a valid `Inner`: context bytes are not read
        // before `init`, and a zero `AtomicPtr` is null
        let inner = unsafe { Box::<Inner>::new_zeroed().assume_init() };
        Self { inner }
    }

    fn ctx(&self) -> *mut Context {
        self.inner.ctx.get().cast()
    }
}

impl Default for RadarSensing {
    fn default() -> Self {
        Self::new()
    }
}

fn check(status: i32) -> Result<(), EngineError> {
    if status == SENSING_OK {
        Ok(())
    } else {
        Err(EngineError::Status(status))
    }
}

/// Copy `s` into `buf` with a terminator.
fn c_str<'b>(s: &str, buf: &'b mut [u8; VALUE_MAX_LEN]) -> Option<&'b [u8]> {
    let bytes = s.as_bytes();
    if bytes.len() >= buf.len() || bytes.contains(&0) {
        return None;
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    buf[bytes.len()] = 0;
    Some(&buf[..=bytes.len()])
}

unsafe extern "C" fn on_sensing_event(
    _ctx: *mut Context,
    event: radar::mtb_radar_sensing_event_t,
    info: *mut radar::mtb_radar_sensing_event_info_t,
    data: *mut c_void,
) {
    if info.is_null() || data.is_null() {
        return;
    }
    // SAFETY: `data` is the listener slot registered in `register_callback`
    let slot = unsafe { &*(data as *const AtomicPtr<c_void>) };
    let listener = slot.load(Ordering::Acquire) as *mut &mut dyn PresenceListener;
    if listener.is_null() {
        return;
    }

    // SAFETY: the library passes a presence info record for presence events
    let event = unsafe {
        let timestamp_ms = u64::from((*info).timestamp);
        match event as u32 {
            EVENT_PRESENCE_IN => {
                let presence = &*(info as *const radar::mtb_radar_sensing_presence_event_info_t);
                PresenceEvent::In {
                    timestamp_ms,
                    distance: presence.distance as f32,
                    accuracy: presence.accuracy as f32,
                }
            }
            EVENT_PRESENCE_OUT => PresenceEvent::Out { timestamp_ms },
            other => {
                log::trace!("ignoring sensing event {}", other);
                return;
            }
        }
    };

    // SAFETY: set by `process` on this task, valid until it returns
    unsafe { (*listener).on_event(&event) };
}

impl SensingEngine for RadarSensing {
    type HwConfig = RadarHwConfig;

    fn init(&mut self, hw: &RadarHwConfig, mask: EventMask) -> Result<(), EngineError> {
        let mut cfg = hw.to_vendor();
        // SAFETY: context memory is pinned on the heap for our lifetime
        let status =
            unsafe { radar::mtb_radar_sensing_init(self.ctx(), &mut cfg, vendor_mask(mask) as _) };
        check(status as i32)
    }

    fn register_callback(&mut self) -> Result<(), EngineError> {
        let slot = &self.inner.listener as *const AtomicPtr<c_void> as *mut c_void;
        // SAFETY: the slot lives as long as the context
        check(unsafe {
            radar::mtb_radar_sensing_register_callback(self.ctx(), Some(on_sensing_event), slot)
        } as i32)
    }

    fn set_parameter(&self, name: &str, value: &str) -> Result<(), EngineError> {
        let mut key_buf = [0u8; VALUE_MAX_LEN];
        let mut value_buf = [0u8; VALUE_MAX_LEN];
        let key = c_str(name, &mut key_buf).ok_or(EngineError::UnknownParameter)?;
        let value = c_str(value, &mut value_buf).ok_or(EngineError::InvalidValue)?;

        // SAFETY: both strings are NUL terminated and outlive the call
        check(unsafe {
            radar::mtb_radar_sensing_set_parameter(
                self.ctx(),
                key.as_ptr().cast(),
                value.as_ptr().cast(),
            )
        } as i32)
    }

    fn get_parameter(&self, name: &str, out: &mut [u8]) -> Result<usize, EngineError> {
        if out.is_empty() {
            return Err(EngineError::BufferTooSmall);
        }
        let mut key_buf = [0u8; VALUE_MAX_LEN];
        let key = c_str(name, &mut key_buf).ok_or(EngineError::UnknownParameter)?;

        // SAFETY: `out` is writable for `out.len()` bytes
        check(unsafe {
            radar::mtb_radar_sensing_get_parameter(
                self.ctx(),
                key.as_ptr().cast(),
                out.as_mut_ptr().cast(),
                out.len() as _,
            )
        } as i32)?;
        Ok(out.iter().position(|&b| b == 0).unwrap_or(out.len()))
    }

    fn enable(&mut self) -> Result<(), EngineError> {
        // SAFETY: context initialized by `init`
        check(unsafe { radar::mtb_radar_sensing_enable(self.ctx()) } as i32)
    }

    fn process(
        &self,
        timestamp_ms: u64,
        listener: &mut dyn PresenceListener,
    ) -> Result<(), EngineError> {
        let mut listener = listener;
        let slot = &mut listener as *mut &mut dyn PresenceListener;
        self.inner.listener.store(slot.cast(), Ordering::Release);

        // SAFETY: context initialized; callbacks run synchronously in here
        let status = unsafe { radar::mtb_radar_sensing_process(self.ctx(), timestamp_ms as _) };

        self.inner.listener.store(ptr::null_mut(), Ordering::Release);
        check(status as i32)
    }
}
