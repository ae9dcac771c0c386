//! Console gate on a FreeRTOS mutex.

use esp_idf_svc::hal::delay::{TickType, BLOCK, NON_BLOCK};
use esp_idf_svc::sys;

use crate::gate::{ConsoleGate, GateError, Timeout};

const PD_TRUE: sys::BaseType_t = 1;

/// FreeRTOS mutex semaphore.
///
/// Unlike the host gate, FreeRTOS mutexes have an owner: `release` must
/// come from the task that acquired. Both tasks only ever release their own
/// acquisitions.
pub struct FreeRtosGate {
    handle: sys::QueueHandle_t,
}

// SAFETY: FreeRTOS queue/semaphore calls are safe from any task.
unsafe impl Send for FreeRtosGate {}
unsafe impl Sync for FreeRtosGate {}

impl FreeRtosGate {
    pub fn new() -> Result<Self, GateError> {
        // SAFETY: plain allocation call, result checked below
        let handle = unsafe { sys::xQueueCreateMutex(sys::queueQUEUE_TYPE_MUTEX as u8) };
        if handle.is_null() {
            return Err(GateError::Failed);
        }
        Ok(Self { handle })
    }
}

impl ConsoleGate for FreeRtosGate {
    fn acquire(&self, timeout: Timeout) -> Result<(), GateError> {
        let ticks = match timeout {
            Timeout::NoWait => NON_BLOCK,
            Timeout::Millis(ms) => TickType::new_millis(u64::from(ms)).ticks(),
            Timeout::Forever => BLOCK,
        };

        // SAFETY: handle is a live mutex created in `new`
        if unsafe { sys::xQueueSemaphoreTake(self.handle, ticks) } == PD_TRUE {
            Ok(())
        } else {
            Err(GateError::Timeout)
        }
    }

    fn release(&self) -> Result<(), GateError> {
        // SAFETY: handle is a live mutex; giving a mutex sends no payload
        let given = unsafe {
            sys::xQueueGenericSend(
                self.handle,
                core::ptr::null(),
                NON_BLOCK,
                sys::queueSEND_TO_BACK as sys::BaseType_t,
            )
        };
        if given == PD_TRUE {
            Ok(())
        } else {
            Err(GateError::NotHeld)
        }
    }
}

impl Drop for FreeRtosGate {
    fn drop(&mut self) {
        // SAFETY: no task can hold a borrow of the gate any more
        unsafe { sys::vQueueDelete(self.handle) };
    }
}
