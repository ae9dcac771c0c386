//! Board bring-up: radar bus, control lines, indicator LEDs, console UART.
//!
//! # Hardware Setup
//!
//! Default assignment (see [`crate::config::BoardPins`]):
//!
//! ```text
//! ESP32-S3                     Radar wingboard
//!   GPIO12 (SCLK) ───────────▶ SPI CLK
//!   GPIO11 (MOSI) ───────────▶ SPI MOSI
//!   GPIO13 (MISO) ◀─────────── SPI MISO
//!   GPIO10 (CS)   ───────────▶ SPI CS (driven by the library)
//!   GPIO9         ───────────▶ RESET
//!   GPIO8         ───────────▶ LDO_EN
//!   GPIO7         ◀─────────── IRQ (pull-down)
//!
//!   GPIO4 ──▶ presence LED      GPIO5 ──▶ absence LED
//!   GPIO43/44 ── UART0 console
//! ```

use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::hal::spi::config::Config as SpiConfig;
use esp_idf_svc::hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_svc::hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_svc::sys::{EspError, ESP_ERR_INVALID_ARG};

use super::engine::RadarHwConfig;
use super::terminal::UartTerminal;
use crate::config::BoardConfig;

pub type Led = PinDriver<'static, AnyOutputPin, Output>;

/// Drivers the sensing library talks through. Must outlive the engine.
pub struct RadarBus {
    spi: SpiDeviceDriver<'static, SpiDriver<'static>>,
    cs: PinDriver<'static, AnyOutputPin, Output>,
    reset: PinDriver<'static, AnyOutputPin, Output>,
    ldo_en: PinDriver<'static, AnyOutputPin, Output>,
    irq: PinDriver<'static, AnyIOPin, Input>,
}

impl RadarBus {
    pub fn hw_config(&self) -> RadarHwConfig {
        RadarHwConfig {
            spi: self.spi.device(),
            spi_cs: self.cs.pin(),
            reset: self.reset.pin(),
            ldo_en: self.ldo_en.pin(),
            irq: self.irq.pin(),
        }
    }
}

/// Everything the application needs from the board.
pub struct Board {
    pub radar: RadarBus,
    pub presence_led: Led,
    pub absence_led: Led,
    pub console: UartTerminal,
}

impl Board {
    /// Claim the peripherals and configure them for the radar application.
    pub fn take(config: &BoardConfig) -> Result<Self, EspError> {
        if let Some(pin) = config.pins.first_duplicate() {
            log::error!("GPIO{} assigned twice", pin);
            return Err(EspError::from_infallible::<ESP_ERR_INVALID_ARG>());
        }

        let peripherals = Peripherals::take()?;
        let pins = &config.pins;

        // SAFETY: the peripheral singletons are ours and no GPIO number is
        // assigned twice, so each pin is claimed exactly once
        let (presence_pin, absence_pin, reset_pin, ldo_pin, irq_pin, cs_pin) = unsafe {
            (
                AnyOutputPin::new(pins.presence_led),
                AnyOutputPin::new(pins.absence_led),
                AnyOutputPin::new(pins.radar_reset),
                AnyOutputPin::new(pins.radar_ldo_en),
                AnyIOPin::new(pins.radar_irq),
                AnyOutputPin::new(pins.spi_cs),
            )
        };
        // SAFETY: as above
        let (sclk, mosi, miso, tx, rx) = unsafe {
            (
                AnyOutputPin::new(pins.spi_sclk),
                AnyOutputPin::new(pins.spi_mosi),
                AnyIOPin::new(pins.spi_miso),
                AnyOutputPin::new(pins.console_tx),
                AnyIOPin::new(pins.console_rx),
            )
        };

        let mut presence_led = PinDriver::output(presence_pin)?;
        presence_led.set_low()?;
        let mut absence_led = PinDriver::output(absence_pin)?;
        absence_led.set_low()?;
        log::info!("indicators ready");

        // Reset released, LDO on, chip select idle high
        let mut reset = PinDriver::output(reset_pin)?;
        reset.set_high()?;
        let mut ldo_en = PinDriver::output(ldo_pin)?;
        ldo_en.set_high()?;
        let mut irq = PinDriver::input(irq_pin)?;
        irq.set_pull(Pull::Down)?;
        let mut cs = PinDriver::output(cs_pin)?;
        cs.set_high()?;

        let spi_config = SpiConfig::new()
            .baudrate(Hertz(config.spi_frequency_hz))
            .data_mode(spi_mode(config.spi_mode));
        let spi = SpiDeviceDriver::new_single(
            peripherals.spi2,
            sclk,
            mosi,
            Some(miso),
            Option::<AnyIOPin>::None,
            &SpiDriverConfig::default(),
            &spi_config,
        )?;
        log::info!("radar spi ready ({} Hz)", config.spi_frequency_hz);

        let uart_config = UartConfig::default().baudrate(Hertz(config.console_baud_rate));
        let uart = UartDriver::new(
            peripherals.uart0,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &uart_config,
        )?;
        log::info!("console uart ready ({} baud)", config.console_baud_rate);

        Ok(Self {
            radar: RadarBus {
                spi,
                cs,
                reset,
                ldo_en,
                irq,
            },
            presence_led,
            absence_led,
            console: UartTerminal::new(uart),
        })
    }
}

fn spi_mode(mode: u8) -> embedded_hal::spi::Mode {
    match mode {
        1 => embedded_hal::spi::MODE_1,
        2 => embedded_hal::spi::MODE_2,
        3 => embedded_hal::spi::MODE_3,
        _ => embedded_hal::spi::MODE_0,
    }
}
