//! # AHT20 logger.
//!
//! Initializes an AHT20 on GP16/GP17 and logs a rounded temperature and humidity reading via
//! `defmt` every two seconds, along with whether the reading passed its checksum.
//!
//! Run with `DEFMT_LOG=info cargo run`.
//!
//! See the `Cargo.toml` file for Copyright and license details.
#![no_std]
#![no_main]

use defmt_rtt as _;
use panic_halt as _;

use aht20_sensor::{Error, AHT20, SENSOR_ADDRESS};
use embedded_hal::delay::DelayNs;
use fugit::RateExtU32;
use rp_pico::entry;
use rp_pico::hal;
use rp_pico::hal::pac;

#[entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    // The default is to generate a 125 MHz system clock
    let clocks = hal::clocks::init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    // The timer is the clock the AHT20 driver waits on.
    let mut timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    let sio = hal::Sio::new(pac.SIO);
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let sda_pin: hal::gpio::Pin<_, hal::gpio::FunctionI2C, _> = pins.gpio16.reconfigure();
    let scl_pin: hal::gpio::Pin<_, hal::gpio::FunctionI2C, _> = pins.gpio17.reconfigure();
    let i2c = hal::I2C::i2c0(
        pac.I2C0,
        sda_pin,
        scl_pin,
        400.kHz(),
        &mut pac.RESETS,
        &clocks.peripheral_clock,
    );

    let mut aht20 = AHT20::new(i2c, SENSOR_ADDRESS);
    aht20.initialize(&mut timer).unwrap();
    defmt::info!("setup done, calibrated: {}", aht20.is_calibrated());

    loop {
        match aht20.measure(&mut timer) {
            Ok(measurement) => {
                defmt::info!("temperature: {}", measurement.rounded_temperature());
                defmt::info!(
                    "humidity: {}",
                    measurement.rounded_humidity(aht20.config().profile.humidity_rounding)
                );
                if measurement.checksum_valid {
                    defmt::info!("checksum: ok");
                } else {
                    defmt::warn!("checksum: mismatch, reading may be corrupt");
                }
            }
            Err(Error::Timeout) => {
                // A wedged sensor usually comes back after a soft reset.
                defmt::warn!("sensor stuck busy, resetting");
                aht20.reset(&mut timer).ok();
            }
            Err(_) => defmt::error!("i2c error"),
        }

        timer.delay_ms(2_000);
    }
}
