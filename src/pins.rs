//! GPIO / peripheral pin assignments for the logger carrier board.
//!
//! Single source of truth for the board defaults.  Deployment overrides
//! live in [`LoggerConfig`](crate::config::LoggerConfig); these values seed
//! its `Default`.

// ---------------------------------------------------------------------------
// Storage medium (SPI micro-SD)
// ---------------------------------------------------------------------------

/// SPI chip select for the SD card slot.
pub const SD_SELECT_GPIO: i32 = 12;
pub const SD_MOSI_GPIO: i32 = 11;
pub const SD_MISO_GPIO: i32 = 13;
pub const SD_SCK_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Real-time clock (DS3231, I2C)
// ---------------------------------------------------------------------------

/// Open-drain alarm output of the RTC.  Falling edge wakes the MCU.
pub const RTC_INT_GPIO: i32 = 4;
pub const RTC_SDA_GPIO: i32 = 2;
pub const RTC_SCL_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Modem socket (XBee footprint)
// ---------------------------------------------------------------------------

/// High-side switch feeding the modem socket.
pub const MODEM_VCC_GPIO: i32 = 5;
/// Modem CTS / status output.  HIGH = awake.
pub const MODEM_STATUS_GPIO: i32 = 6;
/// Modem DTR / sleep-request input.
pub const MODEM_ON_OFF_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Analog
// ---------------------------------------------------------------------------

/// Battery sense divider.
pub const BATTERY_ADC_GPIO: i32 = 1;
/// ADC1 channel wired to [`BATTERY_ADC_GPIO`].
pub const BATTERY_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Red LED, lit while a tick is processed.
pub const ALERT_LED_GPIO: i32 = 9;
