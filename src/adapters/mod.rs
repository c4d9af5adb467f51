//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements   | Connects to                          |
//! |--------------|--------------|--------------------------------------|
//! | `adc`        | AnalogPort   | ESP32 ADC1 one-shot / injected value |
//! | `fs_medium`  | StoragePort  | SD card FAT volume via VFS           |
//! | `gpio`       | OutputPin    | simulated line (host)                |
//! |              | InputPin     |                                      |
//! | `log_sink`   | EventSink    | Serial log output                    |
//! | `rtc`        | ClockPort    | simulated RTC (host)                 |
//! | `sleep`      | SleepPort    | ESP32 light sleep / simulated time   |
//! | `tcp_stream` | ByteStream   | lwIP / host TCP socket               |
//! | `time`       | TimerPort    | ESP32 system timer / virtual clock   |
//! | `wifi`       | ModemPort    | ESP-IDF WiFi STA                     |
//!
//! The hardware RTC is the DS3231 driver in [`crate::drivers`].

pub mod adc;
pub mod fs_medium;
pub mod gpio;
pub mod log_sink;
pub mod rtc;
pub mod sleep;
pub mod tcp_stream;
pub mod time;
pub mod wifi;
